use thiserror::Error;

/// Errors surfaced by the search engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed configuration, fatal at startup.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Unknown language/shop/site or missing artifact.
    #[error("not found: {0}")]
    NotFound(String),

    /// The query matched nothing with a positive score.
    #[error("No reports found matching the search, please modify your search.")]
    EmptyResult,

    /// The description and comment artifacts do not describe the same table.
    #[error("artifact mismatch: {0}")]
    ArtifactMismatch(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("artifact encoding error: {0}")]
    Artifact(#[from] serde_cbor::Error),
}

impl Error {
    /// `NotFound` listing the accepted values.
    pub fn not_found_among<I, S>(what: &str, value: &str, valid: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let valid: Vec<String> = valid.into_iter().map(|s| s.as_ref().to_string()).collect();
        Error::NotFound(format!(
            "unknown {what} '{value}', valid options are: [{}]",
            valid.join(", ")
        ))
    }
}

impl From<figment::Error> for Error {
    fn from(e: figment::Error) -> Self {
        Error::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
