//! Application and processing configuration.
//!
//! `AppConfig` is built once at process start from defaults, an optional
//! `diaman.toml` and `DIAMAN_*` environment variables, then passed by
//! reference to whatever needs it. It is never mutated afterwards.
pub mod perimeter;
pub mod resources;

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

pub use perimeter::Perimeter;
pub use resources::LanguageResources;

/// Default location of the application configuration file.
pub const APP_CONFIG_FILE: &str = "diaman.toml";
/// Name of the processing parameters file inside the resources directory.
pub const PROCESSING_CONFIG_FILE: &str = "processing_conf.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Directory holding `perimeter.json`, `processing_conf.toml` and one
    /// sub-directory per language.
    pub resources_dir: PathBuf,
    /// Root of the artifact tree.
    pub histo_dir: PathBuf,
    /// Weight of the comment similarity when blending both fields.
    pub slider_sim_weight: f64,
    /// Weight of the detail level in the final sort.
    pub slider_coeff_detail: f64,
    /// Number of reports returned by a search.
    pub n_reports: usize,
    /// Minimum blended similarity kept for topic extraction.
    pub refine_min_similarity: f64,
    /// Maximum number of reports used for topic extraction.
    pub refine_max_reports: usize,
    /// Keywords per topic.
    pub n_top_words: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            resources_dir: PathBuf::from("resources"),
            histo_dir: PathBuf::from("histo"),
            slider_sim_weight: 0.8,
            slider_coeff_detail: 0.2,
            n_reports: 50,
            refine_min_similarity: 0.05,
            refine_max_reports: 500,
            n_top_words: 4,
        }
    }
}

impl AppConfig {
    /// Load from `diaman.toml` in the working directory and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(APP_CONFIG_FILE)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_figment(Self::figment(path.as_ref()))
    }

    /// defaults <- toml file <- `DIAMAN_*` env vars
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("DIAMAN_"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment.extract()?;
        config.validate()?;
        info!(
            resources = %config.resources_dir.display(),
            histo = %config.histo_dir.display(),
            "application configuration loaded"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("slider_sim_weight", self.slider_sim_weight),
            ("slider_coeff_detail", self.slider_coeff_detail),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("{name} must lie in [0, 1], got {value}")));
            }
        }
        if self.n_top_words == 0 {
            return Err(Error::Config("n_top_words must be positive".to_string()));
        }
        Ok(())
    }

    pub fn processing_config_path(&self) -> PathBuf {
        self.resources_dir.join(PROCESSING_CONFIG_FILE)
    }

    pub fn load_processing_params(&self) -> Result<ProcessingParameters> {
        ProcessingParameters::load(self.processing_config_path())
    }

    pub fn load_perimeter(&self) -> Result<Perimeter> {
        Perimeter::load(self.resources_dir.join(perimeter::PERIMETER_FILE))
    }

    pub fn load_language(&self, language: &str) -> Result<LanguageResources> {
        LanguageResources::load(&self.resources_dir, language)
    }
}

/// Document frequency bound of the topic vectorizer: an absolute number of
/// documents or a proportion of the corpus.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DocFrequency {
    Count(usize),
    Ratio(f64),
}

impl DocFrequency {
    /// Resolve to a number of documents for a corpus of `n_docs`.
    pub fn resolve(&self, n_docs: usize) -> f64 {
        match *self {
            DocFrequency::Count(c) => c as f64,
            DocFrequency::Ratio(r) => r * n_docs as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StripAccents {
    /// Drop everything outside ASCII after decomposition.
    Ascii,
    /// Drop combining marks only.
    Unicode,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NgramRange {
    pub min: usize,
    pub max: usize,
}

impl Default for NgramRange {
    fn default() -> Self {
        Self { min: 1, max: 1 }
    }
}

/// Parameters of the topic vectorizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectParameters {
    #[serde(default)]
    pub strip_accents: Option<StripAccents>,
    pub lowercase: bool,
    pub max_df: DocFrequency,
    pub min_df: DocFrequency,
    #[serde(default)]
    pub ngram_range: NgramRange,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LearningMethod {
    Batch,
    Online,
}

/// Parameters of the LDA topic model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LdaParameters {
    pub max_iter: usize,
    /// Evaluate perplexity every `n` iterations; zero or negative disables it.
    pub evaluate_every: i64,
    pub perp_tol: f64,
    pub n_components: usize,
    pub learning_method: LearningMethod,
    #[serde(default)]
    pub random_state: Option<u64>,
}

/// Scientific parameters of the topic extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessingParameters {
    pub vect_parameters: VectParameters,
    pub lda_parameters: LdaParameters,
}

impl ProcessingParameters {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::Config(format!(
                "processing configuration file not found: {}",
                path.display()
            )));
        }
        info!(path = %path.display(), "loading the processing parameters");
        Self::from_figment(Figment::from(Toml::file(path)))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        for section in ["vect_parameters", "lda_parameters"] {
            if !figment.contains(section) {
                return Err(Error::Config(format!("{section} configuration not found.")));
            }
        }
        let params: ProcessingParameters = figment.extract()?;
        if params.lda_parameters.n_components == 0 {
            return Err(Error::Config("n_components must be positive".to_string()));
        }
        let range = params.vect_parameters.ngram_range;
        if range.min == 0 || range.min > range.max {
            return Err(Error::Config(format!(
                "invalid ngram_range ({}, {})",
                range.min, range.max
            )));
        }
        Ok(params)
    }
}

impl Default for ProcessingParameters {
    fn default() -> Self {
        Self {
            vect_parameters: VectParameters {
                strip_accents: Some(StripAccents::Unicode),
                lowercase: true,
                max_df: DocFrequency::Ratio(0.95),
                min_df: DocFrequency::Count(2),
                ngram_range: NgramRange::default(),
            },
            lda_parameters: LdaParameters {
                max_iter: 10,
                evaluate_every: -1,
                perp_tol: 0.1,
                n_components: 5,
                learning_method: LearningMethod::Batch,
                random_state: Some(0),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROCESSING: &str = r#"
        [vect_parameters]
        strip_accents = "unicode"
        lowercase = true
        max_df = 0.95
        min_df = 2
        ngram_range = { min = 1, max = 2 }

        [lda_parameters]
        max_iter = 20
        evaluate_every = 5
        perp_tol = 0.1
        n_components = 5
        learning_method = "online"
        random_state = 0
    "#;

    #[test]
    fn processing_parameters_parse() {
        let params =
            ProcessingParameters::from_figment(Figment::from(Toml::string(PROCESSING))).unwrap();
        assert_eq!(params.vect_parameters.max_df, DocFrequency::Ratio(0.95));
        assert_eq!(params.vect_parameters.min_df, DocFrequency::Count(2));
        assert_eq!(params.vect_parameters.ngram_range, NgramRange { min: 1, max: 2 });
        assert_eq!(params.lda_parameters.learning_method, LearningMethod::Online);
        assert_eq!(params.lda_parameters.random_state, Some(0));
    }

    #[test]
    fn missing_section_is_a_config_error() {
        let only_vect = r#"
            [vect_parameters]
            lowercase = true
            max_df = 1.0
            min_df = 1
        "#;
        let err = ProcessingParameters::from_figment(Figment::from(Toml::string(only_vect)))
            .unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("lda_parameters")));
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let broken = PROCESSING.replace("perp_tol = 0.1", "");
        let err =
            ProcessingParameters::from_figment(Figment::from(Toml::string(&broken))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn app_config_defaults_and_overrides() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string("slider_sim_weight = 0.5\nn_reports = 10"));
        let config = AppConfig::from_figment(figment).unwrap();
        assert_eq!(config.slider_sim_weight, 0.5);
        assert_eq!(config.slider_coeff_detail, 0.2);
        assert_eq!(config.n_reports, 10);
    }

    #[test]
    fn app_config_rejects_out_of_range_weight() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string("slider_coeff_detail = 1.5"));
        assert!(matches!(AppConfig::from_figment(figment), Err(Error::Config(_))));
    }

    #[test]
    fn doc_frequency_resolves() {
        assert_eq!(DocFrequency::Count(3).resolve(10), 3.0);
        assert_eq!(DocFrequency::Ratio(0.5).resolve(10), 5.0);
    }
}
