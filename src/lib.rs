/// This crate is a search engine over maintenance reports.
/// Queries are matched against per-shop vectorizers of the report description
/// and comment, then filtered, ranked and summarized into topic keywords.
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod text;
pub mod topic;
pub mod utils;
pub mod vectorizer;

/// Application configuration
/// Built once at process start from defaults, an optional `diaman.toml` and
/// `DIAMAN_*` environment variables, then passed by reference.
///
/// `ProcessingParameters` holds the topic vectorizer and LDA settings read
/// from `processing_conf.toml`, `Perimeter` the languages, shops and sites
/// served.
pub use config::{AppConfig, Perimeter, ProcessingParameters};

/// Error type of the crate
/// - `Config`: missing or invalid configuration, fatal at startup
/// - `NotFound`: unknown language/shop/site or missing artifact
/// - `EmptyResult`: the query matched nothing
pub use error::{Error, Result};

/// Text Normalizer
/// Lowercases, strips accents and comment headers, drops stopwords and
/// optionally numbers and small words, then corrects known misspellings
/// with the `WordDict` of the language.
pub use text::{Normalizer, WordDict};

/// Vectorizer Pair
/// A fitted vectorizer of one (language, shop, field), its document-term
/// matrix and the prepared report table, persisted as one artifact.
///
/// `Field::Description` uses TF-IDF weighting and cosine similarity,
/// `Field::Comment` raw counts and the count-overlap similarity.
///
/// # Serialization
/// Supported, through `ArtifactStore` (CBOR).
pub use vectorizer::{serde::ArtifactStore, Field, VectorizerPair};

/// Report ranking
/// Blends both similarities, filters by facet and sorts by similarity and
/// detail level.
pub use report::{FacetFilters, FilteredReports, RankedReport, Report};

/// Topic extraction
/// LDA over the topic text of a set of reports, falling back to the most
/// frequent words when no model can be fitted.
pub use topic::{extract_topics, try_extract_topics, TopicError};

/// Query entry points
pub use pipeline::{make_refine, make_search, SearchKernel};
