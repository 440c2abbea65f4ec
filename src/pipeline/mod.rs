//! Search, refine, training and dictionary enrichment entry points.
pub mod enrich;
pub mod train;

use std::path::Path;

use tracing::info;

use crate::{
    config::{AppConfig, Perimeter, ProcessingParameters},
    error::{Error, Result},
    report::{filter_reports, get_matching_reports, sort_reports, FacetFilters, FilteredReports},
    text::{ascii_only, Normalizer},
    topic::extract_topics,
    vectorizer::{serde::ArtifactStore, Field, VectorizerPair},
};

pub use enrich::enrich_word_dict;
pub use train::{load_reports, prepare_training_reports, train_all, train_shop};

/// Everything a query on one (language, shop) needs, loaded once.
///
/// Reloading an artifact means building a new kernel and swapping it in.
#[derive(Debug, Clone)]
pub struct SearchKernel {
    pub language: String,
    pub shop: String,
    pub normalizer: Normalizer,
    pub processing_params: ProcessingParameters,
    pub description: VectorizerPair,
    pub comment: VectorizerPair,
    pub slider_sim_weight: f64,
    pub slider_coeff_detail: f64,
}

impl SearchKernel {
    /// Load the latest artifacts of (language, shop).
    pub fn load(config: &AppConfig, perimeter: &Perimeter, language: &str, shop: &str) -> Result<Self> {
        Self::load_with_paths(config, perimeter, language, shop, None, None)
    }

    pub fn load_with_paths(
        config: &AppConfig,
        perimeter: &Perimeter,
        language: &str,
        shop: &str,
        description_path: Option<&Path>,
        comment_path: Option<&Path>,
    ) -> Result<Self> {
        let shop = perimeter.ensure_shop(language, shop)?;
        info!(language, shop, "loading search kernel");
        let resources = config.load_language(language)?;
        let store = ArtifactStore::new(&config.histo_dir);
        let description = store.load(language, shop, Field::Description, description_path)?;
        let comment = store.load(language, shop, Field::Comment, comment_path)?;
        Self::from_parts(
            resources.normalizer(),
            config.load_processing_params()?,
            description,
            comment,
            config,
        )
    }

    /// Assemble a kernel from already loaded pieces.
    pub fn from_parts(
        normalizer: Normalizer,
        processing_params: ProcessingParameters,
        description: VectorizerPair,
        comment: VectorizerPair,
        config: &AppConfig,
    ) -> Result<Self> {
        if description.language != comment.language || description.shop != comment.shop {
            return Err(Error::ArtifactMismatch(format!(
                "description artifact is for {}/{}, comment artifact for {}/{}",
                description.language, description.shop, comment.language, comment.shop
            )));
        }
        Ok(Self {
            language: comment.language.clone(),
            shop: comment.shop.clone(),
            normalizer,
            processing_params,
            description,
            comment,
            slider_sim_weight: config.slider_sim_weight,
            slider_coeff_detail: config.slider_coeff_detail,
        })
    }
}

/// Matching, filtering then sorting; keeps the first `n_reports` rows and
/// the facet values of every filtered row.
pub fn make_search<'a>(
    kernel: &'a SearchKernel,
    query: &str,
    filters: &FacetFilters,
    n_reports: usize,
) -> Result<FilteredReports<'a>> {
    let matching = get_matching_reports(
        &kernel.normalizer,
        &kernel.description,
        &kernel.comment,
        query,
        kernel.slider_sim_weight,
    )?;
    let mut filtered = filter_reports(matching, filters);
    let reports = std::mem::take(&mut filtered.reports);
    filtered.reports = sort_reports(reports, kernel.slider_coeff_detail);
    filtered.reports.truncate(n_reports);
    info!(
        language = %kernel.language,
        shop = %kernel.shop,
        returned = filtered.reports.len(),
        "search done"
    );
    Ok(filtered)
}

/// Topic keywords of the reports matching `query`, each topic prefixed by
/// the ASCII form of the query.
pub fn make_refine(kernel: &SearchKernel, query: &str, config: &AppConfig) -> Result<Vec<String>> {
    let matching = get_matching_reports(
        &kernel.normalizer,
        &kernel.description,
        &kernel.comment,
        query,
        kernel.slider_sim_weight,
    )?;
    let docs: Vec<&str> = matching
        .iter()
        .filter(|r| r.similarity > config.refine_min_similarity)
        .take(config.refine_max_reports)
        .map(|r| r.prepared.corpus_lda.as_deref().unwrap_or(""))
        .collect();
    info!(reports = docs.len(), "extracting topics");

    let topics = extract_topics(&docs, &kernel.processing_params, config.n_top_words);
    let search = ascii_only(query);
    Ok(topics
        .into_iter()
        .map(|topic| {
            std::iter::once(search.clone())
                .chain(topic)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect())
}
