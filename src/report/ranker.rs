use std::collections::{BTreeSet, HashSet};

use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    report::{Facet, PreparedReport, Report},
    text::{NormalizeOptions, Normalizer, TextKind},
    utils::normalizer::{min_max_normalize, ratio_to_max},
    vectorizer::{Field, VectorizerPair},
};

/// A candidate report with the scores computed for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedReport<'a> {
    pub prepared: &'a PreparedReport,
    /// Blended similarity of both fields.
    pub similarity: f64,
    pub detail_level: f64,
    pub sorting_score: f64,
}

impl<'a> RankedReport<'a> {
    fn new(prepared: &'a PreparedReport, similarity: f64) -> Self {
        Self {
            prepared,
            similarity,
            detail_level: 0.0,
            sorting_score: 0.0,
        }
    }

    #[inline]
    pub fn report(&self) -> &'a Report {
        &self.prepared.report
    }
}

/// Accepted values per facet. An empty list means no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetFilters {
    pub sites: Vec<String>,
    pub constructors: Vec<String>,
    pub equipments: Vec<String>,
}

impl FacetFilters {
    fn accepted(&self, facet: Facet) -> &[String] {
        match facet {
            Facet::Site => &self.sites,
            Facet::Constructor => &self.constructors,
            Facet::Equipment => &self.equipments,
        }
    }

    fn accepts(&self, report: &Report) -> bool {
        [Facet::Site, Facet::Constructor, Facet::Equipment]
            .into_iter()
            .all(|facet| match facet.value(report) {
                None => false,
                Some(value) => {
                    let accepted = self.accepted(facet);
                    accepted.is_empty() || accepted.iter().any(|a| a == value)
                }
            })
    }
}

/// Filtered rows plus the facet values left for follow-up filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredReports<'a> {
    pub reports: Vec<RankedReport<'a>>,
    pub sites: Vec<String>,
    pub constructors: Vec<String>,
    pub equipments: Vec<String>,
}

/// Score every report of the comment table against `query`.
///
/// `sim_weight` is the weight of the comment similarity:
/// `((1 - w) * sim_description + w * sim_comment) / 2`. Only strictly
/// positive scores are kept, best first.
pub fn get_matching_reports<'a>(
    normalizer: &Normalizer,
    description: &VectorizerPair,
    comment: &'a VectorizerPair,
    query: &str,
    sim_weight: f64,
) -> Result<Vec<RankedReport<'a>>> {
    check_pairs(description, comment)?;
    let input = normalizer.normalize(query, TextKind::Query, NormalizeOptions::default());
    debug!(query, normalized = %input, "query normalized");

    let sim_description = description.similarity(&input);
    let sim_comment = comment.similarity(&input);

    let mut reports: Vec<RankedReport<'a>> = comment
        .table
        .iter()
        .zip(sim_description.iter().zip(&sim_comment))
        .map(|(prepared, (&d, &c))| {
            RankedReport::new(prepared, ((1.0 - sim_weight) * d + sim_weight * c) / 2.0)
        })
        .filter(|r| r.similarity > 0.0)
        .collect();
    reports.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

    info!(matching = reports.len(), total = comment.len(), "matching reports");
    if reports.is_empty() {
        return Err(Error::EmptyResult);
    }
    Ok(reports)
}

fn check_pairs(description: &VectorizerPair, comment: &VectorizerPair) -> Result<()> {
    if description.field != Field::Description || comment.field != Field::Comment {
        return Err(Error::ArtifactMismatch(format!(
            "expected description and comment vectorizers, got {} and {}",
            description.field, comment.field
        )));
    }
    if description.len() != comment.len() {
        return Err(Error::ArtifactMismatch(format!(
            "description table has {} rows, comment table has {}",
            description.len(),
            comment.len()
        )));
    }
    Ok(())
}

/// Keep the rows accepted by every facet filter, order unchanged.
pub fn filter_reports<'a>(reports: Vec<RankedReport<'a>>, filters: &FacetFilters) -> FilteredReports<'a> {
    let reports: Vec<RankedReport<'a>> = reports
        .into_iter()
        .filter(|r| filters.accepts(r.report()))
        .collect();
    FilteredReports {
        sites: distinct_values(&reports, Facet::Site),
        constructors: distinct_values(&reports, Facet::Constructor),
        equipments: distinct_values(&reports, Facet::Equipment),
        reports,
    }
}

fn distinct_values(reports: &[RankedReport<'_>], facet: Facet) -> Vec<String> {
    reports
        .iter()
        .filter_map(|r| facet.value(r.report()))
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(String::from)
        .collect()
}

/// Number of distinct words of a normalized text.
fn distinct_words(text: &str) -> usize {
    text.split_whitespace().collect::<HashSet<_>>().len()
}

/// Rank by `(1 - d) * mm(similarity) + d * mm(detail_level)`, best first.
pub fn sort_reports<'a>(mut reports: Vec<RankedReport<'a>>, detail_weight: f64) -> Vec<RankedReport<'a>> {
    let words: Vec<usize> = reports.iter().map(|r| distinct_words(&r.prepared.corpus)).collect();
    let max_words = words.iter().copied().max().unwrap_or(0) as f64;
    for (report, &n) in reports.iter_mut().zip(&words) {
        report.detail_level = ratio_to_max(n as f64, max_words);
    }

    let similarity: Vec<f64> = reports.iter().map(|r| r.similarity).collect();
    let detail: Vec<f64> = reports.iter().map(|r| r.detail_level).collect();
    let similarity = min_max_normalize(&similarity);
    let detail = min_max_normalize(&detail);
    for (i, report) in reports.iter_mut().enumerate() {
        report.sorting_score = (1.0 - detail_weight) * similarity[i] + detail_weight * detail[i];
    }
    reports.sort_by(|a, b| b.sorting_score.total_cmp(&a.sorting_score));
    reports
}
