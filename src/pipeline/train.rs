use std::{collections::HashSet, fs, path::{Path, PathBuf}};

use tracing::{info, warn};

use crate::{
    config::{AppConfig, LanguageResources, Perimeter},
    error::{Error, Result},
    report::Report,
    vectorizer::{serde::ArtifactStore, Field, VectorizerPair},
};

const UNKNOWN_CONSTRUCTOR: &str = "UNKNOWN";
const MINUTES_PER_HOUR: f64 = 60.0;

/// Read a JSON array of reports.
pub fn load_reports<P: AsRef<Path>>(path: P) -> Result<Vec<Report>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::NotFound(format!("{}: {e}", path.display())))?;
    let reports: Vec<Report> = serde_json::from_str(&raw)?;
    info!(path = %path.display(), reports = reports.len(), "reports loaded");
    Ok(reports)
}

/// Drop reports without description or comment, normalize the constructor,
/// convert the downtime from hours to minutes, reset the rating and remove
/// duplicates (first occurrence kept).
///
/// Only absent texts are dropped; whitespace-only texts are kept.
pub fn prepare_training_reports(reports: Vec<Report>) -> Result<Vec<Report>> {
    let mut seen = HashSet::new();
    let mut prepared = Vec::with_capacity(reports.len());
    for mut report in reports {
        if report.descr_order.is_empty() || report.comment.is_empty() {
            continue;
        }
        report.dura_equi = report.dura_equi.map(|hours| hours * MINUTES_PER_HOUR);
        report.constructor = Some(match report.constructor.as_deref() {
            Some(c) if !c.is_empty() => c.to_uppercase(),
            _ => UNKNOWN_CONSTRUCTOR.to_string(),
        });
        report.rating = -1;
        if seen.insert(serde_json::to_string(&report)?) {
            prepared.push(report);
        }
    }
    info!(reports = prepared.len(), "total number of reports used for the training");
    Ok(prepared)
}

/// Append the designation of every spare part to the comment.
fn with_components_in_comment(mut report: Report) -> Report {
    let designations: Vec<&str> = report
        .components
        .iter()
        .map(|c| c.designation.as_str())
        .collect();
    report.comment = format!("{} {}", report.comment, designations.join(" "));
    report
}

/// Fit and save both vectorizers of one (language, shop).
pub fn train_shop(
    store: &ArtifactStore,
    resources: &LanguageResources,
    shop: &str,
    reports: &[Report],
) -> Result<Vec<PathBuf>> {
    info!(language = %resources.language, shop, "training");
    let normalizer = resources.normalizer();
    let reports: Vec<Report> = reports.iter().cloned().map(with_components_in_comment).collect();
    Field::ALL
        .into_iter()
        .map(|field| {
            let pair = VectorizerPair::fit(&resources.language, shop, field, &reports, &normalizer);
            store.save(&pair)
        })
        .collect()
}

/// Train every industrialised (language, shop) of the perimeter.
///
/// Reports are selected by the sites of the language and the upper-cased
/// shop code. Shops without reports are skipped.
pub fn train_all(config: &AppConfig, perimeter: &Perimeter, reports: Vec<Report>) -> Result<Vec<PathBuf>> {
    info!("starting training pipeline");
    let reports = prepare_training_reports(reports)?;
    let store = ArtifactStore::new(&config.histo_dir);
    let mut saved = Vec::new();
    for language in perimeter.indus_languages() {
        let resources = config.load_language(language)?;
        let sites = perimeter.sites(language)?;
        for shop in perimeter.shops(language)? {
            let code_shop = shop.to_uppercase();
            let selected: Vec<Report> = reports
                .iter()
                .filter(|r| {
                    r.code_shop == code_shop
                        && r.code_site.as_deref().is_some_and(|s| sites.contains(&s))
                })
                .cloned()
                .collect();
            if selected.is_empty() {
                warn!(language, shop = %shop, "no report to train on, skipping");
                continue;
            }
            saved.extend(train_shop(&store, &resources, shop, &selected)?);
        }
    }
    info!(artifacts = saved.len(), "training pipeline finished");
    Ok(saved)
}
