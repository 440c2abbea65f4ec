//! Maintenance reports and the ranking of search results.
pub mod ranker;

use serde::{Deserialize, Deserializer, Serialize};

pub use ranker::{
    filter_reports, get_matching_reports, sort_reports, FacetFilters, FilteredReports,
    RankedReport,
};

/// Spare part used during an intervention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Component {
    pub designation: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
}

/// Document attached to a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Media {
    pub doc_url: String,
    #[serde(default)]
    pub doc_type: Option<String>,
}

/// One maintenance record, read-only once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Report {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub code_site: Option<String>,
    #[serde(default)]
    pub code_shop: String,
    #[serde(default)]
    pub constructor: Option<String>,
    /// Equipment designation.
    #[serde(default)]
    pub descr_equi: Option<String>,
    /// Failure description. Empty when absent or null.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub descr_order: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub comment: String,
    /// Creation date.
    #[serde(default)]
    pub erdat: Option<String>,
    /// Equipment downtime. Extracted in hours, converted to minutes when
    /// the report is prepared for training.
    #[serde(default)]
    pub dura_equi: Option<f64>,
    #[serde(default)]
    pub rating: i32,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub medias: Vec<Media>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Report {
    /// Value of a scalar column by its upper-case name, `None` for an unknown
    /// or empty column.
    pub fn column_value(&self, column: &str) -> Option<String> {
        match column {
            "ORDER_ID" => Some(self.order_id.clone()),
            "CODE_SITE" => self.code_site.clone(),
            "CODE_SHOP" => Some(self.code_shop.clone()),
            "CONSTRUCTOR" => self.constructor.clone(),
            "DESCR_EQUI" => self.descr_equi.clone(),
            "DESCR_ORDER" => Some(self.descr_order.clone()),
            "COMMENT" => Some(self.comment.clone()),
            "ERDAT" => self.erdat.clone(),
            "DURA_EQUI" => self.dura_equi.map(|d| d.to_string()),
            "RATING" => Some(self.rating.to_string()),
            _ => None,
        }
    }
}

/// Categorical filter dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Site,
    Constructor,
    Equipment,
}

impl Facet {
    pub fn value(self, report: &Report) -> Option<&str> {
        match self {
            Facet::Site => report.code_site.as_deref(),
            Facet::Constructor => report.constructor.as_deref(),
            Facet::Equipment => report.descr_equi.as_deref(),
        }
    }
}

/// A report with its normalized text, as stored in an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedReport {
    pub report: Report,
    /// Normalized text of the vectorized field.
    pub corpus: String,
    /// Topic-model text, comment artifacts only.
    #[serde(default)]
    pub corpus_lda: Option<String>,
}
