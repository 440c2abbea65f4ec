pub mod analyzer;
pub mod corpus;
pub mod evaluate;
pub mod serde;
pub mod tfidf;
pub mod token;

use std::{fmt, str::FromStr};

use ::serde::{Deserialize, Serialize};
use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    report::{PreparedReport, Report},
    text::{NormalizeOptions, Normalizer, TextKind},
    utils::math::vector::ZeroSpVec,
    vectorizer::{
        analyzer::Analyzer,
        corpus::Corpus,
        evaluate::scoring::SimilarityAlgorithm,
        tfidf::{RawCountEngine, SmoothTfIdfEngine, TermWeighting},
    },
};

/// Text field of a report that gets its own vectorizer.
///
/// The field decides both the weighting of the document-term matrix and the
/// similarity used at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    /// Short failure description, TF-IDF + cosine.
    Description,
    /// Free-text repair comment, raw counts + overlap.
    Comment,
}

impl Field {
    pub const ALL: [Field; 2] = [Field::Description, Field::Comment];

    /// Column name, also used in artifact paths.
    pub fn column(self) -> &'static str {
        match self {
            Field::Description => "DESCR_ORDER",
            Field::Comment => "COMMENT",
        }
    }

    pub fn weighting(self) -> Weighting {
        match self {
            Field::Description => Weighting::SmoothTfIdf,
            Field::Comment => Weighting::RawCount,
        }
    }

    pub fn similarity(self) -> SimilarityAlgorithm {
        match self {
            Field::Description => SimilarityAlgorithm::CosineSimilarity,
            Field::Comment => SimilarityAlgorithm::CountOverlap,
        }
    }

    pub fn text_kind(self) -> TextKind {
        match self {
            Field::Description => TextKind::Description,
            Field::Comment => TextKind::Comment,
        }
    }

    pub fn raw_text(self, report: &Report) -> &str {
        match self {
            Field::Description => &report.descr_order,
            Field::Comment => &report.comment,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Field::ALL
            .into_iter()
            .find(|f| f.column().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::not_found_among("field", s, Field::ALL.map(Field::column)))
    }
}

/// Runtime choice of a `TermWeighting` engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weighting {
    RawCount,
    SmoothTfIdf,
}

impl Weighting {
    fn idf_vec(self, corpus: &Corpus, vocabulary: &[String]) -> Vec<f64> {
        match self {
            Weighting::RawCount => RawCountEngine::idf_vec(corpus, vocabulary),
            Weighting::SmoothTfIdf => SmoothTfIdfEngine::idf_vec(corpus, vocabulary),
        }
    }

    fn weigh(self, counts: ZeroSpVec<f64>, idf: &[f64]) -> ZeroSpVec<f64> {
        match self {
            Weighting::RawCount => RawCountEngine::weigh(counts, idf),
            Weighting::SmoothTfIdf => SmoothTfIdfEngine::weigh(counts, idf),
        }
    }
}

/// Frozen vocabulary (term -> column) plus its per-term weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedVectorizer {
    pub analyzer: Analyzer,
    pub weighting: Weighting,
    #[serde(with = "indexmap::map::serde_seq")]
    pub vocabulary: IndexMap<String, usize>,
    pub idf: Vec<f64>,
}

impl FittedVectorizer {
    /// Fit with the default analyzer, keeping every term seen.
    pub fn fit<T>(weighting: Weighting, docs: &[T]) -> Self
    where
        T: AsRef<str> + Sync,
    {
        let analyzer = Analyzer::default();
        let corpus = build_corpus(&analyzer, docs);
        let terms = corpus.sorted_terms();
        Self::from_corpus(analyzer, weighting, &corpus, terms)
    }

    /// Build from already selected `terms`, in the given column order.
    pub fn from_corpus(
        analyzer: Analyzer,
        weighting: Weighting,
        corpus: &Corpus,
        terms: Vec<String>,
    ) -> Self {
        let idf = weighting.idf_vec(corpus, &terms);
        let vocabulary = terms.into_iter().enumerate().map(|(i, t)| (t, i)).collect();
        Self {
            analyzer,
            weighting,
            vocabulary,
            idf,
        }
    }

    /// Number of columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    #[inline]
    pub fn column_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn feature_names(&self) -> Vec<&str> {
        self.vocabulary.keys().map(String::as_str).collect()
    }

    /// Project `text` on the frozen vocabulary; unknown tokens are dropped.
    pub fn transform(&self, text: &str) -> ZeroSpVec<f64> {
        let freq = self.analyzer.frequency(text);
        let counts = ZeroSpVec::from_pairs(
            self.len(),
            freq.iter()
                .filter_map(|(token, count)| self.column_of(token).map(|idx| (idx, count as f64))),
        );
        self.weighting.weigh(counts, &self.idf)
    }

    pub fn transform_all<T>(&self, docs: &[T]) -> DocumentTermMatrix
    where
        T: AsRef<str> + Sync,
    {
        let rows = docs.par_iter().map(|d| self.transform(d.as_ref())).collect();
        DocumentTermMatrix {
            rows,
            n_cols: self.len(),
        }
    }
}

/// Document frequencies of `docs` under `analyzer`.
pub(crate) fn build_corpus<T>(analyzer: &Analyzer, docs: &[T]) -> Corpus
where
    T: AsRef<str> + Sync,
{
    let freqs: Vec<_> = docs.par_iter().map(|d| analyzer.frequency(d.as_ref())).collect();
    let mut corpus = Corpus::new();
    for freq in &freqs {
        corpus.add_set(&freq.token_set_ref_str());
    }
    corpus
}

/// Sparse matrix, one row per document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentTermMatrix {
    pub rows: Vec<ZeroSpVec<f64>>,
    pub n_cols: usize,
}

impl DocumentTermMatrix {
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Dense copy of column `idx`.
    pub fn column(&self, idx: usize) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| row.get(idx).unwrap_or(0.0))
            .collect()
    }
}

/// Fitted vectorizer of one (language, shop, field) together with the
/// prepared table it was fitted on and its document-term matrix.
///
/// This triple is the artifact handed over from training to search. It is
/// never mutated after fitting; reloading replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerPair {
    pub language: String,
    pub shop: String,
    pub field: Field,
    pub table: Vec<PreparedReport>,
    pub vectorizer: FittedVectorizer,
    pub dt_matrix: DocumentTermMatrix,
}

impl VectorizerPair {
    /// Normalize the text of `field` for every report. Comment rows also get
    /// the topic-model text.
    pub fn preprocess(reports: &[Report], field: Field, normalizer: &Normalizer) -> Vec<PreparedReport> {
        reports
            .par_iter()
            .map(|report| {
                let raw = field.raw_text(report);
                let corpus = normalizer.normalize(raw, field.text_kind(), NormalizeOptions::default());
                let corpus_lda = (field == Field::Comment)
                    .then(|| normalizer.normalize(raw, TextKind::Comment, NormalizeOptions::TOPIC));
                PreparedReport {
                    report: report.clone(),
                    corpus,
                    corpus_lda,
                }
            })
            .collect()
    }

    /// Preprocess `reports` then fit the vectorizer of `field` on them.
    pub fn fit(
        language: &str,
        shop: &str,
        field: Field,
        reports: &[Report],
        normalizer: &Normalizer,
    ) -> Self {
        info!(language, shop, field = %field, reports = reports.len(), "preprocessing corpus");
        let table = Self::preprocess(reports, field, normalizer);
        let docs: Vec<&str> = table.iter().map(|r| r.corpus.as_str()).collect();
        let vectorizer = FittedVectorizer::fit(field.weighting(), &docs);
        let dt_matrix = vectorizer.transform_all(&docs);
        debug!(field = %field, vocabulary = vectorizer.len(), "vectorizer fitted");
        Self {
            language: language.to_string(),
            shop: shop.to_string(),
            field,
            table,
            vectorizer,
            dt_matrix,
        }
    }

    #[inline]
    pub fn transform(&self, text: &str) -> ZeroSpVec<f64> {
        self.vectorizer.transform(text)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
