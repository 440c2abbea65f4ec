use crate::{utils::math::vector::ZeroSpVec, vectorizer::corpus::Corpus};

/// Turns raw term counts into the weights stored in a document-term matrix.
///
/// Implementors are stateless; the per-term factor computed by `idf_vec`
/// is stored next to the vocabulary and handed back to `weigh`.
pub trait TermWeighting {
    /// One factor per vocabulary term, in column order.
    fn idf_vec(corpus: &Corpus, vocabulary: &[String]) -> Vec<f64>;
    /// Weight one row of raw counts.
    fn weigh(counts: ZeroSpVec<f64>, idf: &[f64]) -> ZeroSpVec<f64>;
}

/// Raw term frequency, no reweighting.
#[derive(Debug)]
pub struct RawCountEngine;

impl TermWeighting for RawCountEngine {
    fn idf_vec(_corpus: &Corpus, vocabulary: &[String]) -> Vec<f64> {
        vec![1.0; vocabulary.len()]
    }

    fn weigh(counts: ZeroSpVec<f64>, _idf: &[f64]) -> ZeroSpVec<f64> {
        counts
    }
}

/// Smoothed TF-IDF with L2 normalized rows.
///
/// `idf(t) = ln((1 + n) / (1 + df(t))) + 1`
#[derive(Debug)]
pub struct SmoothTfIdfEngine;

impl TermWeighting for SmoothTfIdfEngine {
    fn idf_vec(corpus: &Corpus, vocabulary: &[String]) -> Vec<f64> {
        let doc_num = corpus.get_doc_num() as f64;
        vocabulary
            .iter()
            .map(|token| {
                let doc_freq = corpus.get_term_count(token) as f64;
                ((1.0 + doc_num) / (1.0 + doc_freq)).ln() + 1.0
            })
            .collect()
    }

    fn weigh(counts: ZeroSpVec<f64>, idf: &[f64]) -> ZeroSpVec<f64> {
        counts
            .map_values(|idx, count| count * idf.get(idx).copied().unwrap_or(1.0))
            .l2_normalized()
    }
}
