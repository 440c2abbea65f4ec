use rayon::prelude::*;
use tracing::debug;

use crate::{utils::normalizer::min_max_normalize, vectorizer::VectorizerPair};

/// Similarity between a query and every document of a `VectorizerPair`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityAlgorithm {
    /// Cosine similarity in TF-IDF space.
    /// Considers only direction
    CosineSimilarity,
    /// Normalized count overlap in bag-of-words space.
    /// Each known query token adds the document's share of the token's total
    /// count, or -1 when the document lacks it; the sum is min-max scaled.
    CountOverlap,
}

impl VectorizerPair {
    /// One score per table row, in table order, using the field's algorithm.
    ///
    /// `query` is expected to be normalized already.
    pub fn similarity(&self, query: &str) -> Vec<f64> {
        let scores = match self.field.similarity() {
            SimilarityAlgorithm::CosineSimilarity => self.scoring_cosine(query),
            SimilarityAlgorithm::CountOverlap => self.scoring_overlap(query),
        };
        debug!(field = %self.field, rows = scores.len(), "similarity computed");
        scores
    }

    fn scoring_cosine(&self, query: &str) -> Vec<f64> {
        let query_vec = self.transform(query);
        self.dt_matrix
            .rows
            .par_iter()
            .map(|row| query_vec.cosine_similarity(row))
            .collect()
    }

    fn scoring_overlap(&self, query: &str) -> Vec<f64> {
        let mut scores = vec![0.0; self.dt_matrix.n_rows()];
        for token in query.split_whitespace() {
            let Some(idx) = self.vectorizer.column_of(token) else {
                continue;
            };
            let column = self.dt_matrix.column(idx);
            let total: f64 = column.iter().sum();
            scores
                .par_iter_mut()
                .zip(column.par_iter())
                .for_each(|(score, &count)| {
                    *score += if count == 0.0 { -1.0 } else { count / total };
                });
        }
        min_max_normalize(&scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        report::{PreparedReport, Report},
        vectorizer::{Field, FittedVectorizer},
    };

    fn pair(field: Field, docs: &[&str]) -> VectorizerPair {
        let vectorizer = FittedVectorizer::fit(field.weighting(), docs);
        let dt_matrix = vectorizer.transform_all(docs);
        let table = docs
            .iter()
            .map(|d| PreparedReport {
                report: Report {
                    order_id: String::new(),
                    code_site: None,
                    code_shop: String::new(),
                    constructor: None,
                    descr_equi: None,
                    descr_order: String::new(),
                    comment: d.to_string(),
                    erdat: None,
                    dura_equi: None,
                    rating: -1,
                    components: Vec::new(),
                    medias: Vec::new(),
                },
                corpus: d.to_string(),
                corpus_lda: None,
            })
            .collect();
        VectorizerPair {
            language: "fr".into(),
            shop: "emb".into(),
            field,
            table,
            vectorizer,
            dt_matrix,
        }
    }

    #[test]
    fn cosine_ranks_shared_vocabulary_first() {
        let p = pair(Field::Description, &["pompe fuite huile", "robot soudure", "pompe bruit"]);
        let sim = p.similarity("pompe fuite");
        assert!(sim[0] > sim[2]);
        assert!(sim[2] > 0.0);
        assert_eq!(sim[1], 0.0);
    }

    #[test]
    fn unknown_query_scores_zero_everywhere() {
        let p = pair(Field::Description, &["pompe fuite", "robot soudure"]);
        assert_eq!(p.similarity("convoyeur bloque"), vec![0.0, 0.0]);
        let p = pair(Field::Comment, &["pompe fuite", "robot soudure"]);
        assert_eq!(p.similarity("convoyeur bloque"), vec![0.0, 0.0]);
    }

    #[test]
    fn overlap_penalizes_missing_tokens() {
        // pompe: 2/3 and 1/3 of the occurrences, absent from the last row
        let p = pair(Field::Comment, &["pompe pompe vidange", "pompe", "vidange capteur"]);
        let sim = p.similarity("pompe");
        assert!((sim[0] - 1.0).abs() < 1e-12);
        assert!((sim[1] - 0.8).abs() < 1e-12);
        assert_eq!(sim[2], 0.0);
    }

    #[test]
    fn overlap_is_bounded() {
        let p = pair(
            Field::Comment,
            &["vanne fuite", "vanne joint fuite fuite", "capteur", "joint"],
        );
        let sim = p.similarity("fuite joint vanne vanne inconnu");
        assert!(sim.iter().all(|s| (0.0..=1.0).contains(s)));
        assert!(sim.iter().any(|&s| s > 1.0 - 1e-12));
        assert!(sim.iter().any(|&s| s == 0.0));
    }

    #[test]
    fn overlap_on_single_document_is_defined() {
        let p = pair(Field::Comment, &["vanne fuite"]);
        assert_eq!(p.similarity("vanne"), vec![1.0]);
    }
}
