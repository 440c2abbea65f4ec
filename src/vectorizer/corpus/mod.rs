use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::DocFrequency;

/// keep document count and document frequency of every term
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Corpus {
    /// number of documents added
    pub doc_num: u64,
    /// documents containing each term
    #[serde(with = "indexmap::map::serde_seq")]
    pub term_counts: IndexMap<Box<str>, u64>,
}

impl Corpus {
    pub fn new() -> Self {
        Self {
            doc_num: 0,
            term_counts: IndexMap::new(),
        }
    }

    /// Add one document given its distinct terms.
    pub fn add_set<T>(&mut self, terms: &[T])
    where
        T: AsRef<str>,
    {
        self.doc_num += 1;
        for term in terms {
            *self.term_counts.entry(term.as_ref().into()).or_insert(0) += 1;
        }
    }

    #[inline]
    pub fn get_doc_num(&self) -> u64 {
        self.doc_num
    }

    /// Number of documents containing `term`.
    #[inline]
    pub fn get_term_count(&self, term: &str) -> u64 {
        self.term_counts.get(term).copied().unwrap_or(0)
    }

    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.term_counts.len()
    }

    /// All terms in ascending order, the column order of a fitted vocabulary.
    pub fn sorted_terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = self.term_counts.keys().map(|t| t.to_string()).collect();
        terms.sort_unstable();
        terms
    }

    /// Sorted terms whose document frequency lies in `[min_df, max_df]`,
    /// both bounds resolved against the current document count.
    pub fn pruned_terms(&self, min_df: DocFrequency, max_df: DocFrequency) -> Vec<String> {
        let n = self.doc_num as usize;
        let (min, max) = (min_df.resolve(n), max_df.resolve(n));
        self.sorted_terms()
            .into_iter()
            .filter(|t| {
                let df = self.get_term_count(t) as f64;
                df >= min && df <= max
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Corpus {
        let mut c = Corpus::new();
        c.add_set(&["vanne", "fuite"]);
        c.add_set(&["vanne", "joint"]);
        c.add_set(&["vanne"]);
        c
    }

    #[test]
    fn document_frequencies() {
        let c = corpus();
        assert_eq!(c.get_doc_num(), 3);
        assert_eq!(c.get_term_count("vanne"), 3);
        assert_eq!(c.get_term_count("pompe"), 0);
        assert_eq!(c.sorted_terms(), vec!["fuite", "joint", "vanne"]);
    }

    #[test]
    fn pruning_uses_both_bounds() {
        let c = corpus();
        assert_eq!(
            c.pruned_terms(DocFrequency::Count(1), DocFrequency::Ratio(0.9)),
            vec!["fuite", "joint"]
        );
        assert_eq!(
            c.pruned_terms(DocFrequency::Count(2), DocFrequency::Ratio(1.0)),
            vec!["vanne"]
        );
    }
}
