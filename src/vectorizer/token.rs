use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// TokenFrequency
/// Counts token occurrences of one document (or of a whole corpus when
/// documents are added one after another).
///
/// # Examples
/// ```
/// use diaman_search::vectorizer::token::TokenFrequency;
/// let mut freq = TokenFrequency::new();
/// freq.add_tokens(&["pompe", "fuite", "pompe"]);
/// assert_eq!(freq.token_count("pompe"), 2);
/// assert_eq!(freq.token_sum(), 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TokenFrequency {
    #[serde(with = "indexmap::map::serde_seq")]
    token_count: IndexMap<String, u32>,
    total_token_count: u64,
}

/// Token insertion
impl TokenFrequency {
    pub fn new() -> Self {
        TokenFrequency {
            token_count: IndexMap::new(),
            total_token_count: 0,
        }
    }

    #[inline]
    pub fn add_token(&mut self, token: &str) -> &mut Self {
        let count = self.token_count.entry(token.to_string()).or_insert(0);
        *count += 1;
        self.total_token_count += 1;
        self
    }

    #[inline]
    pub fn add_tokens<T>(&mut self, tokens: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for token in tokens {
            self.add_token(token.as_ref());
        }
        self
    }

    /// Add the counts of another frequency table.
    pub fn add_tokens_from_freq(&mut self, other: &TokenFrequency) -> &mut Self {
        for (token, &count) in &other.token_count {
            *self.token_count.entry(token.clone()).or_insert(0) += count;
            self.total_token_count += count as u64;
        }
        self
    }
}

/// Statistics
impl TokenFrequency {
    /// Occurrences of `token`, zero when absent.
    #[inline]
    pub fn token_count(&self, token: &str) -> u32 {
        self.token_count.get(token).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    #[inline]
    pub fn token_sum(&self) -> u64 {
        self.total_token_count
    }

    /// Number of distinct tokens.
    #[inline]
    pub fn token_num(&self) -> usize {
        self.token_count.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.token_count.is_empty()
    }

    /// Distinct tokens, first-seen order.
    #[inline]
    pub fn token_set_ref_str(&self) -> Vec<&str> {
        self.token_count.keys().map(String::as_str).collect()
    }

    /// `(token, count)` pairs by descending count, ties in ascending token
    /// order.
    pub fn sorted_frequency_vector(&self) -> Vec<(String, u32)> {
        let mut token_list: Vec<(String, u32)> = self
            .token_count
            .iter()
            .map(|(token, &count)| (token.clone(), count))
            .collect();
        token_list.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        token_list
    }

    /// The `n` most frequent tokens.
    pub fn most_frequent_tokens(&self, n: usize) -> Vec<String> {
        self.sorted_frequency_vector()
            .into_iter()
            .take(n)
            .map(|(token, _)| token)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.token_count.iter().map(|(t, &c)| (t.as_str(), c))
    }
}
