use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::config::StripAccents;

use super::token::TokenFrequency;

/// Tokens of two or more word characters.
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("static token pattern"));

/// Splits raw text into vectorizer tokens (optionally n-grams).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analyzer {
    pub lowercase: bool,
    pub strip_accents: Option<StripAccents>,
    /// inclusive n-gram range
    pub ngram_range: (usize, usize),
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            lowercase: true,
            strip_accents: None,
            ngram_range: (1, 1),
        }
    }
}

impl Analyzer {
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let mut text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        match self.strip_accents {
            Some(StripAccents::Ascii) => {
                text = text.nfkd().filter(char::is_ascii).collect();
            }
            Some(StripAccents::Unicode) => {
                text = text.nfkd().filter(|c| !is_combining_mark(*c)).collect();
            }
            None => {}
        }
        let words: Vec<&str> = TOKEN.find_iter(&text).map(|m| m.as_str()).collect();

        let (min_n, max_n) = self.ngram_range;
        if (min_n, max_n) == (1, 1) {
            return words.into_iter().map(String::from).collect();
        }
        let mut grams = Vec::new();
        for n in min_n.max(1)..=max_n {
            if n > words.len() {
                break;
            }
            grams.extend(words.windows(n).map(|w| w.join(" ")));
        }
        grams
    }

    pub fn frequency(&self, text: &str) -> TokenFrequency {
        let mut freq = TokenFrequency::new();
        freq.add_tokens(&self.tokens(text));
        freq
    }
}
