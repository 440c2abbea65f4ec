use std::{collections::{HashMap, HashSet}, sync::LazyLock};

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::text::word_dict::WordDict;

/// Header patterns of the comment field (date, agent name, agent id,
/// optional phone number), most specific first.
static COMMENT_HEADERS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        r"\d{2}\.\d{2}\.\d{4}.{10,40}\([a-z]\d{6}\) tel. \d{2,10} \d{2,10}",
        r"\d{2}\.\d{2}\.\d{4}.{10,40}\([a-z]\d{6}\) tel. \d{2,10}",
        r"\d{2}\.\d{2}\.\d{4}.{10,40}\([a-z]\d{6}\)",
    ]
    .map(|p| Regex::new(p).expect("static header pattern"))
});

/// Words may carry inner `?`, `-`, `"` or `_` without being split.
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\w+(?:[?\-"_]\w+)*"#).expect("static word pattern"));

const NUMBER_CHARS: &str = "0123456789/_->()";
const SMALL_WORD_LEN: usize = 4;

/// What kind of text is being normalized. Only comments carry a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Description,
    Comment,
    Query,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub remove_numbers: bool,
    pub remove_small_words: bool,
}

impl NormalizeOptions {
    /// Settings of the topic-model text: no numbers, no small words.
    pub const TOPIC: NormalizeOptions = NormalizeOptions {
        remove_numbers: true,
        remove_small_words: true,
    };
}

/// Decompose then drop everything outside ASCII, accents included.
pub fn ascii_only(text: &str) -> String {
    text.nfkd().filter(char::is_ascii).collect()
}

/// Lowercase, drop accents and everything outside ASCII.
pub fn fold_ascii(text: &str) -> String {
    ascii_only(&text.to_lowercase())
}

/// Drop the structured header(s) of a comment, keeping the rest intact.
pub fn remove_comment_header(comment: &str) -> String {
    COMMENT_HEADERS
        .iter()
        .fold(comment.to_string(), |text, re| re.replace_all(&text, "").into_owned())
}

/// Full text normalization pipeline.
///
/// Holds the stopwords and the variant -> canonical lookup of one language.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    stopwords: HashSet<String>,
    corrections: HashMap<String, String>,
}

impl Normalizer {
    pub fn new(stopwords: HashSet<String>, word_dict: &WordDict) -> Self {
        Self {
            stopwords,
            corrections: word_dict.corrections(),
        }
    }

    pub fn stopwords(&self) -> &HashSet<String> {
        &self.stopwords
    }

    pub fn normalize(&self, raw: &str, kind: TextKind, opts: NormalizeOptions) -> String {
        let text = self.refine(raw, kind, opts);
        self.correct_words(&text)
    }

    /// Conventional processing, everything but the word correction.
    pub fn refine(&self, raw: &str, kind: TextKind, opts: NormalizeOptions) -> String {
        let mut text = fold_ascii(raw);
        if kind == TextKind::Comment {
            text = remove_comment_header(&text);
        }

        let mut text = WORD
            .find_iter(&text)
            .map(|m| m.as_str())
            .filter(|w| !self.stopwords.contains(*w))
            .collect::<Vec<_>>()
            .join(" ");

        if opts.remove_numbers {
            text.retain(|c| !NUMBER_CHARS.contains(c));
        }
        if opts.remove_small_words {
            text = text
                .split(' ')
                .filter(|w| w.chars().count() >= SMALL_WORD_LEN)
                .collect::<Vec<_>>()
                .join(" ");
        }
        text
    }

    /// Replace every known variant by its canonical word.
    pub fn correct_words(&self, text: &str) -> String {
        text.split(' ')
            .map(|w| self.corrections.get(w).map_or(w, String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
            .trim_start_matches(' ')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        let stopwords = ["la", "en", "du", "et", "defaut", "ok"]
            .into_iter()
            .map(String::from)
            .collect();
        let mut dict = WordDict::new();
        dict.insert("remettre", ["remetre", "remetr"])
            .insert("ventilateur", ["vetilateur"]);
        Normalizer::new(stopwords, &dict)
    }

    #[test]
    fn header_is_removed_from_comments() {
        let comment = "12.03.2019 dupont jean-marc (a123456) tel. 0123 456789 * rearme defaut";
        assert_eq!(remove_comment_header(comment), " * rearme defaut");
        let no_phone = "12.03.2019 dupont jean-marc (a123456) * rearme";
        assert_eq!(remove_comment_header(no_phone), " * rearme");
    }

    #[test]
    fn accents_are_stripped() {
        assert_eq!(fold_ascii("Réarmé ÉCHEC Ça"), "rearme echec ca");
        assert_eq!(ascii_only("Vérin Cassé"), "Verin Casse");
    }

    #[test]
    fn comment_pipeline_matches_reference() {
        let n = normalizer();
        let raw = "12.03.2019 DUPONT Jean (a123456) tel. 0123 456789 *  * Effectuer la remise en état du bridage PMR 8110";
        let out = n.normalize(raw, TextKind::Comment, NormalizeOptions::TOPIC);
        assert_eq!(out, "effectuer remise etat bridage");

        let raw = "Réarmé défaut et relance convoyeur, surveillance OK";
        let out = n.normalize(raw, TextKind::Comment, NormalizeOptions::TOPIC);
        assert_eq!(out, "rearme relance convoyeur surveillance");
    }

    #[test]
    fn header_only_stripped_for_comments() {
        let n = normalizer();
        let raw = "12.03.2019 dupont jean (a123456) moteur";
        let out = n.normalize(raw, TextKind::Description, NormalizeOptions::default());
        assert_eq!(out, "12 03 2019 dupont jean a123456 moteur");
    }

    #[test]
    fn inner_punctuation_keeps_tokens_whole() {
        let n = normalizer();
        let out = n.normalize("porte-outil cable_x12 ?!", TextKind::Query, NormalizeOptions::default());
        assert_eq!(out, "porte-outil cable_x12");
    }

    #[test]
    fn variants_are_corrected() {
        let n = normalizer();
        let out = n.normalize("remetre en etat vetilateur", TextKind::Query, NormalizeOptions::default());
        assert_eq!(out, "remettre etat ventilateur");
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let n = normalizer();
        assert_eq!(n.normalize("", TextKind::Comment, NormalizeOptions::TOPIC), "");
        assert_eq!(n.normalize("  ,;! ", TextKind::Query, NormalizeOptions::default()), "");
        assert_eq!(n.normalize("la et du", TextKind::Query, NormalizeOptions::default()), "");
    }

    #[test]
    fn normalization_is_idempotent_on_clean_text() {
        let n = normalizer();
        let clean = "convoyeur bloque capteur position";
        let once = n.normalize(clean, TextKind::Query, NormalizeOptions::default());
        assert_eq!(once, clean);
        assert_eq!(n.normalize(&once, TextKind::Query, NormalizeOptions::default()), once);
    }

    #[test]
    fn number_removal_keeps_spacing_then_small_words_drop() {
        let n = normalizer();
        let out = n.refine("pmr 8110 x/y", TextKind::Query, NormalizeOptions {
            remove_numbers: true,
            remove_small_words: false,
        });
        assert_eq!(out, "pmr  x y");
    }
}
