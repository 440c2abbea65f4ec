use std::{collections::HashMap, fs, path::{Path, PathBuf}};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

pub const WORD_DICT_FILE: &str = "word_dict.json";

/// Personalized correction dictionary: canonical word -> known variants
/// (misspellings, abbreviations).
///
/// The file order of the canonical words is kept, so the first-match rule of
/// [`WordDict::corrections`] is stable from one run to the next.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct WordDict {
    entries: IndexMap<String, Vec<String>>,
}

impl WordDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::NotFound(format!("no word dictionary at {}", path.display())));
        }
        info!(path = %path.display(), "loading the word dictionary");
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        info!(path = %path.display(), words = self.len(), "saving the word dictionary");
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn insert<S, I, V>(&mut self, canonical: S, variants: I) -> &mut Self
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.entries
            .insert(canonical.into(), variants.into_iter().map(Into::into).collect());
        self
    }

    pub fn get(&self, canonical: &str) -> Option<&[String]> {
        self.entries.get(canonical).map(Vec::as_slice)
    }

    pub fn contains(&self, canonical: &str) -> bool {
        self.entries.contains_key(canonical)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// variant -> canonical lookup.
    /// A variant listed under several canonical words maps to the first one.
    pub fn corrections(&self) -> HashMap<String, String> {
        let mut lookup = HashMap::new();
        for (canonical, variants) in &self.entries {
            for variant in variants {
                lookup
                    .entry(variant.clone())
                    .or_insert_with(|| canonical.clone());
            }
        }
        lookup
    }

    /// Merge `new` into `self` and drop variants that are canonical words
    /// themselves.
    pub fn enrich(&mut self, new: &WordDict) -> usize {
        let before = self.len();
        merge_word_dicts(self, new);
        let canonicals: Vec<String> = self.entries.keys().cloned().collect();
        for variants in self.entries.values_mut() {
            variants.retain(|v| !canonicals.contains(v));
        }
        self.len() - before
    }
}

/// Add the words of `new` to `reference`.
///
/// A word of `new` that is already known to `reference`, either as a
/// canonical word or as a variant, has its variants appended to the first
/// matching canonical entry (no duplicates). Unknown words become new
/// entries.
pub fn merge_word_dicts(reference: &mut WordDict, new: &WordDict) {
    for (word, new_variants) in &new.entries {
        let owner = reference
            .entries
            .iter()
            .position(|(canonical, variants)| canonical == word || variants.contains(word));
        match owner {
            Some(idx) => {
                if let Some((_, variants)) = reference.entries.get_index_mut(idx) {
                    for v in new_variants {
                        if !variants.contains(v) {
                            variants.push(v.clone());
                        }
                    }
                }
            }
            None => {
                reference.entries.insert(word.clone(), new_variants.clone());
            }
        }
    }
}

/// `<resources>/<language>/word_dict.json`
pub fn word_dict_path(resources_dir: &Path, language: &str) -> PathBuf {
    resources_dir.join(language).join(WORD_DICT_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(v: &[String]) -> Vec<String> {
        let mut v = v.to_vec();
        v.sort();
        v
    }

    #[test]
    fn merge_is_a_union_without_duplicates() {
        let mut reference: WordDict = serde_json::from_str(
            r#"{"accordeon": ["acordeon"], "accoster": ["accostage", "acostage"]}"#,
        )
        .unwrap();
        let new: WordDict = serde_json::from_str(
            r#"{"accordeon": ["accordeons", "acordeon"],
                "accostage": ["accostages"],
                "accumulateur": ["acumulateur", "acc"]}"#,
        )
        .unwrap();

        merge_word_dicts(&mut reference, &new);

        assert_eq!(
            sorted(reference.get("accordeon").unwrap()),
            vec!["accordeons", "acordeon"]
        );
        assert_eq!(
            sorted(reference.get("accoster").unwrap()),
            vec!["accostage", "accostages", "acostage"]
        );
        assert_eq!(
            sorted(reference.get("accumulateur").unwrap()),
            vec!["acc", "acumulateur"]
        );
        assert!(!reference.contains("accostage"));
    }

    #[test]
    fn first_canonical_wins_for_shared_variants() {
        let mut dict = WordDict::new();
        dict.insert("moteur", ["mot"]).insert("motif", ["mot", "motf"]);
        let lookup = dict.corrections();
        assert_eq!(lookup["mot"], "moteur");
        assert_eq!(lookup["motf"], "motif");
    }

    #[test]
    fn enrich_drops_variants_that_are_canonical() {
        let mut dict = WordDict::new();
        dict.insert("remplacer", ["remplacr"]);
        let mut new = WordDict::new();
        new.insert("changer", ["chnger", "remplacer"]);
        let added = dict.enrich(&new);
        assert_eq!(added, 1);
        assert_eq!(dict.get("remplacer").unwrap(), ["remplacr".to_string()]);
        assert_eq!(dict.get("changer").unwrap(), ["chnger".to_string()]);
    }

    #[test]
    fn save_then_load_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(WORD_DICT_FILE);
        let mut dict = WordDict::new();
        dict.insert("zone", ["zne"]).insert("arret", ["arrt"]);
        dict.save(&path).unwrap();
        let loaded = WordDict::load(&path).unwrap();
        let keys: Vec<&str> = loaded.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zone", "arret"]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            WordDict::load(dir.path().join("nope.json")),
            Err(Error::NotFound(_))
        ));
    }
}
