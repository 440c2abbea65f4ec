use std::{collections::HashSet, fs, path::Path};

use tracing::info;

use crate::{
    error::{Error, Result},
    text::{word_dict::word_dict_path, Normalizer, WordDict},
};

pub const STOPWORDS_FILE: &str = "stopwords.txt";

/// Stopwords and correction dictionary of one language.
#[derive(Debug, Clone)]
pub struct LanguageResources {
    pub language: String,
    pub stopwords: HashSet<String>,
    pub word_dict: WordDict,
}

impl LanguageResources {
    /// Read `<resources>/<language>/stopwords.txt` and `word_dict.json`.
    pub fn load(resources_dir: &Path, language: &str) -> Result<Self> {
        let language_dir = resources_dir.join(language);
        if !language_dir.is_dir() {
            return Err(Error::NotFound(format!(
                "no resources for language '{language}' in {}",
                resources_dir.display()
            )));
        }
        let stopwords_path = language_dir.join(STOPWORDS_FILE);
        info!(path = %stopwords_path.display(), "loading the stopwords");
        let stopwords = fs::read_to_string(&stopwords_path)
            .map_err(|e| Error::NotFound(format!("{}: {e}", stopwords_path.display())))?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        let word_dict = WordDict::load(word_dict_path(resources_dir, language))?;
        Ok(Self {
            language: language.to_string(),
            stopwords,
            word_dict,
        })
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.stopwords.clone(), &self.word_dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_stopwords_and_dictionary() {
        let dir = tempfile::tempdir().unwrap();
        let fr = dir.path().join("fr");
        fs::create_dir_all(&fr).unwrap();
        fs::write(fr.join(STOPWORDS_FILE), "defaut\npanne\n\nsuite\n").unwrap();
        fs::write(fr.join("word_dict.json"), r#"{"abaisser": ["abaiser"]}"#).unwrap();

        let res = LanguageResources::load(dir.path(), "fr").unwrap();
        assert_eq!(res.stopwords.len(), 3);
        assert!(res.stopwords.contains("panne"));
        assert!(res.word_dict.contains("abaisser"));
    }

    #[test]
    fn unknown_language_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            LanguageResources::load(dir.path(), "de"),
            Err(Error::NotFound(_))
        ));
    }
}
