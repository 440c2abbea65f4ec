use std::path::Path;

use tracing::info;

use crate::{
    config::AppConfig,
    error::Result,
    text::{word_dict::word_dict_path, WordDict},
};

/// Merge the words of `new_words` (same JSON layout as the dictionary) into
/// the dictionary of `language` and save it. Returns the number of new
/// canonical words.
pub fn enrich_word_dict(config: &AppConfig, language: &str, new_words: &Path) -> Result<usize> {
    let path = word_dict_path(&config.resources_dir, language);
    info!(path = %path.display(), "loading word dictionary");
    let mut word_dict = WordDict::load(&path)?;

    info!(path = %new_words.display(), "enriching the word dictionary");
    let new = WordDict::load(new_words)?;
    let added = word_dict.enrich(&new);
    word_dict.save(&path)?;

    info!(added, total = word_dict.len(), "new words added in the dictionary");
    Ok(added)
}
