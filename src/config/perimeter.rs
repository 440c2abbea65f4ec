use std::{fs, path::Path};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

pub const PERIMETER_FILE: &str = "perimeter.json";

/// Shops and sites served for one language.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LanguagePerimeter {
    #[serde(default)]
    pub shops: Vec<String>,
    /// site code -> site name
    #[serde(default)]
    pub sites: IndexMap<String, String>,
}

/// Industrialisation perimeter: which languages, shops and sites are served.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Perimeter {
    pub indus_perimeter: IndexMap<String, LanguagePerimeter>,
    /// report columns printed for every search result
    #[serde(default)]
    pub diaman_search_cols: Vec<String>,
}

impl Perimeter {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading the perimeter");
        let raw = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read perimeter {}: {e}", path.display()))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn language(&self, language: &str) -> Result<&LanguagePerimeter> {
        self.indus_perimeter
            .get(language)
            .ok_or_else(|| Error::not_found_among("language", language, self.indus_perimeter.keys()))
    }

    /// Languages with at least one shop.
    pub fn indus_languages(&self) -> Vec<&str> {
        self.indus_perimeter
            .iter()
            .filter(|(_, p)| !p.shops.is_empty())
            .map(|(l, _)| l.as_str())
            .collect()
    }

    pub fn shops(&self, language: &str) -> Result<&[String]> {
        Ok(&self.language(language)?.shops)
    }

    pub fn sites(&self, language: &str) -> Result<Vec<&str>> {
        Ok(self.language(language)?.sites.keys().map(String::as_str).collect())
    }

    /// Every site of every language.
    pub fn all_sites(&self) -> Vec<&str> {
        self.indus_perimeter
            .values()
            .flat_map(|p| p.sites.keys().map(String::as_str))
            .collect()
    }

    pub fn language_of_site(&self, code_site: &str) -> Result<&str> {
        self.indus_perimeter
            .iter()
            .find(|(_, p)| p.sites.contains_key(code_site))
            .map(|(l, _)| l.as_str())
            .ok_or_else(|| Error::not_found_among("site", code_site, self.all_sites()))
    }

    /// Perimeter spelling of `shop` for the language, matched case-insensitively.
    pub fn ensure_shop(&self, language: &str, shop: &str) -> Result<&str> {
        let shops = self.shops(language)?;
        shops
            .iter()
            .find(|s| s.eq_ignore_ascii_case(shop))
            .map(String::as_str)
            .ok_or_else(|| Error::not_found_among("shop", shop, shops))
    }

    /// Language and shop serving a search made from `code_site`.
    pub fn resolve_search(&self, code_site: &str, code_shop: &str) -> Result<(&str, &str)> {
        let code_site = code_site.to_uppercase();
        let language = self.language_of_site(&code_site)?;
        let indus = self.indus_languages();
        if !indus.contains(&language) {
            return Err(Error::not_found_among("language", language, indus));
        }
        let shop = self.ensure_shop(language, code_shop)?;
        Ok((language, shop))
    }
}
