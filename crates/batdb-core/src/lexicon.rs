//! Keyword lookup tables used by the text extractor and colorway grouper.
//!
//! The tables are immutable after construction and injected into the
//! extractor rather than read from module state. [`Lexicon::default`]
//! carries the built-in tables; [`load_lexicon`] replaces them from a YAML
//! file for catalogs that stock brands outside the defaults.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    /// Lowercased brand keyword → canonical display name. Ordered: multi-word
    /// keys ("louisville slugger") must precede any key they contain.
    pub brands: Vec<BrandEntry>,
    /// Known series/model names matched case-insensitively as whole words.
    pub series_keywords: Vec<String>,
    /// Special-edition colorway names, checked before any color normalization.
    /// Ordered; the first match wins.
    pub special_editions: Vec<String>,
    /// Plain color names that collapse to the `"standard"` colorway bucket.
    /// Stored lowercased.
    pub standard_colors: HashSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandEntry {
    /// Lowercased keyword searched for in listing text.
    pub keyword: String,
    /// Canonical display casing stored in the catalog.
    pub canonical: String,
}

impl Lexicon {
    /// Canonical brand name for a pre-lowercased text blob, if any brand
    /// keyword appears in it.
    #[must_use]
    pub fn match_brand(&self, lower: &str) -> Option<&str> {
        self.brands
            .iter()
            .find(|b| lower.contains(b.keyword.as_str()))
            .map(|b| b.canonical.as_str())
    }

    /// Whether `color` (any casing) belongs to the standard-color set.
    #[must_use]
    pub fn is_standard_color(&self, color: &str) -> bool {
        self.standard_colors.contains(&color.to_lowercase())
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        let brands = [
            ("louisville slugger", "Louisville Slugger"),
            ("easton", "Easton"),
            ("rawlings", "Rawlings"),
            ("demarini", "DeMarini"),
            ("marucci", "Marucci"),
            ("victus", "Victus"),
            ("combat", "Combat"),
            ("wilson", "Wilson"),
        ]
        .into_iter()
        .map(|(keyword, canonical)| BrandEntry {
            keyword: keyword.to_string(),
            canonical: canonical.to_string(),
        })
        .collect();

        let series_keywords = [
            "Atlas",
            "Meta",
            "Ghost",
            "Voodoo",
            "Velo",
            "CAT",
            "Beast",
            "Select",
            "Omaha",
            "Prime",
            "Big Barrel",
            "PowerDrive",
            "5150",
            "Threat",
            "Nox",
            "ADV",
            "Dude Perfect",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        let special_editions = [
            "pool party",
            "fire ice",
            "blackout",
            "whiteout",
            "stealth",
            "glow",
            "electric",
            "neon",
            "ghost",
            "platinum",
            "gold",
            "silver",
            "cosmic",
            "galaxy",
            "vapor",
            "phantom",
            "carbon",
            "chrome",
            "flame",
            "ice",
            "storm",
            "thunder",
            "lightning",
            "sunset",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        let standard_colors = [
            "orange", "black", "white", "red", "blue", "green", "yellow", "gray", "grey",
            "silver", "natural", "standard", "default", "primary", "navy", "royal", "maroon",
            "purple", "gold", "brown", "pink",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        Self {
            brands,
            series_keywords,
            special_editions,
            standard_colors,
        }
    }
}

/// Load and validate a lexicon override from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_lexicon(path: &Path) -> Result<Lexicon, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let lexicon: Lexicon = serde_yaml::from_str(&content)?;
    validate_lexicon(&lexicon)?;
    Ok(lexicon)
}

fn validate_lexicon(lexicon: &Lexicon) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for brand in &lexicon.brands {
        if brand.keyword.trim().is_empty() || brand.canonical.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand keyword and canonical name must be non-empty".to_string(),
            ));
        }
        if brand.keyword != brand.keyword.to_lowercase() {
            return Err(ConfigError::Validation(format!(
                "brand keyword '{}' must be lowercase",
                brand.keyword
            )));
        }
        if !seen.insert(brand.keyword.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand keyword: '{}'",
                brand.keyword
            )));
        }
    }

    if lexicon.standard_colors.is_empty() {
        return Err(ConfigError::Validation(
            "standard_colors must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lexicon_matches_known_brands() {
        let lexicon = Lexicon::default();
        assert_eq!(
            lexicon.match_brand("2024 demarini voodoo bbcor"),
            Some("DeMarini")
        );
        assert_eq!(
            lexicon.match_brand("louisville slugger atlas"),
            Some("Louisville Slugger")
        );
        assert_eq!(lexicon.match_brand("acme corp bat"), None);
    }

    #[test]
    fn standard_color_membership_is_case_insensitive() {
        let lexicon = Lexicon::default();
        assert!(lexicon.is_standard_color("Black"));
        assert!(lexicon.is_standard_color("navy"));
        assert!(!lexicon.is_standard_color("pool party"));
    }

    #[test]
    fn validate_rejects_uppercase_keyword() {
        let mut lexicon = Lexicon::default();
        lexicon.brands.push(BrandEntry {
            keyword: "Mizuno".to_string(),
            canonical: "Mizuno".to_string(),
        });
        let err = validate_lexicon(&lexicon).unwrap_err();
        assert!(err.to_string().contains("lowercase"));
    }

    #[test]
    fn validate_rejects_duplicate_keyword() {
        let mut lexicon = Lexicon::default();
        lexicon.brands.push(BrandEntry {
            keyword: "easton".to_string(),
            canonical: "Easton Again".to_string(),
        });
        let err = validate_lexicon(&lexicon).unwrap_err();
        assert!(err.to_string().contains("duplicate brand keyword"));
    }

    #[test]
    fn validate_accepts_default_tables() {
        assert!(validate_lexicon(&Lexicon::default()).is_ok());
    }
}
