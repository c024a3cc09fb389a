//! Best-effort extraction of structured bat fields from listing text.
//!
//! Extraction is total: every sub-extractor yields a neutral value on
//! failure, and malformed input never surfaces as an error. Fields the text
//! does not state come back as `None` so the scorer can ignore them.

use batdb_core::{BatInfo, Certification, Lexicon, RawListing};
use regex::Regex;

use crate::colorway::extract_colorway;
use crate::sizes::sizes_from_listing;

/// Extracts [`BatInfo`] records from raw listings.
///
/// Holds the keyword tables and the reference year (used only as the year
/// default by callers, via [`BatInfo::year_or`]); construct once per run.
#[derive(Debug, Clone)]
pub struct Extractor {
    lexicon: Lexicon,
    reference_year: i32,
}

impl Extractor {
    #[must_use]
    pub fn new(lexicon: Lexicon, reference_year: i32) -> Self {
        Self {
            lexicon,
            reference_year,
        }
    }

    #[must_use]
    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    #[must_use]
    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Extract every structured field from one listing.
    #[must_use]
    pub fn extract(&self, listing: &RawListing) -> BatInfo {
        let text = listing.search_text();

        let brand = self.extract_brand(&listing.title, &text);
        let series = self.extract_series(&listing.title, &text);
        let year = extract_year(&text);
        let certification = Certification::from_keywords(&text);
        let material = extract_material(&text);
        let construction = extract_construction(&text);
        let barrel_size = extract_barrel_size(&text);
        let colorway = extract_colorway(listing, &self.lexicon);

        let assumed_drop = certification
            .unwrap_or(Certification::Bbcor)
            .assumed_drop();
        let sizes = sizes_from_listing(listing, assumed_drop);

        let relevance =
            relevance_score(&self.lexicon, &text, &listing.title, listing.features.len());

        BatInfo {
            brand,
            series,
            year,
            certification,
            material,
            construction,
            barrel_size,
            colorway,
            sizes,
            relevance,
        }
    }

    fn extract_brand(&self, title: &str, text: &str) -> String {
        if let Some(brand) = self.lexicon.match_brand(text) {
            return brand.to_string();
        }

        // An unlisted brand usually leads the title.
        let first = title.split_whitespace().next().unwrap_or_default();
        if first.len() > 3 && first.chars().next().is_some_and(char::is_uppercase) {
            return first.to_string();
        }

        "Unknown".to_string()
    }

    fn extract_series(&self, title: &str, text: &str) -> String {
        if !self.lexicon.series_keywords.is_empty() {
            let pattern = self
                .lexicon
                .series_keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            let re = Regex::new(&format!(r"(?i)\b({pattern})\b")).expect("valid regex");
            if let Some(found) = re.find(text) {
                return self
                    .lexicon
                    .series_keywords
                    .iter()
                    .find(|k| k.eq_ignore_ascii_case(found.as_str()))
                    .cloned()
                    .unwrap_or_else(|| found.as_str().to_string());
            }
        }

        // Capitalized word(s) right before a certification token.
        let re = Regex::new(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)\s+(?:BBCOR|USSSA|USA)")
            .expect("valid regex");
        if let Some(cap) = re.captures(title) {
            return cap[1].to_string();
        }

        // Last resort: first meaningful token after the leading brand word.
        for word in title.split_whitespace().skip(1) {
            if word.len() > 3
                && !word.chars().all(|c| c.is_ascii_digit())
                && !matches!(
                    word.to_lowercase().as_str(),
                    "baseball" | "bat" | "inch" | "adult" | "youth"
                )
            {
                return word.to_string();
            }
        }

        "Unknown".to_string()
    }
}

/// First 4-digit token in the plausible model-year window.
fn extract_year(text: &str) -> Option<i32> {
    let re = Regex::new(r"\b20(?:2\d|3\d)\b").expect("valid regex");
    re.find(text).and_then(|m| m.as_str().parse().ok())
}

fn extract_material(text: &str) -> Option<String> {
    if text.contains("composite") {
        Some("Composite".to_string())
    } else if text.contains("alloy") || text.contains("aluminum") {
        Some("Alloy".to_string())
    } else if text.contains("hybrid") {
        Some("Hybrid".to_string())
    } else if text.contains("wood") {
        Some("Wood".to_string())
    } else {
        None
    }
}

fn extract_construction(text: &str) -> String {
    if text.contains("two piece") || text.contains("two-piece") || text.contains("2-piece") {
        "2-Piece".to_string()
    } else if text.contains("three piece") || text.contains("3-piece") {
        "3-Piece".to_string()
    } else {
        // One-piece is the most common construction.
        "1-Piece".to_string()
    }
}

fn extract_barrel_size(text: &str) -> String {
    let fraction = Regex::new(r"2\s*(1/4|5/8|3/4)").expect("valid regex");
    if let Some(cap) = fraction.captures(text) {
        return format!("2 {}\"", &cap[1]);
    }

    let decimal = Regex::new(r#"(\d(?:\.\d+)?)\s*(?:inch|["'])\s*barrel"#).expect("valid regex");
    if let Some(cap) = decimal.captures(text) {
        return format!("{}\"", &cap[1]);
    }

    // BBCOR standard barrel.
    "2 5/8\"".to_string()
}

/// Keyword-density heuristic over bat indicators, capped at 100.
fn relevance_score(lexicon: &Lexicon, text: &str, title: &str, feature_count: usize) -> u32 {
    let mut score = 0;

    if text.contains("baseball bat") {
        score += 20;
    }
    if Certification::from_keywords(text).is_some() {
        score += 15;
    }
    if text.contains("composite") || text.contains("alloy") {
        score += 10;
    }
    if text.contains("drop") || text.contains("(-") {
        score += 10;
    }
    if lexicon.match_brand(text).is_some() {
        score += 25;
    }
    if (21..150).contains(&title.len()) {
        score += 10;
    }
    if feature_count > 2 {
        score += 5;
    }

    score.min(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use batdb_core::ListingAttribute;

    fn listing(title: &str) -> RawListing {
        RawListing {
            id: "B0TEST".to_string(),
            title: title.to_string(),
            features: vec![],
            price: None,
            in_stock: true,
            variation_attributes: vec![],
            url: None,
        }
    }

    fn extractor() -> Extractor {
        Extractor::new(Lexicon::default(), 2024)
    }

    #[test]
    fn extracts_full_identity() {
        let info = extractor().extract(&listing("2024 DeMarini Voodoo BBCOR baseball bat"));
        assert_eq!(info.brand, "DeMarini");
        assert_eq!(info.series, "Voodoo");
        assert_eq!(info.year, Some(2024));
        assert_eq!(info.certification, Some(Certification::Bbcor));
    }

    #[test]
    fn unlisted_brand_falls_back_to_leading_word() {
        let info = extractor().extract(&listing("Mizuno Hot Metal 2023 BBCOR baseball bat"));
        assert_eq!(info.brand, "Mizuno");
        assert_eq!(info.year, Some(2023));
    }

    #[test]
    fn series_from_capitalized_words_before_certification() {
        let info = extractor().extract(&listing("Mizuno Hot Metal BBCOR baseball bat"));
        assert_eq!(info.series, "Hot Metal");
    }

    #[test]
    fn absent_fields_are_none() {
        let info = extractor().extract(&listing("Easton youth bat"));
        assert_eq!(info.year, None);
        assert_eq!(info.certification, None);
        assert_eq!(info.material, None);
        assert_eq!(info.certification_or_default(), Certification::Bbcor);
        assert_eq!(info.year_or(2024), 2024);
    }

    #[test]
    fn material_and_construction_keywords() {
        let info = extractor().extract(&listing(
            "Easton ADV 360 Two-Piece Composite USSSA baseball bat",
        ));
        assert_eq!(info.material.as_deref(), Some("Composite"));
        assert_eq!(info.construction, "2-Piece");
        assert_eq!(info.certification, Some(Certification::Usssa));
    }

    #[test]
    fn aluminum_counts_as_alloy() {
        let info = extractor().extract(&listing("Rawlings 5150 aluminum BBCOR bat"));
        assert_eq!(info.material.as_deref(), Some("Alloy"));
    }

    #[test]
    fn barrel_size_fraction() {
        let info = extractor().extract(&listing("Marucci CAT X 2 3/4 Barrel USSSA bat"));
        assert_eq!(info.barrel_size, "2 3/4\"");
        let info = extractor().extract(&listing("Marucci CAT X USSSA bat"));
        assert_eq!(info.barrel_size, "2 5/8\"");
    }

    #[test]
    fn bbcor_default_drives_assumed_drop_for_sizes() {
        let info = extractor().extract(&listing("2024 DeMarini Voodoo BBCOR baseball bat 32 Inch"));
        assert_eq!(info.sizes.len(), 1);
        assert_eq!(info.sizes[0].drop, "-3");
        assert_eq!(info.sizes[0].weight.as_deref(), Some("29 oz"));
    }

    #[test]
    fn structured_attributes_used_for_sizes() {
        let mut l = listing("Easton Ghost USSSA baseball bat");
        l.variation_attributes = vec![
            ListingAttribute {
                name: "bat_drop_ratio".to_string(),
                value: "-10".to_string(),
            },
            ListingAttribute {
                name: "item_length_numeric".to_string(),
                value: "30".to_string(),
            },
        ];
        let info = extractor().extract(&l);
        assert_eq!(info.sizes.len(), 1);
        assert_eq!(info.sizes[0].length, "30\"");
        assert_eq!(info.sizes[0].drop, "-10");
    }

    #[test]
    fn relevance_rewards_dense_listings() {
        let mut l = listing("2024 Easton Alloy BBCOR baseball bat drop 3");
        l.features = vec![
            "BBCOR certified".to_string(),
            "Alloy barrel".to_string(),
            "One-piece".to_string(),
        ];
        let info = extractor().extract(&l);
        assert!(info.relevance >= 80, "relevance {}", info.relevance);

        let sparse = extractor().extract(&listing("Gloves"));
        assert!(sparse.relevance < 30, "relevance {}", sparse.relevance);
    }

    #[test]
    fn extraction_never_panics_on_garbage() {
        for title in ["", "!!!", "99999999", "\u{1F5FF}"] {
            let info = extractor().extract(&listing(title));
            assert_eq!(info.brand, "Unknown");
            assert_eq!(info.series, "Unknown");
        }
    }
}
