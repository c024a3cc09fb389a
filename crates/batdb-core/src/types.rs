//! Shared domain types for the bat price pipeline.
//!
//! String forms of lengths, weights, and drops deliberately preserve the
//! display units seen on retailer pages (`31"`, `23 oz`, `-8`) so the UI can
//! render them verbatim. Numeric forms exist only transiently inside the
//! matcher.

use serde::{Deserialize, Serialize};

/// Bat performance-certification standard.
///
/// Each standard implies a different legal drop range: BBCOR is always −3,
/// USSSA and USA Baseball bats come in −5 through −12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Certification {
    #[serde(rename = "BBCOR")]
    Bbcor,
    #[serde(rename = "USSSA")]
    Usssa,
    #[serde(rename = "USA Baseball")]
    UsaBaseball,
}

impl Certification {
    /// Matches a certification keyword inside pre-lowercased text.
    ///
    /// Recognizes `bbcor`, `usssa`, `usa baseball`, and the `usab`
    /// abbreviation. A drop-3 marker (`(-3)` or `drop 3`) also implies
    /// BBCOR, since only BBCOR bats carry that drop. Returns `None` when
    /// nothing matches; callers apply the BBCOR default themselves so the
    /// fallback stays visible at the call site.
    #[must_use]
    pub fn from_keywords(lower: &str) -> Option<Self> {
        if lower.contains("bbcor") {
            Some(Self::Bbcor)
        } else if lower.contains("usssa") {
            Some(Self::Usssa)
        } else if lower.contains("usa baseball") || lower.contains("usab") {
            Some(Self::UsaBaseball)
        } else if lower.contains("(-3)") || lower.contains("drop 3") {
            Some(Self::Bbcor)
        } else {
            None
        }
    }

    /// The drop assumed for this certification when a size string carries a
    /// length but no weight or drop. Only BBCOR has a fixed drop (−3).
    #[must_use]
    pub fn assumed_drop(self) -> Option<i32> {
        match self {
            Self::Bbcor => Some(-3),
            Self::Usssa | Self::UsaBaseball => None,
        }
    }

    /// Parses the stored database string form (`"BBCOR"` etc.).
    #[must_use]
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "BBCOR" => Some(Self::Bbcor),
            "USSSA" => Some(Self::Usssa),
            "USA Baseball" => Some(Self::UsaBaseball),
            _ => None,
        }
    }
}

impl std::fmt::Display for Certification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Certification::Bbcor => write!(f, "BBCOR"),
            Certification::Usssa => write!(f, "USSSA"),
            Certification::UsaBaseball => write!(f, "USA Baseball"),
        }
    }
}

/// A single name/value pair from a retailer's structured variation data
/// (e.g. `size_name = "31\" (-8)"`, `color_name = "Pool Party"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingAttribute {
    pub name: String,
    pub value: String,
}

/// A raw product listing from any retailer source, before extraction.
///
/// Both the API source (attribute-based) and the page-scraping source
/// (free-text size strings) funnel into this shape; the matcher never sees
/// retailer-specific response types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawListing {
    /// Retailer-scoped identifier (ASIN for the API source).
    pub id: String,
    pub title: String,
    /// Free-text feature bullets, when the source provides them.
    pub features: Vec<String>,
    /// Listing price in dollars, if the source exposed one.
    pub price: Option<f64>,
    pub in_stock: bool,
    pub variation_attributes: Vec<ListingAttribute>,
    pub url: Option<String>,
}

impl RawListing {
    /// Looks up a variation attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.variation_attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Title and feature text joined for keyword scanning, lowercased.
    #[must_use]
    pub fn search_text(&self) -> String {
        let mut text = self.title.clone();
        for feature in &self.features {
            text.push(' ');
            text.push_str(feature);
        }
        text.to_lowercase()
    }
}

/// A length/weight/drop combination in display form.
///
/// `weight` is `None` only when a USSSA drop-ratio attribute was present
/// without a resolvable length; everywhere else weight is derived as
/// `length − |drop|` and stored for display fidelity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeSpec {
    /// Length with unit mark, e.g. `31"`.
    pub length: String,
    /// Weight with unit, e.g. `23 oz`.
    pub weight: Option<String>,
    /// Signed drop as a string, e.g. `-8`.
    pub drop: String,
}

impl SizeSpec {
    /// Builds a `SizeSpec` from numeric measurements, deriving the weight
    /// from length − |drop| when it was not stated explicitly.
    #[must_use]
    pub fn from_measurements(length_in: f64, weight_oz: Option<f64>, drop: i32) -> Self {
        let weight = weight_oz.unwrap_or(length_in - f64::from(drop.abs()));
        Self {
            length: format!("{}\"", format_inches(length_in)),
            weight: Some(format!("{} oz", format_inches(weight))),
            drop: drop.to_string(),
        }
    }
}

impl std::fmt::Display for SizeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.weight {
            Some(w) => write!(f, "{} {} ({})", self.length, w, self.drop),
            None => write!(f, "{} ({})", self.length, self.drop),
        }
    }
}

/// Formats a measurement without a trailing `.0` (`31` not `31.0`, but
/// `31.5` stays `31.5`).
fn format_inches(value: f64) -> String {
    if (value - value.trunc()).abs() < f64::EPSILON {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Structured fields extracted from one raw listing.
///
/// `year`, `certification`, and `material` are `None` when the listing text
/// never stated them. Callers that need a concrete value apply the catalog
/// defaults through the accessors; the match scorer deliberately does not,
/// so absent fields never contribute to a score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatInfo {
    pub brand: String,
    pub series: String,
    pub year: Option<i32>,
    pub certification: Option<Certification>,
    pub material: Option<String>,
    pub construction: String,
    pub barrel_size: String,
    pub colorway: String,
    pub sizes: Vec<SizeSpec>,
    /// Keyword-density relevance heuristic, 0–100.
    pub relevance: u32,
}

impl BatInfo {
    /// Certification with the catalog default (BBCOR, the most common
    /// certification) applied.
    #[must_use]
    pub fn certification_or_default(&self) -> Certification {
        self.certification.unwrap_or(Certification::Bbcor)
    }

    /// Year with the reference-year default applied. May mis-tag reissued
    /// older stock; listings carry no version field to disambiguate.
    #[must_use]
    pub fn year_or(&self, reference_year: i32) -> i32 {
        self.year.unwrap_or(reference_year)
    }
}

/// The identity fields of a canonical catalog model, projected for scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelIdentity {
    pub brand: String,
    pub series: String,
    pub year: i32,
    pub certification: Certification,
    pub material: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certification_display_round_trips_db_form() {
        for cert in [
            Certification::Bbcor,
            Certification::Usssa,
            Certification::UsaBaseball,
        ] {
            assert_eq!(Certification::from_db_str(&cert.to_string()), Some(cert));
        }
    }

    #[test]
    fn certification_keyword_match() {
        assert_eq!(
            Certification::from_keywords("2024 demarini voodoo bbcor bat"),
            Some(Certification::Bbcor)
        );
        assert_eq!(
            Certification::from_keywords("easton adv usab youth"),
            Some(Certification::UsaBaseball)
        );
        assert_eq!(Certification::from_keywords("wood bat"), None);
    }

    #[test]
    fn certification_inferred_from_drop_three() {
        assert_eq!(
            Certification::from_keywords("demarini voodoo baseball bat (-3)"),
            Some(Certification::Bbcor)
        );
        assert_eq!(
            Certification::from_keywords("marucci cat x drop 3 alloy"),
            Some(Certification::Bbcor)
        );
        // Explicit keywords still win over a stray drop marker.
        assert_eq!(
            Certification::from_keywords("easton ghost usssa (-10)"),
            Some(Certification::Usssa)
        );
    }

    #[test]
    fn assumed_drop_only_for_bbcor() {
        assert_eq!(Certification::Bbcor.assumed_drop(), Some(-3));
        assert_eq!(Certification::Usssa.assumed_drop(), None);
    }

    #[test]
    fn size_spec_derives_weight_from_drop() {
        let size = SizeSpec::from_measurements(31.0, None, -8);
        assert_eq!(size.length, "31\"");
        assert_eq!(size.weight.as_deref(), Some("23 oz"));
        assert_eq!(size.drop, "-8");
    }

    #[test]
    fn size_spec_keeps_explicit_weight() {
        let size = SizeSpec::from_measurements(29.0, Some(26.0), -3);
        assert_eq!(size.weight.as_deref(), Some("26 oz"));
    }

    #[test]
    fn size_spec_fractional_length_preserved() {
        let size = SizeSpec::from_measurements(31.5, None, -10);
        assert_eq!(size.length, "31.5\"");
        assert_eq!(size.weight.as_deref(), Some("21.5 oz"));
    }

    #[test]
    fn listing_attribute_lookup() {
        let listing = RawListing {
            id: "B0TEST".to_string(),
            title: "Test Bat".to_string(),
            features: vec![],
            price: None,
            in_stock: true,
            variation_attributes: vec![ListingAttribute {
                name: "color_name".to_string(),
                value: "Pool Party".to_string(),
            }],
            url: None,
        };
        assert_eq!(listing.attribute("color_name"), Some("Pool Party"));
        assert_eq!(listing.attribute("size_name"), None);
    }
}
