//! Colorway extraction and relaxed colorway equality.

use batdb_core::{Lexicon, RawListing};
use regex::Regex;

/// Extract a normalized colorway key for a listing.
///
/// Precedence: special-edition keywords in the title win outright; then
/// known two-tone color pairs collapse to `"standard"`; then the structured
/// color attribute, normalized through the standard-color set; finally
/// `"standard"` when nothing matches at all.
#[must_use]
pub fn extract_colorway(listing: &RawListing, lexicon: &Lexicon) -> String {
    let title_lower = listing.title.to_lowercase();

    for edition in &lexicon.special_editions {
        if title_lower.contains(edition.as_str()) {
            return edition.clone();
        }
    }

    // "Black/White", "red-blue", "Black | Silver" and friends are plain
    // two-tone paint jobs, not distinct product lines. Matte, camo, fade,
    // and burst finishes paired with any color collapse the same way.
    let two_tone = two_tone_pattern();
    if two_tone.is_match(&listing.title) {
        return "standard".to_string();
    }

    if let Some(color) = listing.attribute("color_name") {
        let trimmed = color.trim();
        let lower = trimmed.to_lowercase();
        if lower.is_empty() || two_tone.is_match(trimmed) || lexicon.is_standard_color(&lower) {
            return "standard".to_string();
        }
        return lower;
    }

    "standard".to_string()
}

fn two_tone_pattern() -> Regex {
    const COLORS: &str =
        "black|white|red|blue|green|yellow|orange|gray|grey|navy|royal|maroon|purple|silver|gold";
    Regex::new(&format!(
        r"(?i)\b(?:{COLORS})\s*[/|-]\s*(?:{COLORS})\b|\bmatte\s*\|\s*\w+|\w+\s*\|\s*(?:camo|fade|burst)\b"
    ))
    .expect("valid regex")
}

/// Relaxed colorway equality: exact match, or both sides belong to the
/// standard-color set. Two "ordinary" colors count as the same colorway so
/// that plain paint variants do not fragment a model's variant family.
#[must_use]
pub fn colorways_match(a: &str, b: &str, lexicon: &Lexicon) -> bool {
    if a.eq_ignore_ascii_case(b) {
        return true;
    }
    lexicon.is_standard_color(a) && lexicon.is_standard_color(b)
}
