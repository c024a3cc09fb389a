//! Size-string parsing: turning retailer size text into length/weight/drop.
//!
//! Retailers render the same variant a dozen ways: `30"/27 oz`, `28" 18 OZ`,
//! `31" (-8)`, `33' | -3`, `2 5/8" Barrel | 33" | -3`, `31 Inch`, `34/31 |`.
//! Parsing runs an ordered list of pure strategies and takes the first hit,
//! then bounds-checks the result against plausible bat dimensions. The
//! bounds check is the primary defense against misparsed text.

use batdb_core::{RawListing, SizeSpec};
use regex::Regex;

const MIN_LENGTH_IN: f64 = 24.0;
const MAX_LENGTH_IN: f64 = 36.0;
const MIN_WEIGHT_OZ: f64 = 15.0;
const MAX_WEIGHT_OZ: f64 = 35.0;

/// A partially resolved size: length is always present, weight and drop are
/// filled in from each other (or from an assumed drop) during resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ParsedSize {
    length: f64,
    weight: Option<f64>,
    drop: Option<i32>,
}

/// Parse one size string into a [`SizeSpec`].
///
/// `assumed_drop` covers certifications with a fixed drop (BBCOR is always
/// −3): a bare-length string like `31 Inch` resolves only when an assumed
/// drop is available. Returns `None` for unparseable text or measurements
/// outside plausible bat dimensions.
#[must_use]
pub fn parse_size_text(text: &str, assumed_drop: Option<i32>) -> Option<SizeSpec> {
    let strategies: [fn(&str) -> Option<ParsedSize>; 6] = [
        length_slash_weight,
        length_then_weight,
        length_paren_drop,
        length_pipe_drop,
        bare_length_slash_weight,
        bare_length,
    ];

    let parsed = strategies.iter().find_map(|s| s(text))?;
    resolve(parsed, assumed_drop)
}

/// Extract every distinct size from a listing.
///
/// Structured variation attributes win over free text: a drop-ratio
/// attribute plus a numeric length is exact, where title text is a guess.
/// Falls back to scanning the title and each feature bullet.
#[must_use]
pub fn sizes_from_listing(listing: &RawListing, assumed_drop: Option<i32>) -> Vec<SizeSpec> {
    let mut sizes = Vec::new();

    if let Some(size) = size_from_attributes(listing, assumed_drop) {
        push_unique(&mut sizes, size);
        return sizes;
    }

    if let Some(size) = parse_size_text(&listing.title, assumed_drop) {
        push_unique(&mut sizes, size);
    }
    for feature in &listing.features {
        if let Some(size) = parse_size_text(feature, assumed_drop) {
            push_unique(&mut sizes, size);
        }
    }

    if sizes.is_empty() {
        tracing::debug!(listing_id = %listing.id, "no size variants parsed from listing");
    }
    sizes
}

fn push_unique(sizes: &mut Vec<SizeSpec>, size: SizeSpec) {
    if !sizes
        .iter()
        .any(|s| s.length == size.length && s.drop == size.drop)
    {
        sizes.push(size);
    }
}

fn size_from_attributes(listing: &RawListing, assumed_drop: Option<i32>) -> Option<SizeSpec> {
    let drop = listing
        .attribute("bat_drop_ratio")
        .and_then(|v| v.trim().parse::<i32>().ok())
        .filter(|d| (-15..0).contains(d));
    let length = listing
        .attribute("item_length_numeric")
        .and_then(|v| v.trim().parse::<f64>().ok());

    match (length, drop) {
        (Some(length), Some(drop)) => resolve(
            ParsedSize {
                length,
                weight: None,
                drop: Some(drop),
            },
            assumed_drop,
        ),
        _ => {
            let size_name = listing.attribute("size_name")?;
            // A drop-ratio attribute beats whatever the size label implies.
            let parsed = parse_size_text(size_name, drop.or(assumed_drop))?;
            Some(parsed)
        }
    }
}

fn resolve(parsed: ParsedSize, assumed_drop: Option<i32>) -> Option<SizeSpec> {
    #[allow(clippy::cast_possible_truncation)]
    let drop = parsed
        .drop
        .or_else(|| {
            parsed
                .weight
                .map(|w| -((parsed.length - w).round() as i32))
        })
        .or(assumed_drop)?;
    if !(-15..0).contains(&drop) {
        return None;
    }

    let weight = parsed
        .weight
        .unwrap_or(parsed.length - f64::from(drop.abs()));
    if !(MIN_LENGTH_IN..=MAX_LENGTH_IN).contains(&parsed.length)
        || !(MIN_WEIGHT_OZ..=MAX_WEIGHT_OZ).contains(&weight)
    {
        return None;
    }

    Some(SizeSpec::from_measurements(parsed.length, parsed.weight, drop))
}

// ---------------------------------------------------------------------------
// Parsing strategies, tried in order
// ---------------------------------------------------------------------------

/// `30"/27 oz`, `32in/29oz`
fn length_slash_weight(text: &str) -> Option<ParsedSize> {
    let re = Regex::new(r#"(?i)(\d{2}(?:\.\d+)?)\s*(?:["']|in(?:ch(?:es)?)?\.?)?\s*/\s*(\d{2}(?:\.\d+)?)\s*oz"#)
        .expect("valid regex");
    let cap = re.captures(text)?;
    Some(ParsedSize {
        length: cap[1].parse().ok()?,
        weight: Some(cap[2].parse().ok()?),
        drop: None,
    })
}

/// `28" 18 OZ`, `29" 26 oz.`
fn length_then_weight(text: &str) -> Option<ParsedSize> {
    let re = Regex::new(
        r#"(?i)(\d{2}(?:\.\d+)?)\s*(?:["']|-?\s*in(?:ch(?:es)?)?\.?)\s+(\d{2}(?:\.\d+)?)\s*oz"#,
    )
    .expect("valid regex");
    let cap = re.captures(text)?;
    Some(ParsedSize {
        length: cap[1].parse().ok()?,
        weight: Some(cap[2].parse().ok()?),
        drop: None,
    })
}

/// `31" (-8)`
fn length_paren_drop(text: &str) -> Option<ParsedSize> {
    let re = Regex::new(
        r#"(?i)(\d{2}(?:\.\d+)?)\s*(?:["']|-?\s*in(?:ch(?:es)?)?\.?)?\s*\(\s*(-\d{1,2})\s*\)"#,
    )
    .expect("valid regex");
    let cap = re.captures(text)?;
    Some(ParsedSize {
        length: cap[1].parse().ok()?,
        weight: None,
        drop: Some(cap[2].parse().ok()?),
    })
}

/// `33' | -3`, `33-inch | -3`, and the length/drop tail of
/// `2 5/8" Barrel | 33" | -3` (the two-digit length requirement skips the
/// barrel fraction).
fn length_pipe_drop(text: &str) -> Option<ParsedSize> {
    let re = Regex::new(
        r#"(?i)(\d{2}(?:\.\d+)?)\s*(?:["']|-?\s*in(?:ch(?:es)?)?\.?)?\s*\|\s*(-\d{1,2})\b"#,
    )
    .expect("valid regex");
    let cap = re.captures(text)?;
    Some(ParsedSize {
        length: cap[1].parse().ok()?,
        weight: None,
        drop: Some(cap[2].parse().ok()?),
    })
}

/// `34/31 |` — length/weight with no units, only seen followed by a pipe.
fn bare_length_slash_weight(text: &str) -> Option<ParsedSize> {
    let re = Regex::new(r"\b(\d{2})\s*/\s*(\d{2})\s*\|").expect("valid regex");
    let cap = re.captures(text)?;
    Some(ParsedSize {
        length: cap[1].parse().ok()?,
        weight: Some(cap[2].parse().ok()?),
        drop: None,
    })
}

/// `31 Inch`, `31"` — length alone; resolvable only with an assumed drop.
fn bare_length(text: &str) -> Option<ParsedSize> {
    let re = Regex::new(r#"(?i)\b(\d{2}(?:\.\d+)?)\s*(?:["']|in(?:ch(?:es)?)?\.?\b)"#)
        .expect("valid regex");
    let cap = re.captures(text)?;
    Some(ParsedSize {
        length: cap[1].parse().ok()?,
        weight: None,
        drop: None,
    })
}
