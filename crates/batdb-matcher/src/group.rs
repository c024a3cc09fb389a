//! Candidate grouping: isolating the product family a seed listing belongs to.
//!
//! Retailer catalogs frequently bundle unrelated bat lines, or mutually
//! exclusive colorways, under one discovery query. Grouping keeps a
//! wrong-line candidate from contributing variants and prices to the wrong
//! model.

use std::collections::HashSet;

use batdb_core::Lexicon;
use regex::Regex;

use crate::score::MatchCandidate;

/// Partition candidates and return the group containing the seed listing,
/// or the largest group when no seed is present among them.
///
/// Two-level fallback: group by a residual series key derived from each
/// title first; when fewer than two distinct series emerge, group by
/// normalized colorway instead.
#[must_use]
pub fn select_group(
    candidates: Vec<MatchCandidate>,
    seed_id: Option<&str>,
    lexicon: &Lexicon,
) -> Vec<MatchCandidate> {
    if candidates.len() < 2 {
        return candidates;
    }

    let series_keys: Vec<String> = candidates
        .iter()
        .map(|c| series_residual(&c.listing.title, lexicon))
        .collect();

    let distinct: HashSet<&str> = series_keys
        .iter()
        .map(String::as_str)
        .filter(|k| k.len() > 3)
        .collect();

    let keys = if distinct.len() >= 2 {
        series_keys
    } else {
        tracing::debug!("no distinct series keys, grouping by colorway");
        candidates.iter().map(|c| c.info.colorway.clone()).collect()
    };

    pick_group(candidates, &keys, seed_id)
}

/// Strip brand, special-edition, year, size, certification, and drop tokens
/// from a title; what remains identifies the series line.
fn series_residual(title: &str, lexicon: &Lexicon) -> String {
    let mut text = title.to_lowercase();

    // Multi-word phrases first, while the text is still contiguous.
    for brand in &lexicon.brands {
        text = text.replace(brand.keyword.as_str(), " ");
    }
    for edition in &lexicon.special_editions {
        text = text.replace(edition.as_str(), " ");
    }

    let size_token = Regex::new(r#"^[\d"'./()|-]+$|^-?\d+(?:\.\d+)?$"#).expect("valid regex");

    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .filter(|t| !size_token.is_match(t))
        .filter(|t| {
            !matches!(
                *t,
                "baseball" | "bat" | "bats" | "bbcor" | "usssa" | "usa" | "usab" | "oz"
                    | "inch" | "inches" | "in" | "drop" | "edition" | "new" | "barrel"
            )
        })
        .filter(|t| !lexicon.standard_colors.contains(*t))
        .collect::<Vec<_>>()
        .join(" ")
}

fn pick_group(
    candidates: Vec<MatchCandidate>,
    keys: &[String],
    seed_id: Option<&str>,
) -> Vec<MatchCandidate> {
    // Insertion-ordered partition so size ties resolve to the group seen
    // first.
    let mut groups: Vec<(String, Vec<MatchCandidate>)> = Vec::new();
    for (candidate, key) in candidates.into_iter().zip(keys) {
        match groups.iter_mut().find(|(k, _)| k == key) {
            Some((_, members)) => members.push(candidate),
            None => groups.push((key.clone(), vec![candidate])),
        }
    }

    if let Some(seed) = seed_id {
        if let Some(pos) = groups
            .iter()
            .position(|(_, members)| members.iter().any(|c| c.listing.id == seed))
        {
            return groups.swap_remove(pos).1;
        }
    }

    // Stable sort: equal-sized groups keep discovery order, first one wins.
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    groups
        .into_iter()
        .next()
        .map(|(_, members)| members)
        .unwrap_or_default()
}
