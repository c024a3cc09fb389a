//! Weighted additive scoring of an extracted listing against a catalog model.

use batdb_core::{BatInfo, ModelIdentity, RawListing};

/// Minimum total score for a candidate to count as a match. Fixed policy,
/// not a per-call knob.
pub const MATCH_THRESHOLD: u32 = 70;

const BRAND_WEIGHT: u32 = 30;
const SERIES_WEIGHT: u32 = 30;
const YEAR_EXACT_WEIGHT: u32 = 20;
const YEAR_ADJACENT_WEIGHT: u32 = 10;
const CERTIFICATION_WEIGHT: u32 = 15;
const MATERIAL_WEIGHT: u32 = 5;
const PHRASE_WEIGHT: u32 = 5;
const RELEVANCE_BONUS: u32 = 5;
const RELEVANCE_BONUS_FLOOR: u32 = 80;

/// Score plus the reasons that produced it, for logging and diagnostics.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub score: u32,
    pub reasons: Vec<String>,
    pub is_match: bool,
}

/// One scored listing, carried through grouping and reconciliation.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub listing: RawListing,
    pub info: BatInfo,
    pub outcome: MatchOutcome,
}

/// Score an extracted listing against a target model identity.
///
/// `search_text` is the listing's lowercased title+features blob, used for
/// the series-substring and phrase checks.
#[must_use]
pub fn score_match(info: &BatInfo, search_text: &str, target: &ModelIdentity) -> MatchOutcome {
    let mut score = 0;
    let mut reasons = Vec::new();

    if info.brand.eq_ignore_ascii_case(&target.brand) {
        score += BRAND_WEIGHT;
        reasons.push(format!("brand '{}'", target.brand));
    }

    if search_text.contains(&target.series.to_lowercase()) {
        score += SERIES_WEIGHT;
        reasons.push(format!("series '{}'", target.series));
    }

    match info.year {
        Some(year) if year == target.year => {
            score += YEAR_EXACT_WEIGHT;
            reasons.push(format!("year {}", target.year));
        }
        Some(year) if (year - target.year).abs() == 1 => {
            score += YEAR_ADJACENT_WEIGHT;
            reasons.push(format!("year {year} (close to {})", target.year));
        }
        _ => {}
    }

    if info.certification == Some(target.certification) {
        score += CERTIFICATION_WEIGHT;
        reasons.push(format!("certification {}", target.certification));
    }

    if info
        .material
        .as_deref()
        .is_some_and(|m| m.eq_ignore_ascii_case(&target.material))
    {
        score += MATERIAL_WEIGHT;
        reasons.push(format!("material {}", target.material));
    }

    if search_text.contains("baseball bat") {
        score += PHRASE_WEIGHT;
        reasons.push("product phrase".to_string());
    }

    if info.relevance >= RELEVANCE_BONUS_FLOOR {
        score += RELEVANCE_BONUS;
        reasons.push(format!("high relevance ({})", info.relevance));
    }

    MatchOutcome {
        score,
        reasons,
        is_match: score >= MATCH_THRESHOLD,
    }
}

/// Sort candidates by score descending. The sort is stable, so equal scores
/// keep their discovery order.
pub fn rank_candidates(candidates: &mut [MatchCandidate]) {
    candidates.sort_by(|a, b| b.outcome.score.cmp(&a.outcome.score));
}

#[cfg(test)]
mod tests {
    use super::*;
    use batdb_core::{Certification, Lexicon};

    use crate::extract::Extractor;

    fn target() -> ModelIdentity {
        ModelIdentity {
            brand: "DeMarini".to_string(),
            series: "Voodoo".to_string(),
            year: 2024,
            certification: Certification::Bbcor,
            material: "Alloy".to_string(),
        }
    }

    fn candidate(title: &str) -> (BatInfo, String) {
        let listing = RawListing {
            id: "B0TEST".to_string(),
            title: title.to_string(),
            features: vec![],
            price: None,
            in_stock: true,
            variation_attributes: vec![],
            url: None,
        };
        let extractor = Extractor::new(Lexicon::default(), 2024);
        let info = extractor.extract(&listing);
        (info, listing.search_text())
    }

    #[test]
    fn full_identity_match_clears_threshold() {
        let (info, text) = candidate("2024 DeMarini Voodoo BBCOR baseball bat");
        let outcome = score_match(&info, &text, &target());
        assert!(outcome.score >= MATCH_THRESHOLD, "score {}", outcome.score);
        assert!(outcome.is_match);
    }

    #[test]
    fn brand_alone_is_not_a_match() {
        let (info, text) = candidate("DeMarini batting gloves, adult");
        let outcome = score_match(&info, &text, &target());
        assert!(outcome.score < MATCH_THRESHOLD, "score {}", outcome.score);
        assert!(!outcome.is_match);
    }

    #[test]
    fn drop_three_marker_carries_certification_weight() {
        // BBCOR listings often state the drop instead of the keyword.
        let (info, text) = candidate("DeMarini Voodoo Baseball Bat (-3)");
        assert_eq!(info.certification, Some(Certification::Bbcor));
        let outcome = score_match(&info, &text, &target());
        assert!(outcome.score >= MATCH_THRESHOLD, "score {}", outcome.score);
        assert!(outcome.is_match);
    }

    #[test]
    fn adjacent_year_scores_lower_than_exact() {
        let (exact_info, exact_text) = candidate("2024 DeMarini Voodoo BBCOR baseball bat");
        let (adj_info, adj_text) = candidate("2023 DeMarini Voodoo BBCOR baseball bat");
        let exact = score_match(&exact_info, &exact_text, &target());
        let adjacent = score_match(&adj_info, &adj_text, &target());
        assert_eq!(exact.score - adjacent.score, 10);
        assert!(adjacent.is_match);
    }

    #[test]
    fn reasons_name_each_contribution() {
        let (info, text) = candidate("2024 DeMarini Voodoo BBCOR baseball bat");
        let outcome = score_match(&info, &text, &target());
        assert!(outcome.reasons.iter().any(|r| r.contains("brand")));
        assert!(outcome.reasons.iter().any(|r| r.contains("series")));
        assert!(outcome.reasons.iter().any(|r| r.contains("year")));
    }

    #[test]
    fn ranking_is_stable_for_equal_scores() {
        let (info_a, text_a) = candidate("2024 DeMarini Voodoo BBCOR baseball bat 31\" (-3)");
        let (info_b, text_b) = candidate("2024 DeMarini Voodoo BBCOR baseball bat 32\" (-3)");
        let make = |id: &str, info: &BatInfo, text: &str| MatchCandidate {
            listing: RawListing {
                id: id.to_string(),
                title: String::new(),
                features: vec![],
                price: None,
                in_stock: true,
                variation_attributes: vec![],
                url: None,
            },
            info: info.clone(),
            outcome: score_match(info, text, &target()),
        };
        let mut candidates = vec![
            make("first", &info_a, &text_a),
            make("second", &info_b, &text_b),
        ];
        rank_candidates(&mut candidates);
        assert_eq!(candidates[0].listing.id, "first");
        assert_eq!(candidates[1].listing.id, "second");
    }
}
