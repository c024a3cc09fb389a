//! Turning raw retailer listings into variant and price writes.
//!
//! The pure half (matching, grouping, size planning) lives in free
//! functions so it can be tested without a database; the persistence half
//! takes a pool and mutates the run counters.

use batdb_core::{ModelIdentity, RawListing, SizeSpec};
use batdb_db::{DbError, PriceUpdate, RunCounters};
use batdb_matcher::{rank_candidates, score_match, select_group, Extractor, MatchCandidate};
use sqlx::PgPool;

/// One planned write: a size variant plus the price observed for it.
#[derive(Debug, Clone)]
pub(crate) struct VariantObservation {
    pub size: SizeSpec,
    pub asin: Option<String>,
    pub url: Option<String>,
    pub price: Option<f64>,
    pub in_stock: bool,
}

/// Score every listing against the target model, keep the matches, and
/// narrow them to the product family the seed listing belongs to.
pub(crate) fn match_listings(
    extractor: &Extractor,
    listings: Vec<RawListing>,
    target: &ModelIdentity,
    seed_id: Option<&str>,
) -> Vec<MatchCandidate> {
    let mut candidates: Vec<MatchCandidate> = Vec::new();
    for listing in listings {
        let info = extractor.extract(&listing);
        let outcome = score_match(&info, &listing.search_text(), target);
        if outcome.is_match {
            candidates.push(MatchCandidate {
                listing,
                info,
                outcome,
            });
        } else {
            tracing::debug!(
                listing_id = %listing.id,
                score = outcome.score,
                "listing below match threshold"
            );
        }
    }

    rank_candidates(&mut candidates);
    select_group(candidates, seed_id, extractor.lexicon())
}

/// Pick the single best matching listing from a search result set.
///
/// Candidates below the match threshold are discarded; among the rest the
/// highest score wins, with earlier listings winning ties.
pub(crate) fn best_candidate(
    extractor: &Extractor,
    listings: Vec<RawListing>,
    target: &ModelIdentity,
) -> Option<MatchCandidate> {
    let mut best: Option<MatchCandidate> = None;

    for listing in listings {
        let info = extractor.extract(&listing);
        let outcome = score_match(&info, &listing.search_text(), target);
        if !outcome.is_match {
            continue;
        }
        let candidate = MatchCandidate {
            listing,
            info,
            outcome,
        };
        best = match best {
            Some(current) if current.outcome.score >= candidate.outcome.score => Some(current),
            _ => Some(candidate),
        };
    }

    best
}

/// Expand matched candidates into size observations, one per distinct
/// `(length, drop)` pair. The first candidate carrying a size wins; later
/// duplicates are dropped.
pub(crate) fn plan_observations(
    candidates: &[MatchCandidate],
    assumed_drop: Option<i32>,
) -> Vec<VariantObservation> {
    let mut observations: Vec<VariantObservation> = Vec::new();

    for candidate in candidates {
        for size in batdb_matcher::sizes_from_listing(&candidate.listing, assumed_drop) {
            let duplicate = observations
                .iter()
                .any(|o| o.size.length == size.length && o.size.drop == size.drop);
            if duplicate {
                continue;
            }
            observations.push(VariantObservation {
                size,
                asin: Some(candidate.listing.id.clone()),
                url: candidate.listing.url.clone(),
                price: candidate.listing.price,
                in_stock: candidate.listing.in_stock,
            });
        }
    }

    observations
}

/// Persist a batch of observations, tolerating per-observation failures.
///
/// A storage error for one observation is logged and counted; the rest of
/// the batch still runs. Failure here never aborts the model.
pub(crate) async fn persist_observations(
    pool: &PgPool,
    bat_model_id: i64,
    retailer_id: i64,
    observations: &[VariantObservation],
    counters: &mut RunCounters,
) {
    for observation in observations {
        if let Err(e) =
            persist_observation(pool, bat_model_id, retailer_id, observation, counters).await
        {
            tracing::error!(
                bat_model_id,
                length = %observation.size.length,
                drop = %observation.size.drop,
                error = %e,
                "failed to persist observation"
            );
            counters.errors += 1;
        }
    }
}

/// Update-or-create the variant for an observation, then apply its price.
///
/// # Errors
///
/// Returns [`DbError`] if any write fails. An observation without a price
/// bumps the skipped counter and writes nothing.
pub(crate) async fn persist_observation(
    pool: &PgPool,
    bat_model_id: i64,
    retailer_id: i64,
    observation: &VariantObservation,
    counters: &mut RunCounters,
) -> Result<(), DbError> {
    let existing = batdb_db::find_variant_by_size(
        pool,
        bat_model_id,
        &observation.size.length,
        &observation.size.drop,
    )
    .await?;

    let variant = match existing {
        Some(variant) => {
            if let (Some(asin), None) = (&observation.asin, &variant.asin) {
                batdb_db::attach_variant_asin(pool, variant.id, asin).await?;
            }
            variant
        }
        None => {
            let variant = batdb_db::insert_variant(
                pool,
                bat_model_id,
                &observation.size,
                observation.asin.as_deref(),
                observation.url.as_deref(),
            )
            .await?;
            counters.variants_created += 1;
            tracing::info!(
                bat_model_id,
                length = %observation.size.length,
                drop = %observation.size.drop,
                "created variant"
            );
            variant
        }
    };

    let Some(price) = observation.price else {
        counters.skipped += 1;
        return Ok(());
    };

    match batdb_db::apply_price_observation(
        pool,
        variant.id,
        retailer_id,
        price,
        observation.in_stock,
        observation.url.as_deref(),
    )
    .await
    {
        Ok(PriceUpdate::Inserted { .. }) => counters.prices_added += 1,
        Ok(PriceUpdate::Touched { .. } | PriceUpdate::Changed { .. }) => {
            counters.prices_updated += 1;
        }
        Err(DbError::InvalidPrice(value)) => {
            tracing::warn!(variant_id = variant.id, value, "rejected invalid price");
            counters.skipped += 1;
        }
        Err(e) => return Err(e),
    }

    Ok(())
}
