//! Per-model collection against the Amazon product catalog API.
//!
//! Discovery runs in priority order: variants that already carry item
//! identifiers are refreshed directly; otherwise the model's seed
//! identifier expands into its variation family; failing both, keyword
//! search finds a seed and stores it back on the model for next time.

use batdb_core::{CatalogModel, Certification, ModelIdentity};
use batdb_db::{BatModelRow, ModelMetadata, RunCounters};
use batdb_matcher::Extractor;
use batdb_retail::{AmazonClient, RetailError};
use sqlx::PgPool;

use super::{reconcile, ModelOutcome};

pub(crate) async fn collect_model(
    pool: &PgPool,
    client: &AmazonClient,
    extractor: &Extractor,
    retailer_id: i64,
    model: &BatModelRow,
    counters: &mut RunCounters,
) -> anyhow::Result<ModelOutcome> {
    let certification = Certification::from_db_str(&model.certification).ok_or_else(|| {
        anyhow::anyhow!(
            "model {} has unknown certification '{}'",
            model.id,
            model.certification
        )
    })?;
    let assumed_drop = certification.assumed_drop();
    let target = ModelIdentity {
        brand: model.brand.clone(),
        series: model.series.clone(),
        year: model.year,
        certification,
        material: model.material.clone(),
    };

    let known = batdb_db::list_variants_with_asins(pool, model.id).await?;
    if !known.is_empty() {
        refresh_known_variants(pool, client, retailer_id, model, &known, counters).await?;
        return Ok(ModelOutcome::Processed);
    }

    let seed_asin = match &model.amazon_asin {
        Some(asin) => asin.clone(),
        None => {
            let Some(asin) = discover_seed(pool, client, extractor, model, &target).await? else {
                tracing::info!(model = %model.display_name(), "no search results matched");
                counters.skipped += 1;
                return Ok(ModelOutcome::Skipped);
            };
            asin
        }
    };

    let listings = client.get_variations(&seed_asin).await?;
    let candidates = reconcile::match_listings(extractor, listings, &target, Some(&seed_asin));
    if candidates.is_empty() {
        tracing::info!(model = %model.display_name(), seed_asin, "no variation listings matched");
        counters.skipped += 1;
        return Ok(ModelOutcome::Skipped);
    }

    let observations = reconcile::plan_observations(&candidates, assumed_drop);
    reconcile::persist_observations(pool, model.id, retailer_id, &observations, counters).await;

    enrich_model(pool, client, model, &seed_asin).await;
    Ok(ModelOutcome::Processed)
}

/// Refresh prices for variants that already map to item identifiers, one
/// batched lookup instead of rediscovery.
async fn refresh_known_variants(
    pool: &PgPool,
    client: &AmazonClient,
    retailer_id: i64,
    model: &BatModelRow,
    known: &[batdb_db::VariantRow],
    counters: &mut RunCounters,
) -> anyhow::Result<()> {
    let asins: Vec<String> = known.iter().filter_map(|v| v.asin.clone()).collect();
    let listings = client.get_items(&asins).await?;

    for variant in known {
        let Some(asin) = &variant.asin else { continue };
        let Some(listing) = listings.iter().find(|l| &l.id == asin) else {
            tracing::debug!(variant_id = variant.id, asin, "no listing returned");
            counters.skipped += 1;
            continue;
        };

        let Some(price) = listing.price else {
            counters.skipped += 1;
            continue;
        };

        match batdb_db::apply_price_observation(
            pool,
            variant.id,
            retailer_id,
            price,
            listing.in_stock,
            listing.url.as_deref(),
        )
        .await
        {
            Ok(batdb_db::PriceUpdate::Inserted { .. }) => counters.prices_added += 1,
            Ok(_) => counters.prices_updated += 1,
            Err(batdb_db::DbError::InvalidPrice(value)) => {
                tracing::warn!(variant_id = variant.id, value, "rejected invalid price");
                counters.skipped += 1;
            }
            Err(e) => {
                tracing::error!(variant_id = variant.id, error = %e, "failed to apply price");
                counters.errors += 1;
            }
        }
    }

    tracing::info!(
        model = %model.display_name(),
        variants = known.len(),
        "refreshed known variants"
    );
    Ok(())
}

/// Keyword search for a seed identifier, most specific query first. The
/// winner is stored on the model so later runs skip the search.
async fn discover_seed(
    pool: &PgPool,
    client: &AmazonClient,
    extractor: &Extractor,
    model: &BatModelRow,
    target: &ModelIdentity,
) -> anyhow::Result<Option<String>> {
    let catalog_model = CatalogModel {
        brand: model.brand.clone(),
        series: model.series.clone(),
        year: model.year,
        certification: target.certification,
        material: model.material.clone(),
        construction: model.construction.clone(),
        barrel_size: model.barrel_size.clone(),
        amazon_asin: None,
        justbats_url: None,
    };

    for term in AmazonClient::build_search_terms(&catalog_model) {
        let listings = client.search_items(&term.keywords).await?;
        if let Some(best) = reconcile::best_candidate(extractor, listings, target) {
            tracing::info!(
                model = %model.display_name(),
                asin = %best.listing.id,
                score = best.outcome.score,
                confidence = term.confidence,
                "search discovered seed listing"
            );
            batdb_db::attach_model_asin(pool, model.id, &best.listing.id).await?;
            return Ok(Some(best.listing.id));
        }
    }

    Ok(None)
}

/// Best-effort metadata enrichment; failures never abort price collection.
async fn enrich_model(pool: &PgPool, client: &AmazonClient, model: &BatModelRow, seed_asin: &str) {
    let meta = match client.get_item_metadata(seed_asin).await {
        Ok(Some(meta)) => meta,
        Ok(None) => return,
        Err(RetailError::NotFound { .. }) => return,
        Err(e) => {
            tracing::debug!(model = %model.display_name(), error = %e, "metadata fetch failed");
            return;
        }
    };

    let metadata = ModelMetadata {
        rating: meta.rating,
        review_count: meta.review_count,
        image_url: meta.image_url,
        ..ModelMetadata::default()
    };
    if let Err(e) = batdb_db::update_model_metadata(pool, model.id, &metadata).await {
        tracing::warn!(model = %model.display_name(), error = %e, "metadata update failed");
    }
}
