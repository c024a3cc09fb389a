//! Per-model collection from JustBats product pages.

use batdb_core::Certification;
use batdb_db::{BatModelRow, ModelMetadata, RunCounters};
use batdb_retail::{JustBatsClient, RetailError};
use sqlx::PgPool;

use super::{
    reconcile::{self, VariantObservation},
    ModelOutcome,
};

pub(crate) async fn collect_model(
    pool: &PgPool,
    client: &JustBatsClient,
    retailer_id: i64,
    model: &BatModelRow,
    counters: &mut RunCounters,
) -> anyhow::Result<ModelOutcome> {
    let Some(url) = &model.justbats_product_url else {
        tracing::debug!(model = %model.display_name(), "no product URL configured");
        counters.skipped += 1;
        return Ok(ModelOutcome::Skipped);
    };

    if model.url_status == "broken" {
        tracing::debug!(model = %model.display_name(), "skipping broken URL");
        counters.skipped += 1;
        return Ok(ModelOutcome::Skipped);
    }

    let page = match client.fetch_product(url).await {
        Ok(page) => page,
        Err(RetailError::NotFound { .. }) => {
            tracing::warn!(model = %model.display_name(), url, "product URL is dead, flagging");
            batdb_db::mark_url_broken(pool, model.id).await?;
            counters.errors += 1;
            return Ok(ModelOutcome::Skipped);
        }
        Err(e) => return Err(e.into()),
    };
    batdb_db::mark_url_verified(pool, model.id).await?;

    let certification = Certification::from_db_str(&model.certification).ok_or_else(|| {
        anyhow::anyhow!(
            "model {} has unknown certification '{}'",
            model.id,
            model.certification
        )
    })?;
    let assumed_drop = certification.assumed_drop();

    if page.discontinued {
        tracing::info!(model = %model.display_name(), "product is discontinued");
    }

    let mut observations = Vec::new();
    for option in &page.options {
        let Some(size) = batdb_matcher::parse_size_text(&option.text, assumed_drop) else {
            tracing::debug!(model = %model.display_name(), text = %option.text, "unparsable size option");
            counters.skipped += 1;
            continue;
        };

        observations.push(VariantObservation {
            size,
            asin: None,
            url: Some(url.clone()),
            price: option.price,
            in_stock: option.in_stock,
        });
    }
    reconcile::persist_observations(pool, model.id, retailer_id, &observations, counters).await;

    let metadata = ModelMetadata {
        model_number: page.model_number.clone(),
        swing_weight: page.swing_weight.clone(),
        image_url: page.image_url.clone(),
        ..ModelMetadata::default()
    };
    batdb_db::update_model_metadata(pool, model.id, &metadata).await?;

    Ok(ModelOutcome::Processed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use batdb_retail::JustBatsClientConfig;

    fn client() -> JustBatsClient {
        JustBatsClient::new(&JustBatsClientConfig {
            timeout_secs: 5,
            user_agent: "batdb-test".to_string(),
            min_request_interval_ms: 0,
            max_retries: 0,
            retry_backoff_base_secs: 0,
        })
        .expect("build client")
    }

    async fn seed_model(pool: &PgPool, url: Option<&str>, url_status: &str) -> BatModelRow {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO bat_models \
                 (brand, series, year, certification, material, construction, barrel_size, \
                  justbats_product_url, url_status) \
             VALUES ('DeMarini', 'Voodoo One', 2024, 'BBCOR', 'Alloy', '1-Piece', '2 5/8\"', \
                     $1, $2) \
             RETURNING id",
        )
        .bind(url)
        .bind(url_status)
        .fetch_one(pool)
        .await
        .expect("insert model");
        batdb_db::get_model(pool, id).await.expect("fetch model")
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn model_without_url_is_skipped_not_processed(pool: PgPool) {
        let model = seed_model(&pool, None, "active").await;
        let mut counters = RunCounters::default();

        let outcome = collect_model(&pool, &client(), 1, &model, &mut counters)
            .await
            .expect("collect");

        assert_eq!(outcome, ModelOutcome::Skipped);
        assert_eq!(counters.skipped, 1);
        assert_eq!(counters.errors, 0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn model_with_broken_url_is_skipped_without_fetching(pool: PgPool) {
        let model = seed_model(
            &pool,
            Some("https://www.justbats.com/product/gone/"),
            "broken",
        )
        .await;
        let mut counters = RunCounters::default();

        let outcome = collect_model(&pool, &client(), 1, &model, &mut counters)
            .await
            .expect("collect");

        assert_eq!(outcome, ModelOutcome::Skipped);
        assert_eq!(counters.skipped, 1);
    }
}
