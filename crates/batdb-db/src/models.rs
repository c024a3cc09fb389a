//! Database operations for the `bat_models` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `bat_models` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BatModelRow {
    pub id: i64,
    pub brand: String,
    pub series: String,
    pub year: i32,
    pub certification: String,
    pub material: String,
    pub construction: String,
    pub barrel_size: String,
    pub model_number: Option<String>,
    pub swing_weight: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<i32>,
    pub image_url: Option<String>,
    pub amazon_asin: Option<String>,
    pub justbats_product_url: Option<String>,
    /// `active` or `broken`.
    pub url_status: String,
    pub url_last_verified: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BatModelRow {
    /// Display name used in logs, e.g. `2024 DeMarini Voodoo One BBCOR`.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!(
            "{} {} {} {}",
            self.year, self.brand, self.series, self.certification
        )
    }
}

const MODEL_COLUMNS: &str = "id, brand, series, year, certification, material, construction, \
     barrel_size, model_number, swing_weight, rating, review_count, image_url, \
     amazon_asin, justbats_product_url, url_status, url_last_verified, \
     created_at, updated_at";

/// Returns all tracked models, ordered stably for sequential processing.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_models(pool: &PgPool) -> Result<Vec<BatModelRow>, DbError> {
    let rows = sqlx::query_as::<_, BatModelRow>(&format!(
        "SELECT {MODEL_COLUMNS} FROM bat_models ORDER BY brand, series, year, id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches a single model by `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_model(pool: &PgPool, id: i64) -> Result<BatModelRow, DbError> {
    let row = sqlx::query_as::<_, BatModelRow>(&format!(
        "SELECT {MODEL_COLUMNS} FROM bat_models WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Enrichment fields collected alongside prices. `None` fields are left
/// untouched so partial data never erases earlier enrichment.
#[derive(Debug, Clone, Default)]
pub struct ModelMetadata {
    pub model_number: Option<String>,
    pub swing_weight: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<i32>,
    pub image_url: Option<String>,
}

/// Applies enrichment metadata to a model.
///
/// Touches only the metadata columns; URL status bookkeeping is separate
/// ([`mark_url_verified`] / [`mark_url_broken`]) since enrichment can come
/// from a source that never fetched the model's product URL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_model_metadata(
    pool: &PgPool,
    id: i64,
    metadata: &ModelMetadata,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE bat_models \
         SET model_number = COALESCE($1, model_number), \
             swing_weight = COALESCE($2, swing_weight), \
             rating       = COALESCE($3, rating), \
             review_count = COALESCE($4, review_count), \
             image_url    = COALESCE($5, image_url), \
             updated_at   = NOW() \
         WHERE id = $6",
    )
    .bind(&metadata.model_number)
    .bind(&metadata.swing_weight)
    .bind(metadata.rating)
    .bind(metadata.review_count)
    .bind(&metadata.image_url)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Records a successful fetch of the model's product URL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_url_verified(pool: &PgPool, id: i64) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE bat_models \
         SET url_status = 'active', url_last_verified = NOW(), updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Flags a model's product URL as broken after a hard fetch failure, so
/// later runs can skip it until the URL is fixed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_url_broken(pool: &PgPool, id: i64) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE bat_models \
         SET url_status = 'broken', url_last_verified = NOW(), updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Stores a discovered seed ASIN on the model, only when none is recorded.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn attach_model_asin(pool: &PgPool, id: i64, asin: &str) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE bat_models \
         SET amazon_asin = $1, updated_at = NOW() \
         WHERE id = $2 AND amazon_asin IS NULL",
    )
    .bind(asin)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_model(pool: &PgPool, url_status: &str) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO bat_models \
                 (brand, series, year, certification, material, construction, barrel_size, \
                  justbats_product_url, url_status) \
             VALUES ('DeMarini', 'Voodoo One', 2024, 'BBCOR', 'Alloy', '1-Piece', '2 5/8\"', \
                     'https://www.justbats.com/product/test/', $1) \
             RETURNING id",
        )
        .bind(url_status)
        .fetch_one(pool)
        .await
        .expect("insert model")
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn metadata_update_leaves_url_status_alone(pool: PgPool) {
        let id = seed_model(&pool, "broken").await;

        let metadata = ModelMetadata {
            rating: Some(4.7),
            review_count: Some(120),
            ..ModelMetadata::default()
        };
        update_model_metadata(&pool, id, &metadata)
            .await
            .expect("update metadata");

        let model = get_model(&pool, id).await.expect("fetch model");
        assert_eq!(model.url_status, "broken");
        assert!(model.url_last_verified.is_none());
        assert_eq!(model.rating, Some(4.7));
        assert_eq!(model.review_count, Some(120));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn url_verification_reactivates_broken_url(pool: PgPool) {
        let id = seed_model(&pool, "broken").await;

        mark_url_verified(&pool, id).await.expect("verify url");

        let model = get_model(&pool, id).await.expect("fetch model");
        assert_eq!(model.url_status, "active");
        assert!(model.url_last_verified.is_some());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn metadata_update_keeps_existing_values_for_none_fields(pool: PgPool) {
        let id = seed_model(&pool, "active").await;

        update_model_metadata(
            &pool,
            id,
            &ModelMetadata {
                model_number: Some("WBD2461010".to_string()),
                ..ModelMetadata::default()
            },
        )
        .await
        .expect("first update");
        update_model_metadata(
            &pool,
            id,
            &ModelMetadata {
                swing_weight: Some("Balanced".to_string()),
                ..ModelMetadata::default()
            },
        )
        .await
        .expect("second update");

        let model = get_model(&pool, id).await.expect("fetch model");
        assert_eq!(model.model_number.as_deref(), Some("WBD2461010"));
        assert_eq!(model.swing_weight.as_deref(), Some("Balanced"));
    }
}
