//! Database operations for the `bat_variants` table.
//!
//! A variant is identified within its model by the `(length, "drop")` pair,
//! never by retailer identifiers; the same physical bat listed by two
//! retailers maps onto one variant row.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use batdb_core::SizeSpec;

use crate::DbError;

/// A row from the `bat_variants` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantRow {
    pub id: i64,
    pub bat_model_id: i64,
    /// Display length, e.g. `31"`.
    pub length: String,
    /// Display weight, e.g. `28 oz`.
    pub weight: Option<String>,
    /// Signed drop as text, e.g. `-3`.
    pub drop: String,
    pub asin: Option<String>,
    pub product_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const VARIANT_COLUMNS: &str =
    "id, bat_model_id, length, weight, \"drop\", asin, product_url, created_at, updated_at";

/// Finds the variant of a model with the given length and drop, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_variant_by_size(
    pool: &PgPool,
    bat_model_id: i64,
    length: &str,
    drop: &str,
) -> Result<Option<VariantRow>, DbError> {
    let row = sqlx::query_as::<_, VariantRow>(&format!(
        "SELECT {VARIANT_COLUMNS} FROM bat_variants \
         WHERE bat_model_id = $1 AND length = $2 AND \"drop\" = $3"
    ))
    .bind(bat_model_id)
    .bind(length)
    .bind(drop)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a new variant for a model. Conflicts on the size identity update
/// the retailer pointers in place, so concurrent discovery of the same size
/// from two sources cannot produce duplicates.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_variant(
    pool: &PgPool,
    bat_model_id: i64,
    size: &SizeSpec,
    asin: Option<&str>,
    product_url: Option<&str>,
) -> Result<VariantRow, DbError> {
    let row = sqlx::query_as::<_, VariantRow>(&format!(
        "INSERT INTO bat_variants (bat_model_id, length, weight, \"drop\", asin, product_url) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (bat_model_id, length, \"drop\") DO UPDATE SET \
             weight      = COALESCE(EXCLUDED.weight, bat_variants.weight), \
             asin        = COALESCE(bat_variants.asin, EXCLUDED.asin), \
             product_url = COALESCE(bat_variants.product_url, EXCLUDED.product_url), \
             updated_at  = NOW() \
         RETURNING {VARIANT_COLUMNS}"
    ))
    .bind(bat_model_id)
    .bind(&size.length)
    .bind(&size.weight)
    .bind(&size.drop)
    .bind(asin)
    .bind(product_url)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Attaches a retailer item identifier to a variant that does not have one
/// yet. An already-populated `asin` is never overwritten.
///
/// Returns `true` if the identifier was stored.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn attach_variant_asin(
    pool: &PgPool,
    variant_id: i64,
    asin: &str,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE bat_variants \
         SET asin = $1, updated_at = NOW() \
         WHERE id = $2 AND asin IS NULL",
    )
    .bind(asin)
    .bind(variant_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Returns all variants of a model ordered by length then drop.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_variants_for_model(
    pool: &PgPool,
    bat_model_id: i64,
) -> Result<Vec<VariantRow>, DbError> {
    let rows = sqlx::query_as::<_, VariantRow>(&format!(
        "SELECT {VARIANT_COLUMNS} FROM bat_variants \
         WHERE bat_model_id = $1 \
         ORDER BY length, \"drop\", id"
    ))
    .bind(bat_model_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the variants of a model that already carry a retailer item
/// identifier. These are refreshed directly without re-discovery.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_variants_with_asins(
    pool: &PgPool,
    bat_model_id: i64,
) -> Result<Vec<VariantRow>, DbError> {
    let rows = sqlx::query_as::<_, VariantRow>(&format!(
        "SELECT {VARIANT_COLUMNS} FROM bat_variants \
         WHERE bat_model_id = $1 AND asin IS NOT NULL \
         ORDER BY length, \"drop\", id"
    ))
    .bind(bat_model_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
