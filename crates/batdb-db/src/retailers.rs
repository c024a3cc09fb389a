//! Database operations for the `retailers` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `retailers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RetailerRow {
    pub id: i64,
    pub name: String,
    pub website_url: Option<String>,
    pub affiliate_base_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Looks up a retailer by name (case-insensitive), creating it if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn get_or_create_retailer(
    pool: &PgPool,
    name: &str,
    website_url: Option<&str>,
) -> Result<RetailerRow, DbError> {
    let existing = sqlx::query_as::<_, RetailerRow>(
        "SELECT id, name, website_url, affiliate_base_url, created_at \
         FROM retailers \
         WHERE name ILIKE $1 \
         LIMIT 1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    if let Some(row) = existing {
        return Ok(row);
    }

    let row = sqlx::query_as::<_, RetailerRow>(
        "INSERT INTO retailers (name, website_url) \
         VALUES ($1, $2) \
         ON CONFLICT (name) DO UPDATE SET website_url = EXCLUDED.website_url \
         RETURNING id, name, website_url, affiliate_base_url, created_at",
    )
    .bind(name)
    .bind(website_url)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
