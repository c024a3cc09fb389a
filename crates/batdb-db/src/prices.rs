//! Database operations for the `prices` table.
//!
//! One row per `(variant, retailer)` pair holds the current price plus the
//! previous price and change metadata. Observations go through
//! [`apply_price_observation`], which decides between inserting a first
//! price, touching an unchanged one, and recording a change with history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use batdb_core::{percent_change, prices_equal, validate_price};

use crate::DbError;

/// A row from the `prices` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceRow {
    pub id: i64,
    pub bat_variant_id: i64,
    pub retailer_id: i64,
    pub price: Decimal,
    pub previous_price: Option<Decimal>,
    pub in_stock: bool,
    pub product_url: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub price_change_date: Option<DateTime<Utc>>,
    pub price_change_percentage: Option<Decimal>,
}

/// Outcome of applying one price observation.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceUpdate {
    /// First observation for this variant/retailer pair.
    Inserted { price: Decimal },
    /// Price unchanged; freshness and stock state refreshed.
    Touched { price: Decimal },
    /// Price moved; history columns updated.
    Changed {
        price: Decimal,
        previous: Decimal,
        change_pct: Option<Decimal>,
    },
}

const PRICE_COLUMNS: &str = "id, bat_variant_id, retailer_id, price, previous_price, in_stock, \
     product_url, last_updated, price_change_date, price_change_percentage";

/// Returns the current price row for a variant at a retailer, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_price(
    pool: &PgPool,
    bat_variant_id: i64,
    retailer_id: i64,
) -> Result<Option<PriceRow>, DbError> {
    let row = sqlx::query_as::<_, PriceRow>(&format!(
        "SELECT {PRICE_COLUMNS} FROM prices \
         WHERE bat_variant_id = $1 AND retailer_id = $2"
    ))
    .bind(bat_variant_id)
    .bind(retailer_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Records one observed price for a variant at a retailer.
///
/// The raw value is validated and normalized to two decimal places first.
/// Then:
///
/// - no existing row: a new row is inserted;
/// - existing price within a cent of the observation: `last_updated` and
///   `in_stock` are refreshed, history is untouched;
/// - otherwise: the old price moves to `previous_price` and the change date
///   and percentage are recorded.
///
/// # Errors
///
/// Returns [`DbError::InvalidPrice`] for non-finite, negative, or
/// out-of-range values, or [`DbError::Sqlx`] if a query fails.
pub async fn apply_price_observation(
    pool: &PgPool,
    bat_variant_id: i64,
    retailer_id: i64,
    observed_price: f64,
    in_stock: bool,
    product_url: Option<&str>,
) -> Result<PriceUpdate, DbError> {
    let price = validate_price(observed_price)
        .ok_or_else(|| DbError::InvalidPrice(observed_price.to_string()))?;

    let Some(existing) = get_price(pool, bat_variant_id, retailer_id).await? else {
        sqlx::query(
            "INSERT INTO prices \
                 (bat_variant_id, retailer_id, price, in_stock, product_url, last_updated) \
             VALUES ($1, $2, $3, $4, $5, NOW())",
        )
        .bind(bat_variant_id)
        .bind(retailer_id)
        .bind(price)
        .bind(in_stock)
        .bind(product_url)
        .execute(pool)
        .await?;

        return Ok(PriceUpdate::Inserted { price });
    };

    if prices_equal(existing.price, price) {
        sqlx::query(
            "UPDATE prices \
             SET in_stock = $1, last_updated = NOW() \
             WHERE id = $2",
        )
        .bind(in_stock)
        .bind(existing.id)
        .execute(pool)
        .await?;

        return Ok(PriceUpdate::Touched {
            price: existing.price,
        });
    }

    let change_pct = percent_change(existing.price, price);
    sqlx::query(
        "UPDATE prices \
         SET price                   = $1, \
             previous_price          = $2, \
             in_stock                = $3, \
             last_updated            = NOW(), \
             price_change_date       = NOW(), \
             price_change_percentage = $4 \
         WHERE id = $5",
    )
    .bind(price)
    .bind(existing.price)
    .bind(in_stock)
    .bind(change_pct)
    .bind(existing.id)
    .execute(pool)
    .await?;

    Ok(PriceUpdate::Changed {
        price,
        previous: existing.price,
        change_pct,
    })
}
