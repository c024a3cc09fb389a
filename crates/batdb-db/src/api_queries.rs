//! Read-model queries used by `batdb-server` endpoints.
//!
//! The API serves the nested model -> variants -> prices shape; assembly
//! happens here in three queries rather than one row-exploding join.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use crate::models::{list_models, BatModelRow};
use crate::DbError;

/// Current price at one retailer, nested under a variant.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PriceDetail {
    #[serde(skip_serializing)]
    pub bat_variant_id: i64,
    pub retailer: String,
    pub price: Decimal,
    pub previous_price: Option<Decimal>,
    pub in_stock: bool,
    pub product_url: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub price_change_date: Option<DateTime<Utc>>,
    pub price_change_percentage: Option<Decimal>,
}

/// One size variant with its current prices across retailers.
#[derive(Debug, Clone, Serialize)]
pub struct VariantDetail {
    pub id: i64,
    pub length: String,
    pub weight: Option<String>,
    pub drop: String,
    pub prices: Vec<PriceDetail>,
}

/// One tracked model with its variants nested.
#[derive(Debug, Clone, Serialize)]
pub struct ModelDetail {
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
    pub variants: Vec<VariantDetail>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct VariantFlat {
    id: i64,
    bat_model_id: i64,
    length: String,
    weight: Option<String>,
    drop: String,
}

/// Returns every tracked model with variants and per-retailer prices nested.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn list_models_with_prices(pool: &PgPool) -> Result<Vec<ModelDetail>, DbError> {
    let models = list_models(pool).await?;

    let variants = sqlx::query_as::<_, VariantFlat>(
        "SELECT id, bat_model_id, length, weight, \"drop\" \
         FROM bat_variants \
         ORDER BY bat_model_id, length, \"drop\", id",
    )
    .fetch_all(pool)
    .await?;

    let prices = sqlx::query_as::<_, PriceDetail>(
        "SELECT p.bat_variant_id, r.name AS retailer, p.price, p.previous_price, \
                p.in_stock, p.product_url, p.last_updated, p.price_change_date, \
                p.price_change_percentage \
         FROM prices p \
         JOIN retailers r ON r.id = p.retailer_id \
         ORDER BY p.bat_variant_id, r.name",
    )
    .fetch_all(pool)
    .await?;

    Ok(assemble(models, variants, prices))
}

fn assemble(
    models: Vec<BatModelRow>,
    variants: Vec<VariantFlat>,
    prices: Vec<PriceDetail>,
) -> Vec<ModelDetail> {
    let mut details: Vec<ModelDetail> = models
        .into_iter()
        .map(|m| ModelDetail {
            id: m.id,
            brand: m.brand,
            series: m.series,
            year: m.year,
            certification: m.certification,
            material: m.material,
            construction: m.construction,
            barrel_size: m.barrel_size,
            model_number: m.model_number,
            swing_weight: m.swing_weight,
            rating: m.rating,
            review_count: m.review_count,
            image_url: m.image_url,
            variants: Vec::new(),
        })
        .collect();

    let mut variant_details: Vec<(i64, VariantDetail)> = variants
        .into_iter()
        .map(|v| {
            (
                v.bat_model_id,
                VariantDetail {
                    id: v.id,
                    length: v.length,
                    weight: v.weight,
                    drop: v.drop,
                    prices: Vec::new(),
                },
            )
        })
        .collect();

    for price in prices {
        if let Some((_, variant)) = variant_details
            .iter_mut()
            .find(|(_, v)| v.id == price.bat_variant_id)
        {
            variant.prices.push(price);
        }
    }

    for (model_id, variant) in variant_details {
        if let Some(model) = details.iter_mut().find(|m| m.id == model_id) {
            model.variants.push(variant);
        }
    }

    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn model_row(id: i64, series: &str) -> BatModelRow {
        BatModelRow {
            id,
            brand: "DeMarini".to_string(),
            series: series.to_string(),
            year: 2024,
            certification: "BBCOR".to_string(),
            material: "Alloy".to_string(),
            construction: "1-Piece".to_string(),
            barrel_size: "2 5/8\"".to_string(),
            model_number: None,
            swing_weight: None,
            rating: None,
            review_count: None,
            image_url: None,
            amazon_asin: None,
            justbats_product_url: None,
            url_status: "active".to_string(),
            url_last_verified: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn assemble_nests_variants_and_prices() {
        let models = vec![model_row(1, "Voodoo One"), model_row(2, "Zoa")];
        let variants = vec![
            VariantFlat {
                id: 10,
                bat_model_id: 1,
                length: "31\"".to_string(),
                weight: Some("28 oz".to_string()),
                drop: "-3".to_string(),
            },
            VariantFlat {
                id: 11,
                bat_model_id: 1,
                length: "32\"".to_string(),
                weight: Some("29 oz".to_string()),
                drop: "-3".to_string(),
            },
        ];
        let prices = vec![PriceDetail {
            bat_variant_id: 10,
            retailer: "Amazon".to_string(),
            price: Decimal::new(24_995, 2),
            previous_price: None,
            in_stock: true,
            product_url: None,
            last_updated: Utc::now(),
            price_change_date: None,
            price_change_percentage: None,
        }];

        let details = assemble(models, variants, prices);
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].variants.len(), 2);
        assert_eq!(details[0].variants[0].prices.len(), 1);
        assert_eq!(details[0].variants[0].prices[0].retailer, "Amazon");
        assert!(details[1].variants.is_empty());
    }
}
