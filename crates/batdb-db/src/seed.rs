//! Seeding the `bat_models` table from the catalog file.

use batdb_core::CatalogModel;
use sqlx::PgPool;

use crate::DbError;

/// Upsert catalog models into the database.
///
/// Returns the number of models processed (inserted or updated). All
/// upserts run inside a single transaction; if any operation fails the
/// entire batch is rolled back.
///
/// Seed ASINs and product URLs only fill empty columns so that values
/// discovered at collection time survive re-seeding.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_models(pool: &PgPool, models: &[CatalogModel]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for model in models {
        sqlx::query(
            "INSERT INTO bat_models \
                 (brand, series, year, certification, material, construction, barrel_size, \
                  amazon_asin, justbats_product_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (brand, series, year, certification) DO UPDATE SET \
                 material             = EXCLUDED.material, \
                 construction         = EXCLUDED.construction, \
                 barrel_size          = EXCLUDED.barrel_size, \
                 amazon_asin          = COALESCE(bat_models.amazon_asin, EXCLUDED.amazon_asin), \
                 justbats_product_url = COALESCE(bat_models.justbats_product_url, \
                                                 EXCLUDED.justbats_product_url), \
                 updated_at           = NOW()",
        )
        .bind(&model.brand)
        .bind(&model.series)
        .bind(model.year)
        .bind(model.certification.to_string())
        .bind(&model.material)
        .bind(&model.construction)
        .bind(&model.barrel_size)
        .bind(&model.amazon_asin)
        .bind(&model.justbats_url)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
