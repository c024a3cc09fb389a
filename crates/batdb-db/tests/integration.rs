//! Offline unit tests for batdb-db pool configuration and row types.
//! These tests do not require a live database connection.

use batdb_core::{AppConfig, Environment};
use batdb_db::{CollectionRunRow, PoolConfig, PriceRow, PriceUpdate, RunCounters, VariantRow};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        catalog_path: PathBuf::from("./config/catalog.yaml"),
        lexicon_path: None,
        amazon_api_base_url: "https://webservices.amazon.com".to_string(),
        amazon_partner_tag: None,
        amazon_access_key: None,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        retail_request_timeout_secs: 30,
        retail_user_agent: "ua".to_string(),
        retail_min_request_interval_ms: 1100,
        retail_model_delay_ms: 2000,
        retail_max_retries: 3,
        retail_retry_backoff_base_secs: 5,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`CollectionRunRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn collection_run_row_has_expected_fields() {
    use chrono::Utc;
    use uuid::Uuid;

    let row = CollectionRunRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        source: "amazon".to_string(),
        status: "queued".to_string(),
        started_at: None,
        completed_at: None,
        models_processed: 0_i32,
        prices_updated: 0_i32,
        prices_added: 0_i32,
        variants_created: 0_i32,
        errors: 0_i32,
        skipped: 0_i32,
        error_message: None,
        created_at: Utc::now(),
    };

    assert_eq!(row.id, 1);
    assert_eq!(row.source, "amazon");
    assert_eq!(row.status, "queued");
    assert!(row.started_at.is_none());
    assert!(row.completed_at.is_none());
    assert_eq!(row.models_processed, 0);
    assert!(row.error_message.is_none());
}

#[test]
fn run_counters_default_to_zero() {
    let counters = RunCounters::default();

    assert_eq!(counters.models_processed, 0);
    assert_eq!(counters.prices_updated, 0);
    assert_eq!(counters.prices_added, 0);
    assert_eq!(counters.variants_created, 0);
    assert_eq!(counters.errors, 0);
    assert_eq!(counters.skipped, 0);
}

/// Compile-time smoke test: confirm that [`VariantRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn variant_row_has_expected_fields() {
    use chrono::Utc;

    let row = VariantRow {
        id: 42_i64,
        bat_model_id: 7_i64,
        length: "32\"".to_string(),
        weight: Some("29 oz".to_string()),
        drop: "-3".to_string(),
        asin: Some("B0EXAMPLE1".to_string()),
        product_url: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.id, 42);
    assert_eq!(row.bat_model_id, 7);
    assert_eq!(row.length, "32\"");
    assert_eq!(row.weight.as_deref(), Some("29 oz"));
    assert_eq!(row.drop, "-3");
    assert_eq!(row.asin.as_deref(), Some("B0EXAMPLE1"));
    assert!(row.product_url.is_none());
}

/// Compile-time smoke test: confirm that [`PriceRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn price_row_has_expected_fields() {
    use chrono::Utc;
    use rust_decimal::Decimal;

    let row = PriceRow {
        id: 9_i64,
        bat_variant_id: 42_i64,
        retailer_id: 1_i64,
        price: Decimal::new(24_995, 2),
        previous_price: Some(Decimal::new(27_995, 2)),
        in_stock: true,
        product_url: Some("https://www.amazon.com/dp/B0EXAMPLE1".to_string()),
        last_updated: Utc::now(),
        price_change_date: None,
        price_change_percentage: Some(Decimal::new(-1072, 2)),
    };

    assert_eq!(row.bat_variant_id, 42);
    assert_eq!(row.price, Decimal::new(24_995, 2));
    assert_eq!(row.previous_price, Some(Decimal::new(27_995, 2)));
    assert!(row.in_stock);
    assert!(row.product_url.is_some());
}

#[test]
fn price_update_variants_compare_by_value() {
    use rust_decimal::Decimal;

    let inserted = PriceUpdate::Inserted {
        price: Decimal::new(19_999, 2),
    };
    assert_eq!(
        inserted,
        PriceUpdate::Inserted {
            price: Decimal::new(19_999, 2),
        }
    );

    let changed = PriceUpdate::Changed {
        price: Decimal::new(19_999, 2),
        previous: Decimal::new(24_995, 2),
        change_pct: Some(Decimal::new(-1999, 2)),
    };
    assert_ne!(
        changed,
        PriceUpdate::Touched {
            price: Decimal::new(19_999, 2),
        }
    );
}
