//! Collection command handlers for the CLI.
//!
//! These are called from `main` after the database pool and config are
//! established. Per-model failures are logged and counted rather than
//! propagated so a single bad model does not abort the full run.

mod amazon;
mod justbats;
mod reconcile;

use std::time::Duration;

use clap::Subcommand;

use batdb_core::{AppConfig, Lexicon};
use batdb_db::{BatModelRow, RunCounters};
use batdb_matcher::Extractor;

use crate::fail_run_best_effort;

/// Whether a model's collection pass actually did work.
///
/// Skipped models (no URL or seed, nothing matched) bump the skipped
/// counter where the skip happens; only processed models count toward
/// `models_processed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ModelOutcome {
    Processed,
    Skipped,
}

/// Sub-commands available under `collect`.
#[derive(Debug, Subcommand)]
pub enum CollectCommands {
    /// Collect prices from the Amazon product catalog API
    Amazon {
        /// Restrict collection to a single model (by id)
        #[arg(long)]
        model: Option<i64>,

        /// Cap the number of models processed
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Collect prices by scraping JustBats product pages
    Justbats {
        /// Restrict collection to a single model (by id)
        #[arg(long)]
        model: Option<i64>,

        /// Cap the number of models processed
        #[arg(long)]
        limit: Option<usize>,
    },
}

pub async fn run(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    command: CollectCommands,
) -> anyhow::Result<()> {
    match command {
        CollectCommands::Amazon { model, limit } => {
            run_collect_amazon(pool, config, model, limit).await
        }
        CollectCommands::Justbats { model, limit } => {
            run_collect_justbats(pool, config, model, limit).await
        }
    }
}

/// Load the models to process for a collect run.
///
/// If `model_filter` is `Some(id)`, fetches that single model and returns an
/// error if not found. If `None`, returns all tracked models, capped at
/// `limit` when given.
pub(crate) async fn load_models_for_collect(
    pool: &sqlx::PgPool,
    model_filter: Option<i64>,
    limit: Option<usize>,
) -> anyhow::Result<Vec<BatModelRow>> {
    let mut models = match model_filter {
        Some(id) => vec![batdb_db::get_model(pool, id).await?],
        None => batdb_db::list_models(pool).await?,
    };

    if let Some(limit) = limit {
        models.truncate(limit);
    }

    Ok(models)
}

fn build_extractor(config: &AppConfig) -> anyhow::Result<Extractor> {
    let lexicon = match &config.lexicon_path {
        Some(path) => batdb_core::load_lexicon(path)?,
        None => Lexicon::default(),
    };
    let reference_year = chrono::Datelike::year(&chrono::Utc::now());
    Ok(Extractor::new(lexicon, reference_year))
}

/// Collect prices for tracked models from the Amazon product catalog API.
///
/// Per-model failures are logged and counted, not propagated; the run fails
/// only when every model fails.
///
/// # Errors
///
/// Returns an error if the model filter resolves to nothing, the client
/// cannot be constructed, or the collection run cannot be created.
pub(crate) async fn run_collect_amazon(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    model_filter: Option<i64>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let models = load_models_for_collect(pool, model_filter, limit).await?;
    if models.is_empty() {
        println!("no tracked models found; seed the catalog first");
        return Ok(());
    }

    let extractor = build_extractor(config)?;
    let client = batdb_retail::AmazonClient::with_base_url(
        &batdb_retail::AmazonClientConfig::from_app_config(config),
        &config.amazon_api_base_url,
    )?;
    let retailer =
        batdb_db::get_or_create_retailer(pool, "Amazon", Some("https://www.amazon.com")).await?;

    let run = batdb_db::create_collection_run(pool, "amazon").await?;
    if let Err(e) = batdb_db::start_collection_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, &RunCounters::default(), format!("{e:#}")).await;
        return Err(e.into());
    }

    let mut counters = RunCounters::default();
    let mut failed_models: usize = 0;
    let model_count = models.len();

    for (index, model) in models.iter().enumerate() {
        match amazon::collect_model(pool, &client, &extractor, retailer.id, model, &mut counters)
            .await
        {
            Ok(ModelOutcome::Processed) => counters.models_processed += 1,
            Ok(ModelOutcome::Skipped) => {}
            Err(e) => {
                tracing::error!(model = %model.display_name(), error = %e, "model collection failed");
                counters.errors += 1;
                failed_models += 1;
            }
        }

        if index + 1 < model_count {
            tokio::time::sleep(Duration::from_millis(config.retail_model_delay_ms)).await;
        }
    }

    finish_run(pool, run.id, &counters, failed_models, model_count).await?;
    println!(
        "amazon run complete: {} models, {} prices updated, {} added, {} variants created",
        counters.models_processed,
        counters.prices_updated,
        counters.prices_added,
        counters.variants_created
    );
    Ok(())
}

/// Collect prices for tracked models by scraping JustBats product pages.
///
/// Per-model failures are logged and counted, not propagated; the run fails
/// only when every model fails.
///
/// # Errors
///
/// Returns an error if the model filter resolves to nothing, the client
/// cannot be constructed, or the collection run cannot be created.
pub(crate) async fn run_collect_justbats(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    model_filter: Option<i64>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let models = load_models_for_collect(pool, model_filter, limit).await?;
    if models.is_empty() {
        println!("no tracked models found; seed the catalog first");
        return Ok(());
    }

    let client = batdb_retail::JustBatsClient::new(
        &batdb_retail::JustBatsClientConfig::from_app_config(config),
    )?;
    let retailer =
        batdb_db::get_or_create_retailer(pool, "JustBats", Some("https://www.justbats.com"))
            .await?;

    let run = batdb_db::create_collection_run(pool, "justbats").await?;
    if let Err(e) = batdb_db::start_collection_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, &RunCounters::default(), format!("{e:#}")).await;
        return Err(e.into());
    }

    let mut counters = RunCounters::default();
    let mut failed_models: usize = 0;
    let model_count = models.len();

    for (index, model) in models.iter().enumerate() {
        match justbats::collect_model(pool, &client, retailer.id, model, &mut counters).await {
            Ok(ModelOutcome::Processed) => counters.models_processed += 1,
            Ok(ModelOutcome::Skipped) => {}
            Err(e) => {
                tracing::error!(model = %model.display_name(), error = %e, "model collection failed");
                counters.errors += 1;
                failed_models += 1;
            }
        }

        if index + 1 < model_count {
            tokio::time::sleep(Duration::from_millis(config.retail_model_delay_ms)).await;
        }
    }

    finish_run(pool, run.id, &counters, failed_models, model_count).await?;
    println!(
        "justbats run complete: {} models, {} prices updated, {} added, {} variants created",
        counters.models_processed,
        counters.prices_updated,
        counters.prices_added,
        counters.variants_created
    );
    Ok(())
}

async fn finish_run(
    pool: &sqlx::PgPool,
    run_id: i64,
    counters: &RunCounters,
    failed_models: usize,
    model_count: usize,
) -> anyhow::Result<()> {
    if failed_models > 0 {
        tracing::warn!(
            failed_models,
            total_models = model_count,
            "some models failed during collection"
        );
    }

    if failed_models == model_count {
        let message = format!("all {failed_models} models failed collection");
        fail_run_best_effort(pool, run_id, counters, message.clone()).await;
        anyhow::bail!("{message}");
    }

    if let Err(err) = batdb_db::complete_collection_run(pool, run_id, counters).await {
        let message = format!("{err:#}");
        fail_run_best_effort(pool, run_id, counters, message).await;
        return Err(err.into());
    }

    Ok(())
}
