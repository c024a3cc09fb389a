use clap::{Parser, Subcommand};

mod collect;

use batdb_db::RunCounters;

#[derive(Debug, Parser)]
#[command(name = "batdb-cli")]
#[command(about = "Baseball bat price tracker command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply migrations and seed the model catalog into the database
    Seed,
    /// Run a price collection pass against a retailer source
    Collect {
        #[command(subcommand)]
        source: collect::CollectCommands,
    },
    /// Print recent collection runs
    Report {
        /// Maximum number of runs to show
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = batdb_core::load_app_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    let cli = Cli::parse();

    let pool = batdb_db::connect_pool(
        &config.database_url,
        batdb_db::PoolConfig::from_app_config(&config),
    )
    .await?;

    match cli.command {
        Commands::Seed => run_seed(&pool, &config).await,
        Commands::Collect { source } => collect::run(&pool, &config, source).await,
        Commands::Report { limit } => run_report(&pool, limit).await,
    }
}

async fn run_seed(pool: &sqlx::PgPool, config: &batdb_core::AppConfig) -> anyhow::Result<()> {
    let applied = batdb_db::run_migrations(pool).await?;
    if applied > 0 {
        println!("applied {applied} migrations");
    }

    let catalog = batdb_core::load_catalog(&config.catalog_path)?;
    let seeded = batdb_db::seed_models(pool, &catalog.models).await?;
    println!("seeded {seeded} bat models from {}", config.catalog_path.display());
    Ok(())
}

async fn run_report(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = batdb_db::list_collection_runs(pool, limit).await?;
    if runs.is_empty() {
        println!("no collection runs recorded");
        return Ok(());
    }

    for run in runs {
        println!(
            "{} [{}] {} — models: {}, prices updated: {}, prices added: {}, \
             variants created: {}, errors: {}, skipped: {}",
            run.created_at.format("%Y-%m-%d %H:%M:%S"),
            run.source,
            run.status,
            run.models_processed,
            run.prices_updated,
            run.prices_added,
            run.variants_created,
            run.errors,
            run.skipped,
        );
        if let Some(message) = run.error_message {
            println!("    error: {message}");
        }
    }
    Ok(())
}

/// Best-effort transition of a run to `failed`; the original error is the one
/// worth surfacing, so failures here are only logged.
pub(crate) async fn fail_run_best_effort(
    pool: &sqlx::PgPool,
    run_id: i64,
    counters: &RunCounters,
    message: String,
) {
    if let Err(e) = batdb_db::fail_collection_run(pool, run_id, counters, &message).await {
        tracing::error!(run_id, error = %e, "failed to mark collection run as failed");
    }
}
