//! High-level runner API for seeding a database.
//!
//! Loads every data file under a directory, orders the tables so structural
//! parents come first, and writes all records in one atomic bulk write.
//!
//! This is the primary API for external users and for the CLI.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::SeedConfig;
use crate::db::pool::{self, PoolArgsBuilder};
use crate::db::{Store, sort_with_store};
use crate::error::SeedError;
use crate::loader::Loader;
use crate::model::Table;

/// Result of a completed seeding run
#[derive(Debug, Clone)]
pub struct SeedResult {
    pub run_id: String,
    /// `(table, record count)` in write order
    pub tables: Vec<(String, usize)>,
    /// Zero for dry runs
    pub records_written: usize,
    pub duration: Duration,
    pub dry_run: bool,
}

/// Run a complete seeding operation
///
/// # Example
///
/// ```no_run
/// use spanner_seeder::config::SeedOptions;
/// use spanner_seeder::runner::run_seed;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = SeedOptions {
///     project: Some("my-project".to_string()),
///     instance: Some("my-instance".to_string()),
///     database: Some("my-db".to_string()),
///     directory: Some("seeds".into()),
///     ..Default::default()
/// }
/// .validate()?;
///
/// let result = run_seed(config).await?;
/// println!("Wrote {} records", result.records_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_seed(config: SeedConfig) -> Result<SeedResult> {
    let tables = Loader::new()
        .load(&config.directory)
        .await
        .map_err(SeedError::from)?;

    // Create connection pool (or use test pool if provided)
    #[cfg(test)]
    let pool = match config.test_pool.clone() {
        Some(test_pool) => test_pool,
        None => connect(&config).await?,
    };

    #[cfg(not(test))]
    let pool = connect(&config).await?;

    let result = seed(&pool, tables, config.dry_run).await?;
    Ok(result)
}

async fn connect(config: &SeedConfig) -> Result<pool::Pool> {
    let mut builder = PoolArgsBuilder::default();
    builder
        .host(&config.host)
        .port(config.port)
        .database(config.database_path())
        .username(&config.username);
    if let Some(password) = &config.password {
        builder.password(password);
    }
    let pool_args = builder.build().context("Invalid connection settings")?;

    let pool = pool::pool(pool_args).await.map_err(SeedError::Connect)?;
    Ok(pool)
}

/// Order `tables` against the store's catalog and write them
///
/// With `dry_run` the order is computed but nothing is written.
pub async fn seed<S>(store: &S, mut tables: Vec<Table>, dry_run: bool) -> Result<SeedResult, SeedError>
where
    S: Store + ?Sized,
{
    let start = Instant::now();
    let run_id = Uuid::new_v4().to_string();

    if tables.is_empty() {
        warn!(run_id, "no seed tables found; nothing to write");
    }

    sort_with_store(store, &mut tables).await?;

    let record_count: usize = tables.iter().map(|t| t.records.len()).sum();
    let records_written = if dry_run {
        info!(run_id, records = record_count, "dry run; skipping write");
        0
    } else {
        store
            .bulk_write(&tables)
            .await
            .map_err(SeedError::Write)?;
        info!(run_id, records = record_count, "seeded {} tables", tables.len());
        record_count
    };

    Ok(SeedResult {
        run_id,
        tables: tables
            .iter()
            .map(|t| (t.name.clone(), t.records.len()))
            .collect(),
        records_written,
        duration: start.elapsed(),
        dry_run,
    })
}
