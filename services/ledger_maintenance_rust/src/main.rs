//! Ledger Maintenance Service (Rust)
//!
//! Operational commands against the match store:
//! - `backup`         archive the whole match ledger and reset it
//! - `health`         check store connectivity and report pool stats
//! - `columns <t>`    column names of an allow-listed table
//! - `sample <t>`     first rows of an allow-listed table, as JSON
//! - `init-schema`    create tables and indexes if absent
//!
//! Runs one command and exits; resolution traffic is served elsewhere.

use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use log::{info, warn};
use std::env;

use pairmatch_core::db::health::{check_pool_health, get_pool_stats};
use pairmatch_core::db::retry::execute_with_retry;
use pairmatch_core::db::{create_pool, DbPoolConfig};
use pairmatch_core::MatchStore;
use pairmatch_core::PgMatchStore;

#[derive(Debug, Clone)]
struct Config {
    database_url: String,
    backup_max_attempts: u32,
}

impl Config {
    fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL environment variable must be set")?,
            backup_max_attempts: env::var("BACKUP_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let mut args = env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "health".to_string());
    let table = args.next();

    let config = Config::from_env()?;
    let pool_config = DbPoolConfig::from_env_with_defaults(DbPoolConfig::maintenance());
    let pool = create_pool(&config.database_url, &pool_config).await?;
    let store = PgMatchStore::new(pool);

    match command.as_str() {
        "backup" => {
            let moved = execute_with_retry(
                || async { store.backup_and_reset().await.map_err(anyhow::Error::from) },
                config.backup_max_attempts,
            )
            .await?;
            if moved == 0 {
                warn!("Match ledger was already empty; nothing archived");
            } else {
                info!("Archived {} match rows and reset the ledger", moved);
            }
            println!("records_moved={}", moved);
        }
        "health" => {
            check_pool_health(store.pool()).await?;
            let stats = get_pool_stats(store.pool());
            info!(
                "Store is healthy (pool: {} total, {} idle, {} active)",
                stats.size,
                stats.idle,
                stats.active()
            );
            println!("status=ok");
        }
        "columns" => {
            let table = table.context("usage: ledger_maintenance columns <table>")?;
            let columns = store.table_columns(&table).await?;
            println!("{}", columns.join(","));
        }
        "sample" => {
            let table = table.context("usage: ledger_maintenance sample <table>")?;
            let rows = store.table_sample(&table).await?;
            for row in rows {
                println!("{}", serde_json::to_string(&row)?);
            }
        }
        "init-schema" => {
            store.ensure_schema().await?;
            info!("Schema is in place");
        }
        other => bail!("unknown command '{}' (expected backup|health|columns|sample|init-schema)", other),
    }

    Ok(())
}
