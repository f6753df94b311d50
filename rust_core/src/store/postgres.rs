//! Postgres-backed match store.
//!
//! All queries are parameterized. The only dynamic identifiers are table
//! names for the introspection helpers, and those must pass the fixed
//! allow-list first.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use super::MatchStore;
use crate::error::MatchError;
use crate::models::{Item, MatchRecord, MatchStatus, NewMatchRecord, PairKey};

/// Tables reachable through the introspection helpers.
pub const ALLOWED_TABLES: &[&str] = &["items", "match_ledger", "match_ledger_archive"];

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS items (
        id          TEXT PRIMARY KEY,
        title       TEXT NOT NULL UNIQUE,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS match_ledger (
        id          BIGSERIAL PRIMARY KEY,
        pair_key    TEXT NOT NULL,
        item_id_1   TEXT NOT NULL REFERENCES items(id),
        title_1     TEXT NOT NULL,
        item_id_2   TEXT NOT NULL REFERENCES items(id),
        title_2     TEXT NOT NULL,
        score       DOUBLE PRECISION NOT NULL,
        status      TEXT NOT NULL CHECK (status IN ('positive', 'in_progress', 'negative')),
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_match_ledger_pair_latest
        ON match_ledger (pair_key, updated_at DESC, id DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS match_ledger_archive (
        id          BIGSERIAL PRIMARY KEY,
        pair_key    TEXT NOT NULL,
        item_id_1   TEXT NOT NULL,
        title_1     TEXT NOT NULL,
        item_id_2   TEXT NOT NULL,
        title_2     TEXT NOT NULL,
        score       DOUBLE PRECISION NOT NULL,
        status      TEXT NOT NULL CHECK (status IN ('positive', 'in_progress', 'negative')),
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL,
        restored_at TIMESTAMPTZ
    )
    "#,
];

pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the registry, ledger and archive tables plus the
    /// latest-by-pair index if they are not present yet.
    pub async fn ensure_schema(&self) -> Result<(), MatchError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("match store schema ready");
        Ok(())
    }

    /// Column names for an allow-listed table, in ordinal position order.
    pub async fn table_columns(&self, table: &str) -> Result<Vec<String>, MatchError> {
        ensure_allowed_table(table)?;
        let rows = sqlx::query(
            "SELECT column_name FROM information_schema.columns \
             WHERE table_name = $1 ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            columns.push(row.try_get::<String, _>("column_name")?);
        }
        Ok(columns)
    }

    /// First three rows of an allow-listed table, as JSON objects.
    pub async fn table_sample(&self, table: &str) -> Result<Vec<serde_json::Value>, MatchError> {
        ensure_allowed_table(table)?;
        // Identifier comes from the allow-list above, never from raw input.
        let sql = format!(
            "SELECT row_to_json(t)::text AS row_json FROM {} AS t LIMIT 3",
            table
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut samples = Vec::with_capacity(rows.len());
        for row in &rows {
            let text: String = row.try_get("row_json")?;
            let value = serde_json::from_str(&text)
                .map_err(|e| MatchError::Storage(sqlx::Error::Decode(Box::new(e))))?;
            samples.push(value);
        }
        Ok(samples)
    }

    fn record_from_row(row: &PgRow) -> Result<MatchRecord, MatchError> {
        let status_text: String = row.try_get("status")?;
        let status = MatchStatus::parse(&status_text).ok_or_else(|| {
            MatchError::Constraint(format!("unknown match status '{}'", status_text))
        })?;
        Ok(MatchRecord {
            id: row.try_get("id")?,
            item_id_1: row.try_get("item_id_1")?,
            title_1: row.try_get("title_1")?,
            item_id_2: row.try_get("item_id_2")?,
            title_2: row.try_get("title_2")?,
            score: row.try_get("score")?,
            status,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

fn ensure_allowed_table(table: &str) -> Result<(), MatchError> {
    if ALLOWED_TABLES.contains(&table) {
        Ok(())
    } else {
        Err(MatchError::NotFound(format!("table '{}'", table)))
    }
}

/// Map unique-constraint violations (duplicate title) to the typed
/// constraint error; everything else stays a storage failure.
fn map_insert_error(e: sqlx::Error) -> MatchError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.code().as_deref() == Some("23505") {
            return MatchError::Constraint(db_err.message().to_string());
        }
    }
    MatchError::Storage(e)
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn insert_item(&self, item: &Item) -> Result<(), MatchError> {
        let result = sqlx::query(
            "INSERT INTO items (id, title, created_at, updated_at) \
             VALUES ($1, $2, $3, $4) ON CONFLICT (id) DO NOTHING",
        )
        .bind(&item.id)
        .bind(&item.title)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        if result.rows_affected() == 0 {
            return Err(MatchError::Duplicate(item.id.clone()));
        }
        debug!("registered item {}", item.id);
        Ok(())
    }

    async fn titles_for_pair(
        &self,
        id_a: &str,
        id_b: &str,
    ) -> Result<Option<(String, String)>, MatchError> {
        let rows = sqlx::query("SELECT id, title FROM items WHERE id = $1 OR id = $2")
            .bind(id_a)
            .bind(id_b)
            .fetch_all(&self.pool)
            .await?;

        if rows.len() != 2 {
            return Ok(None);
        }

        let mut title_a = None;
        let mut title_b = None;
        for row in &rows {
            let id: String = row.try_get("id")?;
            let title: String = row.try_get("title")?;
            if id == id_a {
                title_a = Some(title);
            } else if id == id_b {
                title_b = Some(title);
            }
        }
        Ok(title_a.zip(title_b))
    }

    async fn latest_for_pair(&self, pair: &PairKey) -> Result<Option<MatchRecord>, MatchError> {
        let row = sqlx::query(
            "SELECT id, item_id_1, title_1, item_id_2, title_2, score, status, \
                    created_at, updated_at \
             FROM match_ledger WHERE pair_key = $1 \
             ORDER BY updated_at DESC, id DESC LIMIT 1",
        )
        .bind(pair.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::record_from_row(&r)).transpose()
    }

    async fn append_record(&self, record: NewMatchRecord) -> Result<MatchRecord, MatchError> {
        let pair = record.pair_key();
        let row = sqlx::query(
            "INSERT INTO match_ledger \
                 (pair_key, item_id_1, title_1, item_id_2, title_2, score, status, \
                  created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id",
        )
        .bind(pair.as_str())
        .bind(&record.item_id_1)
        .bind(&record.title_1)
        .bind(&record.item_id_2)
        .bind(&record.title_2)
        .bind(record.score)
        .bind(record.status.as_str())
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = row.try_get("id")?;
        debug!("appended ledger row {} for pair {}", id, pair.as_str());

        Ok(MatchRecord {
            id,
            item_id_1: record.item_id_1,
            title_1: record.title_1,
            item_id_2: record.item_id_2,
            title_2: record.title_2,
            score: record.score,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    async fn get_record(&self, id: i64) -> Result<Option<MatchRecord>, MatchError> {
        let row = sqlx::query(
            "SELECT id, item_id_1, title_1, item_id_2, title_2, score, status, \
                    created_at, updated_at \
             FROM match_ledger WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::record_from_row(&r)).transpose()
    }

    async fn count_for_pair(&self, pair: &PairKey) -> Result<u64, MatchError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM match_ledger WHERE pair_key = $1")
            .bind(pair.as_str())
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n as u64)
    }

    async fn backup_and_reset(&self) -> Result<u64, MatchError> {
        let mut tx = self.pool.begin().await?;

        // Blocks concurrent appends for the whole copy-then-delete window.
        sqlx::query("LOCK TABLE match_ledger IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query("SELECT COUNT(*) AS n FROM match_ledger")
            .fetch_one(&mut *tx)
            .await?;
        let live: i64 = row.try_get("n")?;
        if live == 0 {
            tx.rollback().await?;
            return Ok(0);
        }

        let moved = sqlx::query(
            "INSERT INTO match_ledger_archive \
                 (pair_key, item_id_1, title_1, item_id_2, title_2, score, status, \
                  created_at, updated_at, restored_at) \
             SELECT pair_key, item_id_1, title_1, item_id_2, title_2, score, status, \
                    created_at, updated_at, NULL \
             FROM match_ledger",
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM match_ledger").execute(&mut *tx).await?;
        tx.commit().await?;

        info!("archived {} match ledger rows and reset the table", moved);
        Ok(moved)
    }
}
