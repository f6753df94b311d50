//! Storage contract for the item registry and the append-only match ledger.
//!
//! The resolution engine only ever talks to a `MatchStore` handle injected
//! at construction time. Two implementations ship with the crate:
//! `PgMatchStore` (sqlx/Postgres, the production store) and `MemoryStore`
//! (in-process, for tests and demos).

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgMatchStore;

use async_trait::async_trait;

use crate::error::MatchError;
use crate::models::{Item, MatchRecord, NewMatchRecord, PairKey};

#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Insert a new item. Fails with `Duplicate` when the id is already
    /// registered (no write performed). Duplicate titles are not pre-checked;
    /// the schema's uniqueness constraint surfaces as `Constraint`.
    async fn insert_item(&self, item: &Item) -> Result<(), MatchError>;

    /// Fetch the current titles for both ids in a single existence query.
    /// Returns `None` unless exactly the two distinct requested ids exist,
    /// otherwise the titles in requested order.
    async fn titles_for_pair(
        &self,
        id_a: &str,
        id_b: &str,
    ) -> Result<Option<(String, String)>, MatchError>;

    /// Latest ledger row for the unordered pair: `updated_at` descending,
    /// row id descending on ties.
    async fn latest_for_pair(&self, pair: &PairKey) -> Result<Option<MatchRecord>, MatchError>;

    /// Append one decision row. The store assigns the id; rows are never
    /// updated in place.
    async fn append_record(&self, record: NewMatchRecord) -> Result<MatchRecord, MatchError>;

    /// Fetch one ledger row by id.
    async fn get_record(&self, id: i64) -> Result<Option<MatchRecord>, MatchError>;

    /// Number of live ledger rows for the pair (auditing).
    async fn count_for_pair(&self, pair: &PairKey) -> Result<u64, MatchError>;

    /// Copy every live ledger row into the archive, then purge the ledger,
    /// as one all-or-nothing operation. Returns the number of rows moved;
    /// an already-empty ledger returns 0 without touching storage.
    async fn backup_and_reset(&self) -> Result<u64, MatchError>;
}
