//! In-memory match store for tests and demos.
//!
//! Mirrors the Postgres store's observable behavior: id + title uniqueness,
//! latest-by-pair ordering with the id tie-break, max+1 row id assignment,
//! and the all-or-nothing archive workflow.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

use async_trait::async_trait;

use super::MatchStore;
use crate::error::MatchError;
use crate::models::{Item, MatchRecord, NewMatchRecord, PairKey};

/// Archive row: the copied record plus the restore stamp (always `None`
/// until a restore workflow exists).
#[derive(Debug, Clone)]
pub struct ArchivedMatch {
    pub record: MatchRecord,
    pub restored_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct State {
    items: HashMap<String, Item>,
    ledger: Vec<MatchRecord>,
    archive: Vec<ArchivedMatch>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of archived rows (test observability).
    pub fn archived_count(&self) -> usize {
        self.state.read().archive.len()
    }

    /// Preload a ledger row verbatim, bypassing the engine. Used by tests
    /// that need a specific prior state (e.g. an `in_progress` row).
    pub fn seed_record(&self, record: MatchRecord) {
        self.state.write().ledger.push(record);
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn insert_item(&self, item: &Item) -> Result<(), MatchError> {
        let mut state = self.state.write();
        if state.items.contains_key(&item.id) {
            return Err(MatchError::Duplicate(item.id.clone()));
        }
        if state.items.values().any(|i| i.title == item.title) {
            // Same failure surface as the schema's UNIQUE(title).
            return Err(MatchError::Constraint(format!(
                "duplicate title '{}'",
                item.title
            )));
        }
        state.items.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn titles_for_pair(
        &self,
        id_a: &str,
        id_b: &str,
    ) -> Result<Option<(String, String)>, MatchError> {
        if id_a == id_b {
            // Same distinctness rule as the Pg query's two-row requirement.
            return Ok(None);
        }
        let state = self.state.read();
        let title_a = state.items.get(id_a).map(|i| i.title.clone());
        let title_b = state.items.get(id_b).map(|i| i.title.clone());
        Ok(title_a.zip(title_b))
    }

    async fn latest_for_pair(&self, pair: &PairKey) -> Result<Option<MatchRecord>, MatchError> {
        let state = self.state.read();
        Ok(state
            .ledger
            .iter()
            .filter(|r| &r.pair_key() == pair)
            .max_by_key(|r| (r.updated_at, r.id))
            .cloned())
    }

    async fn append_record(&self, record: NewMatchRecord) -> Result<MatchRecord, MatchError> {
        let mut state = self.state.write();
        let id = state.ledger.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let row = MatchRecord {
            id,
            item_id_1: record.item_id_1,
            title_1: record.title_1,
            item_id_2: record.item_id_2,
            title_2: record.title_2,
            score: record.score,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        state.ledger.push(row.clone());
        Ok(row)
    }

    async fn get_record(&self, id: i64) -> Result<Option<MatchRecord>, MatchError> {
        let state = self.state.read();
        Ok(state.ledger.iter().find(|r| r.id == id).cloned())
    }

    async fn count_for_pair(&self, pair: &PairKey) -> Result<u64, MatchError> {
        let state = self.state.read();
        Ok(state.ledger.iter().filter(|r| &r.pair_key() == pair).count() as u64)
    }

    async fn backup_and_reset(&self) -> Result<u64, MatchError> {
        let mut state = self.state.write();
        if state.ledger.is_empty() {
            return Ok(0);
        }
        let moved = state.ledger.len() as u64;
        let archived: Vec<ArchivedMatch> = state
            .ledger
            .drain(..)
            .map(|record| ArchivedMatch {
                record,
                restored_at: None,
            })
            .collect();
        state.archive.extend(archived);
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchStatus;

    fn record(id: i64, a: &str, b: &str, updated_at: DateTime<Utc>) -> MatchRecord {
        MatchRecord {
            id,
            item_id_1: a.to_string(),
            title_1: format!("title {}", a),
            item_id_2: b.to_string(),
            title_2: format!("title {}", b),
            score: 0.5,
            status: MatchStatus::Negative,
            created_at: updated_at,
            updated_at,
        }
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected_without_overwrite() {
        let store = MemoryStore::new();
        store.insert_item(&Item::new("MLA1", "first")).await.unwrap();
        let err = store.insert_item(&Item::new("MLA1", "second")).await.unwrap_err();
        assert!(matches!(err, MatchError::Duplicate(_)));

        store.insert_item(&Item::new("MLA2", "other")).await.unwrap();
        let titles = store.titles_for_pair("MLA1", "MLA2").await.unwrap();
        assert_eq!(titles, Some(("first".to_string(), "other".to_string())));
    }

    #[tokio::test]
    async fn test_duplicate_title_is_a_constraint_failure() {
        let store = MemoryStore::new();
        store.insert_item(&Item::new("MLA1", "same title")).await.unwrap();
        let err = store.insert_item(&Item::new("MLA2", "same title")).await.unwrap_err();
        assert!(matches!(err, MatchError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_row_ids_are_max_plus_one() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.seed_record(record(41, "a", "b", now));
        let appended = store
            .append_record(NewMatchRecord {
                item_id_1: "a".into(),
                title_1: "ta".into(),
                item_id_2: "c".into(),
                title_2: "tc".into(),
                score: 0.1,
                status: MatchStatus::Negative,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        assert_eq!(appended.id, 42);
    }

    #[tokio::test]
    async fn test_latest_ties_break_by_id_descending() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.seed_record(record(1, "a", "b", now));
        store.seed_record(record(2, "b", "a", now));

        let latest = store
            .latest_for_pair(&PairKey::new("a", "b"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, 2);
    }

    #[tokio::test]
    async fn test_backup_and_reset_moves_everything_once() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.seed_record(record(1, "a", "b", now));
        store.seed_record(record(2, "a", "c", now));

        assert_eq!(store.backup_and_reset().await.unwrap(), 2);
        assert_eq!(store.archived_count(), 2);
        assert_eq!(store.count_for_pair(&PairKey::new("a", "b")).await.unwrap(), 0);

        // Second call: nothing left to move.
        assert_eq!(store.backup_and_reset().await.unwrap(), 0);
        assert_eq!(store.archived_count(), 2);
    }
}
