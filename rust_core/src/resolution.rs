//! Match resolution engine.
//!
//! Orchestrates one resolution: registry existence check, bidirectional
//! lookup of the latest prior decision, similarity scoring when a fresh
//! decision is needed, threshold classification, and the append-only write.
//! A confirmed (`positive`) prior decision short-circuits with zero writes;
//! any non-positive prior decision is eligible for recomputation.
//!
//! The engine owns no storage: a `MatchStore` handle is injected at
//! construction, so every caller (and every test) gets its own isolated
//! store. Concurrent resolutions of the same unordered pair serialize on a
//! per-pair lock so the lookup-then-append sequence cannot interleave.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::MatchError;
use crate::models::{Item, MatchDecision, MatchRecord, MatchStatus, NewMatchRecord, PairKey};
use crate::similarity::{self, SimilarityAlgorithm};
use crate::store::MatchStore;

pub struct MatchEngine<S: MatchStore> {
    store: S,
    // One entry per pair ever resolved through this engine; entries are a
    // pointer each and pair cardinality is bounded by the registry size.
    pair_locks: Mutex<FxHashMap<PairKey, Arc<AsyncMutex<()>>>>,
}

impl<S: MatchStore> MatchEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            pair_locks: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register a new item. Re-registering an existing id is a no-op that
    /// reports the conflict; titles are left to the schema's uniqueness
    /// constraint.
    pub async fn register(&self, id: &str, title: &str) -> Result<Item, MatchError> {
        let item = Item::new(id, title);
        self.store.insert_item(&item).await?;
        Ok(item)
    }

    /// Resolve whether two registered items denote the same product.
    ///
    /// Fails with `InvalidPair` when both ids are equal (checked before any
    /// storage access) and `NotFound` when the single existence query does
    /// not return exactly the two requested ids.
    pub async fn resolve(
        &self,
        id_a: &str,
        id_b: &str,
        threshold: f64,
        algorithm: SimilarityAlgorithm,
    ) -> Result<MatchDecision, MatchError> {
        if id_a == id_b {
            return Err(MatchError::InvalidPair(id_a.to_string()));
        }

        let pair = PairKey::new(id_a, id_b);
        let lock = self.lock_for(&pair);
        let _guard = lock.lock().await;

        // Existence check and title fetch in one query.
        let (title_a, title_b) = self
            .store
            .titles_for_pair(id_a, id_b)
            .await?
            .ok_or_else(|| MatchError::NotFound(format!("item(s) '{}', '{}'", id_a, id_b)))?;

        let prior = self.store.latest_for_pair(&pair).await?;

        if let Some(existing) = &prior {
            if existing.status.is_positive() {
                // Confirmed match on file: zero writes.
                debug!("pair {} already confirmed, returning as-is", pair.as_str());
                return Ok(MatchDecision {
                    prior_status: Some(MatchStatus::Positive),
                    record: existing.clone(),
                    action: "pair already confirmed; no recomputation needed".to_string(),
                });
            }
        }

        let score = similarity::score(&title_a, &title_b, algorithm);
        let status = if score >= threshold {
            MatchStatus::Positive
        } else {
            MatchStatus::Negative
        };

        let now = Utc::now();
        // First-seen semantics: recomputations keep the original created_at.
        let created_at = prior.as_ref().map(|p| p.created_at).unwrap_or(now);
        let prior_status = prior.as_ref().map(|p| p.status);

        let record = self
            .store
            .append_record(NewMatchRecord {
                item_id_1: id_a.to_string(),
                title_1: title_a,
                item_id_2: id_b.to_string(),
                title_2: title_b,
                score,
                status,
                created_at,
                updated_at: now,
            })
            .await?;

        debug!(
            "pair {} scored {:.5} with {} -> {}",
            pair.as_str(),
            score,
            algorithm.as_str(),
            status.as_str()
        );

        Ok(MatchDecision {
            prior_status,
            record,
            action: recommended_action(prior_status, status),
        })
    }

    /// Register two brand new items whose titles are the given texts and
    /// resolve them immediately. Ids are minted, so the only prior state
    /// that can exist is a title collision, which surfaces from the schema.
    pub async fn match_texts(
        &self,
        text_1: &str,
        text_2: &str,
        threshold: f64,
        algorithm: SimilarityAlgorithm,
    ) -> Result<MatchDecision, MatchError> {
        let id_a = Uuid::new_v4().to_string();
        let id_b = Uuid::new_v4().to_string();
        self.register(&id_a, text_1).await?;
        self.register(&id_b, text_2).await?;
        self.resolve(&id_a, &id_b, threshold, algorithm).await
    }

    /// Fetch one ledger row by id.
    pub async fn get_match(&self, id: i64) -> Result<MatchRecord, MatchError> {
        self.store
            .get_record(id)
            .await?
            .ok_or_else(|| MatchError::NotFound(format!("match {}", id)))
    }

    /// Archive the whole ledger and reset it. Returns rows moved.
    pub async fn backup_and_reset(&self) -> Result<u64, MatchError> {
        self.store.backup_and_reset().await
    }

    fn lock_for(&self, pair: &PairKey) -> Arc<AsyncMutex<()>> {
        let mut locks = self.pair_locks.lock();
        locks.entry(pair.clone()).or_default().clone()
    }
}

fn recommended_action(prior: Option<MatchStatus>, status: MatchStatus) -> String {
    let verdict = match status {
        MatchStatus::Positive => "treat the items as the same product",
        _ => "keep the items separate",
    };
    match prior {
        None => format!("first decision for the pair; {}", verdict),
        Some(p) => format!("recomputed after prior '{}' decision; {}", p.as_str(), verdict),
    }
}
