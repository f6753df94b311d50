//! Pairmatch Core - item registry, similarity scoring and match resolution.
//!
//! This crate provides:
//! - Textual similarity scoring between item titles (edit distance, Gestalt
//!   ratio, Jaccard, cosine) behind a by-name selector
//! - An append-only match ledger with order-independent pair lookup
//! - The match resolution engine: existence check, short-circuit on
//!   confirmed matches, recomputation of non-positive ones, threshold
//!   classification, append-only persistence
//! - A store contract with Postgres and in-memory backends
//! - The ledger backup/reset workflow
//! - Connection pooling, retry and health-check plumbing

pub mod db;
pub mod error;
pub mod models;
pub mod resolution;
pub mod similarity;
pub mod store;

pub use error::MatchError;
pub use models::{Item, MatchDecision, MatchRecord, MatchStatus, NewMatchRecord, PairKey};
pub use resolution::MatchEngine;
pub use similarity::{score, SimilarityAlgorithm};
pub use store::{MatchStore, MemoryStore, PgMatchStore};
