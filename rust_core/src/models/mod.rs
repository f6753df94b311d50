// Shared models for Pairmatch: registered items, ledger rows and decisions.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Items (the registry side)
// ============================================================================

/// A registered marketplace item. `title` is unique across the registry;
/// the constraint lives in the schema, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// Match status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Positive,
    InProgress,
    Negative,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Positive => "positive",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Negative => "negative",
        }
    }

    /// Parse the stored text form. Returns `None` for anything outside the
    /// status domain so stores can reject corrupted rows instead of guessing.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "positive" => Some(MatchStatus::Positive),
            "in_progress" => Some(MatchStatus::InProgress),
            "negative" => Some(MatchStatus::Negative),
            _ => None,
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, MatchStatus::Positive)
    }
}

// ============================================================================
// Pair key (normalized unordered pair identifier)
// ============================================================================

/// Order-independent identifier for an item pair: `min(a,b) + ":" + max(a,b)`.
/// Ledger lookups and the engine's pair locks both key on this, so the
/// stored column order of the two ids never matters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey(String);

impl PairKey {
    pub fn new(id_a: &str, id_b: &str) -> Self {
        if id_a <= id_b {
            PairKey(format!("{}:{}", id_a, id_b))
        } else {
            PairKey(format!("{}:{}", id_b, id_a))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Ledger rows
// ============================================================================

/// One resolution decision between an unordered item pair, as persisted.
/// Rows are append-only: never updated or deleted in place. The effective
/// decision for a pair is the row with the latest `updated_at` (ties broken
/// by `id` descending).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: i64,
    pub item_id_1: String,
    pub title_1: String,
    pub item_id_2: String,
    pub title_2: String,
    pub score: f64,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.item_id_1, &self.item_id_2)
    }
}

/// Insert shape for a ledger append; the store assigns the row id.
#[derive(Debug, Clone)]
pub struct NewMatchRecord {
    pub item_id_1: String,
    pub title_1: String,
    pub item_id_2: String,
    pub title_2: String,
    pub score: f64,
    pub status: MatchStatus,
    /// Preserved from the prior row when the pair was seen before
    /// (first-seen semantics across recomputation).
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewMatchRecord {
    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.item_id_1, &self.item_id_2)
    }
}

// ============================================================================
// Resolution decisions
// ============================================================================

/// Structured outcome of one resolution: the effective ledger row plus what
/// the engine found and did to produce it.
#[derive(Debug, Clone, Serialize)]
pub struct MatchDecision {
    /// Status of the latest prior row for the pair, if one existed.
    pub prior_status: Option<MatchStatus>,
    /// The effective decision row (pre-existing positive, or freshly appended).
    pub record: MatchRecord,
    /// Human-readable recommended-action note for the caller.
    pub action: String,
}

impl MatchDecision {
    pub fn had_prior(&self) -> bool {
        self.prior_status.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Pair key tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_pair_key_is_order_independent() {
        assert_eq!(PairKey::new("MLA1", "MLA2"), PairKey::new("MLA2", "MLA1"));
        assert_eq!(PairKey::new("MLA1", "MLA2").as_str(), "MLA1:MLA2");
    }

    #[test]
    fn test_pair_key_same_id_twice() {
        // The engine rejects self-pairs before keying; the key itself is total.
        assert_eq!(PairKey::new("x", "x").as_str(), "x:x");
    }

    // -------------------------------------------------------------------------
    // Status tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_status_text_round_trip() {
        for status in [
            MatchStatus::Positive,
            MatchStatus::InProgress,
            MatchStatus::Negative,
        ] {
            assert_eq!(MatchStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_status_rejects_unknown_text() {
        assert_eq!(MatchStatus::parse("maybe"), None);
        assert_eq!(MatchStatus::parse(""), None);
    }

    #[test]
    fn test_record_pair_key_matches_either_order() {
        let now = Utc::now();
        let rec = MatchRecord {
            id: 1,
            item_id_1: "MLA9".into(),
            title_1: "a".into(),
            item_id_2: "MLA1".into(),
            title_2: "b".into(),
            score: 0.5,
            status: MatchStatus::Negative,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(rec.pair_key(), PairKey::new("MLA1", "MLA9"));
    }
}
