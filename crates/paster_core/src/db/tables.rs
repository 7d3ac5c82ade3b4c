//! redb table definitions shared by storage modules.

use redb::TableDefinition;

/// Canonical paste rows (`StoredPaste`, bincode-encoded) keyed by id.
pub const PASTES: TableDefinition<&str, &[u8]> = TableDefinition::new("pastes");

/// Public recency index: (reverse created millis, reverse insert sequence) -> id.
///
/// Holds visible pastes only. Iterating from the start yields newest first;
/// equal timestamps fall back to insertion order.
pub const PASTES_BY_CREATED: TableDefinition<(u64, u64), &str> =
    TableDefinition::new("pastes_by_created");

/// Expiry index: (expires-at millis, id). Sorted oldest deadline first.
pub const PASTES_BY_EXPIRY: TableDefinition<(u64, &str), ()> =
    TableDefinition::new("pastes_by_expiry");

/// Ids of swept pastes, kept so an id is never handed out twice.
pub const RETIRED_IDS: TableDefinition<&str, ()> = TableDefinition::new("retired_ids");

/// Store-level counters.
pub const STORE_META: TableDefinition<&str, u64> = TableDefinition::new("store_meta");

/// Key in [`STORE_META`] holding the next insert sequence number.
pub const NEXT_SEQUENCE_KEY: &str = "next_sequence";
