//! Timestamp conversions for index keys.

use chrono::{DateTime, Utc};

/// Milliseconds since the Unix epoch, clamped at zero for pre-epoch instants.
pub(super) fn unix_millis(instant: DateTime<Utc>) -> u64 {
    instant.timestamp_millis().max(0) as u64
}

/// Key component that sorts newer instants first.
pub(super) fn reverse_millis(instant: DateTime<Utc>) -> u64 {
    u64::MAX - unix_millis(instant)
}

/// Deadline in epoch millis after which a paste may be swept.
pub(super) fn expiry_millis(created_at: DateTime<Utc>, duration_secs: u64) -> u64 {
    unix_millis(created_at).saturating_add(duration_secs.saturating_mul(1_000))
}
