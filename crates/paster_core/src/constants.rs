//! Shared constants used across Paster crates.

use std::time::Duration;

/// Default wait budget for acquiring the exclusive writer lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Default interval between background expiration sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Characters allowed in generated paste ids.
pub const PASTE_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
/// Length of every generated paste id.
pub const PASTE_ID_LENGTH: usize = 12;
/// Collision retries allowed inside one insert before giving up.
pub const PASTE_ID_MAX_ATTEMPTS: u32 = 30;

/// Seconds in one hour.
pub const PASTE_HOUR: u64 = 3_600;
/// Seconds in one day.
pub const PASTE_DAY: u64 = 86_400;
/// Seconds in one week.
pub const PASTE_WEEK: u64 = 604_800;
/// Seconds in one month, rounded to 30 days.
pub const PASTE_MONTH: u64 = 2_592_000;

/// Default number of pastes shown by recency and search listings.
pub const DEFAULT_LIST_LIMIT: usize = 10;

/// Environment variable holding the database path.
pub const DATABASE_PATH_ENV: &str = "PASTERD_DATABASE_PATH";
/// Environment variable holding the writer lock budget in seconds.
pub const LOCK_TIMEOUT_ENV: &str = "PASTERD_LOCK_TIMEOUT_SECS";
/// Environment variable holding the sweep interval in seconds.
pub const SWEEP_INTERVAL_ENV: &str = "PASTERD_SWEEP_INTERVAL_SECS";
/// Environment variable holding the log verbosity (0, 1 or 2).
pub const VERBOSITY_ENV: &str = "PASTERD_VERBOSITY";
