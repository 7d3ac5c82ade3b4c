//! Core persistence engine for Paster (config, storage, models).

/// Time sources used for timestamps and expiry.
pub mod clock;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants.
pub mod constants;
/// Paste store and expiration sweep.
pub mod db;
/// Error taxonomy for storage operations.
pub mod error;
/// Data models for pastes and search filters.
pub mod models;
/// Paste id generation.
pub mod naming;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use constants::*;
pub use db::{Store, StoreOptions, SweepReport, Sweeper, SweeperHandle};
pub use error::{StorageFault, StoreError};
pub use models::paste::{Lifetime, NewPaste, Paste};
pub use models::search::{SearchFilter, TextFilter};
pub use naming::IdPolicy;
