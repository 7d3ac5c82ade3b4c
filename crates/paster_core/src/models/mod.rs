//! Paste records, insert payloads and listing filters.

/// Paste records and lifetimes.
pub mod paste;
/// Search filters.
pub mod search;
