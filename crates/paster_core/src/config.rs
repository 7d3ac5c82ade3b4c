//! Configuration loading from environment variables.

use crate::constants::{
    DATABASE_PATH_ENV, DEFAULT_LOCK_TIMEOUT, DEFAULT_SWEEP_INTERVAL, LOCK_TIMEOUT_ENV,
    SWEEP_INTERVAL_ENV, VERBOSITY_ENV,
};
use crate::db::StoreOptions;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the paste store and its maintenance loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: String,
    pub lock_timeout: Duration,
    pub sweep_interval: Duration,
    /// 0 = warnings only, 1 = info, 2 = debug.
    pub verbosity: u8,
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    // Windows
    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    std::env::current_dir().ok()
}

fn default_db_path() -> String {
    let home = resolve_home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".cache")
        .join("paster")
        .join("paster.redb")
        .to_string_lossy()
        .to_string()
}

fn parse_seconds(value: Option<String>) -> Option<Duration> {
    value
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing
    /// or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            db_path: lookup(DATABASE_PATH_ENV)
                .filter(|path| !path.trim().is_empty())
                .map(expand_tilde)
                .unwrap_or_else(default_db_path),
            lock_timeout: parse_seconds(lookup(LOCK_TIMEOUT_ENV)).unwrap_or(DEFAULT_LOCK_TIMEOUT),
            sweep_interval: parse_seconds(lookup(SWEEP_INTERVAL_ENV))
                .filter(|interval| !interval.is_zero())
                .unwrap_or(DEFAULT_SWEEP_INTERVAL),
            verbosity: lookup(VERBOSITY_ENV)
                .and_then(|raw| raw.trim().parse::<u8>().ok())
                .map(|level| level.min(2))
                .unwrap_or(1),
        }
    }

    /// Store options derived from this configuration.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions::default().with_lock_timeout(self.lock_timeout)
    }

    /// Default `tracing` filter directive for the configured verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "paster=warn",
            1 => "paster=info",
            _ => "paster=debug",
        }
    }
}
