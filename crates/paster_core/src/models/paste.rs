//! Paste-related data models and lifetime helpers.

use crate::constants::{PASTE_DAY, PASTE_HOUR, PASTE_MONTH, PASTE_WEEK};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A stored paste as returned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Paste {
    pub id: String,
    pub title: String,
    pub author: String,
    pub language: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    /// Requested lifetime in seconds, counted from `created_at`.
    pub duration: u64,
    pub visible: bool,
}

/// Caller-supplied fields for a new paste.
///
/// The store assigns `id` and `created_at` at insert time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewPaste {
    pub title: String,
    pub author: String,
    pub language: String,
    pub code: String,
    /// Requested lifetime in seconds.
    pub duration: u64,
    pub visible: bool,
}

impl NewPaste {
    /// Build a visible paste that lives for `lifetime`.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        language: impl Into<String>,
        code: impl Into<String>,
        lifetime: Lifetime,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            language: language.into(),
            code: code.into(),
            duration: lifetime.as_secs(),
            visible: true,
        }
    }

    /// Mark the paste as hidden from recency listings and search.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Override the lifetime with an explicit number of seconds.
    pub fn with_duration(mut self, seconds: u64) -> Self {
        self.duration = seconds;
        self
    }

    pub(crate) fn into_paste(self, id: String, created_at: DateTime<Utc>) -> Paste {
        Paste {
            id,
            title: self.title,
            author: self.author,
            language: self.language,
            code: self.code,
            created_at,
            duration: self.duration,
            visible: self.visible,
        }
    }
}

impl Paste {
    /// Instant at which the paste becomes eligible for sweeping.
    pub fn expires_at(&self) -> DateTime<Utc> {
        let lifetime = i64::try_from(self.duration)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        self.created_at
            .checked_add_signed(lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// `true` once `now - created_at >= duration`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    /// Remaining lifetime at `now`, zero once expired.
    pub fn time_left(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at() - now).max(Duration::zero())
    }
}

/// Named lifetimes offered by the paste form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifetime {
    Hour,
    Day,
    Week,
    #[default]
    Month,
}

impl Lifetime {
    /// All lifetimes, shortest first.
    pub const ALL: [Lifetime; 4] = [Self::Hour, Self::Day, Self::Week, Self::Month];

    /// Lifetime length in seconds.
    pub fn as_secs(self) -> u64 {
        match self {
            Self::Hour => PASTE_HOUR,
            Self::Day => PASTE_DAY,
            Self::Week => PASTE_WEEK,
            Self::Month => PASTE_MONTH,
        }
    }

    /// Form keyword for this lifetime.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Parse a form keyword, falling back to [`Lifetime::Month`] for anything
    /// unrecognized.
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lifetime {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lifetime| lifetime.as_str() == normalized)
            .ok_or_else(|| format!("unknown lifetime '{}'", value))
    }
}

/// Render a remaining lifetime the way paste pages show it.
///
/// Under an hour the value is in minutes, under a day in hours, otherwise in
/// days. Values are truncated.
pub fn format_time_left(left: Duration) -> String {
    let seconds = left.num_seconds().max(0) as u64;
    if seconds < PASTE_HOUR {
        format!("{} minute(s)", seconds / 60)
    } else if seconds < PASTE_DAY {
        format!("{} hour(s)", seconds / PASTE_HOUR)
    } else {
        format!("{} day(s)", seconds / PASTE_DAY)
    }
}
