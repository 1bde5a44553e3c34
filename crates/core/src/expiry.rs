//! Retention windows: how long an upload stays downloadable.

use chrono::{DateTime, Days, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Retention window selected by the uploader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RetentionWindow {
    /// One hour. Also the fallback for unknown tokens.
    #[default]
    #[serde(rename = "1hr")]
    OneHour,
    /// Five hours.
    #[serde(rename = "5hr")]
    FiveHours,
    /// One calendar day.
    #[serde(rename = "1d")]
    OneDay,
}

impl RetentionWindow {
    /// Maps a client duration token to a window.
    ///
    /// Missing or unrecognized tokens select [`RetentionWindow::OneHour`]
    /// instead of failing the upload.
    #[must_use]
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("1hr") => Self::OneHour,
            Some("5hr") => Self::FiveHours,
            Some("1d") => Self::OneDay,
            other => {
                debug!(token = ?other, "Unrecognized duration token, using 1hr");
                Self::OneHour
            }
        }
    }

    /// The canonical client token for this window.
    #[must_use]
    pub const fn as_token(self) -> &'static str {
        match self {
            Self::OneHour => "1hr",
            Self::FiveHours => "5hr",
            Self::OneDay => "1d",
        }
    }

    /// Absolute expiry for an upload made at `now`.
    #[must_use]
    pub fn expires_at(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::OneHour => now + Duration::hours(1),
            Self::FiveHours => now + Duration::hours(5),
            Self::OneDay => now + Days::new(1),
        }
    }
}

/// Resolves a duration token to an absolute expiry time.
#[must_use]
pub fn resolve(token: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    RetentionWindow::from_token(token).expires_at(now)
}
