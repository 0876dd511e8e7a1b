//! Configuration types for reference collection and publishing.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::VERBOSITY_SILENT;

/// Errors raised while building configuration values at the caller boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid scheduled time {input:?}: expected an ISO-8601 datetime")]
    InvalidScheduleTime { input: String },
    #[error("Scheduled time {input:?} does not exist in the local time zone")]
    NonexistentLocalTime { input: String },
    #[error("Scheduled time {at} is not in the future (now {now})")]
    ScheduleInPast { at: DateTime<Utc>, now: DateTime<Utc> },
}

/// Configuration for the reference collector.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Content categories that are collected but never expanded.
    /// Typically navigational types that link back into the page tree.
    pub excluded_categories: FxHashSet<String>,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    pub verbosity: u8,
}

impl CollectorConfig {
    pub fn new<I, S>(excluded_categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded_categories: excluded_categories.into_iter().map(Into::into).collect(),
            verbosity: VERBOSITY_SILENT,
        }
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Whether entries of this category stop the traversal.
    #[inline]
    pub fn is_excluded(&self, category: Option<&str>) -> bool {
        category.is_some_and(|c| self.excluded_categories.contains(c))
    }
}

/// Options for one publish run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishOptions {
    /// Schedule every item for this time instead of publishing immediately.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    pub verbosity: u8,
}

impl PublishOptions {
    /// Publish everything right away.
    pub fn immediate() -> Self {
        Self::default()
    }

    /// Schedule everything for `at`, which must be later than `now`.
    pub fn schedule_at(at: DateTime<Utc>, now: DateTime<Utc>) -> Result<Self, ConfigError> {
        if at <= now {
            return Err(ConfigError::ScheduleInPast { at, now });
        }
        Ok(Self {
            scheduled_for: Some(at),
            verbosity: VERBOSITY_SILENT,
        })
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled_for.is_some()
    }
}

/// Parse a user-entered schedule time, reading offset-less input as local time.
pub fn parse_scheduled_for(input: &str) -> Result<DateTime<Utc>, ConfigError> {
    parse_scheduled_for_in(input, &Local)
}

/// Parse an ISO-8601 datetime and convert it to UTC.
///
/// Input with an explicit offset (RFC 3339) is converted directly. Input
/// without one (`YYYY-MM-DDTHH:MM[:SS]`, as produced by datetime pickers) is
/// interpreted in `tz`. Ambiguous local times resolve to the earlier instant.
pub fn parse_scheduled_for_in<Tz: TimeZone>(
    input: &str,
    tz: &Tz,
) -> Result<DateTime<Utc>, ConfigError> {
    let trimmed = input.trim();

    if let Ok(with_offset) = DateTime::<FixedOffset>::parse_from_rfc3339(trimmed) {
        return Ok(with_offset.with_timezone(&Utc));
    }

    let naive = trimmed
        .parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M"))
        .map_err(|_| ConfigError::InvalidScheduleTime {
            input: input.to_string(),
        })?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| ConfigError::NonexistentLocalTime {
            input: input.to_string(),
        })
}
