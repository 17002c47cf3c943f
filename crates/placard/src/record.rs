//! Core announcement types for placard.
//!
//! This module defines the persisted announcement record and its identity.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::markup;

/// Identity of an announcement record.
///
/// Ids are millisecond instants taken from the corrected clock at save
/// time, bumped when needed so they stay strictly increasing in a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// Wrap a raw id.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Id for a record created at `at`.
    #[must_use]
    pub fn from_instant<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        Self(at.timestamp_millis())
    }

    /// Id derived from `at` that is strictly greater than `newest`, if any.
    #[must_use]
    pub fn next_after<Tz: TimeZone>(at: &DateTime<Tz>, newest: Option<Self>) -> Self {
        let candidate = Self::from_instant(at);
        match newest {
            Some(newest) if candidate <= newest => Self(newest.0.saturating_add(1)),
            _ => candidate,
        }
    }

    /// The raw integer value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// A persisted announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementRecord {
    /// Announcement markup, stored verbatim.
    pub content: String,

    /// Whether replaying this announcement shows the clock.
    pub include_clock: bool,

    /// Human-readable save time, display only.
    pub timestamp: String,

    /// Lookup key for replay and delete.
    pub id: RecordId,
}

impl AnnouncementRecord {
    /// Build a record, rejecting content that is blank after trimming
    /// whitespace-equivalent markup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyContent`] for blank content.
    pub fn new(
        id: RecordId,
        content: impl Into<String>,
        include_clock: bool,
        timestamp: impl Into<String>,
    ) -> Result<Self> {
        let content = content.into();
        if markup::is_blank(&content) {
            return Err(Error::EmptyContent);
        }
        Ok(Self {
            content,
            include_clock,
            timestamp: timestamp.into(),
            id,
        })
    }

    /// Label describing the clock setting.
    #[must_use]
    pub fn clock_label(&self) -> &'static str {
        if self.include_clock {
            "With clock"
        } else {
            "Without clock"
        }
    }
}
