//! Rendered form of the history listing.
//!
//! Rendering never binds behavior directly: each item carries
//! [`HistoryAction`] values keyed by record id, and the session dispatches
//! them.

use std::fmt;

use serde::Serialize;

use crate::markup;
use crate::record::{AnnouncementRecord, RecordId};

/// Text shown instead of an empty list.
pub const EMPTY_HISTORY_PLACEHOLDER: &str = "No announcements in history";

/// Longest content preview shown in a listing line, in characters.
const PREVIEW_CHARS: usize = 60;

/// An action offered for a history item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "action", content = "id", rename_all = "snake_case")]
pub enum HistoryAction {
    /// Show the announcement again.
    Replay(RecordId),
    /// Remove the announcement, after confirmation.
    Delete(RecordId),
}

impl HistoryAction {
    /// The record this action targets.
    #[must_use]
    pub fn id(self) -> RecordId {
        match self {
            Self::Replay(id) | Self::Delete(id) => id,
        }
    }
}

/// One rendered history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryItem {
    /// Record id.
    pub id: RecordId,
    /// Save time, as stored.
    pub timestamp: String,
    /// Stored markup.
    pub content: String,
    /// Plain-text, single-line preview of the content.
    pub preview: String,
    /// "With clock" or "Without clock".
    pub clock_label: &'static str,
    /// Actions bound to this item.
    pub actions: [HistoryAction; 2],
}

impl HistoryItem {
    fn from_record(record: &AnnouncementRecord) -> Self {
        Self {
            id: record.id,
            timestamp: record.timestamp.clone(),
            content: record.content.clone(),
            preview: preview(&record.content),
            clock_label: record.clock_label(),
            actions: [
                HistoryAction::Replay(record.id),
                HistoryAction::Delete(record.id),
            ],
        }
    }
}

/// The history listing, either a placeholder or the items newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "items", rename_all = "snake_case")]
pub enum HistoryView {
    /// Nothing saved yet.
    Empty,
    /// Saved announcements, newest first.
    Items(Vec<HistoryItem>),
}

impl HistoryView {
    /// Render a collection.
    #[must_use]
    pub fn render(records: &[AnnouncementRecord]) -> Self {
        if records.is_empty() {
            Self::Empty
        } else {
            Self::Items(records.iter().map(HistoryItem::from_record).collect())
        }
    }

    /// Rendered items (empty for the placeholder state).
    #[must_use]
    pub fn items(&self) -> &[HistoryItem] {
        match self {
            Self::Empty => &[],
            Self::Items(items) => items,
        }
    }

    /// Whether `action` is bound to one of the listed items.
    #[must_use]
    pub fn offers(&self, action: HistoryAction) -> bool {
        self.items()
            .iter()
            .any(|item| item.actions.contains(&action))
    }
}

impl fmt::Display for HistoryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => writeln!(f, "{EMPTY_HISTORY_PLACEHOLDER}"),
            Self::Items(items) => {
                for item in items {
                    writeln!(
                        f,
                        "{:>15}  {:<22}  {:<13}  {}",
                        item.id, item.timestamp, item.clock_label, item.preview
                    )?;
                }
                Ok(())
            }
        }
    }
}

fn preview(content: &str) -> String {
    let joined = markup::to_plain_lines(content)
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" / ");

    if joined.chars().count() > PREVIEW_CHARS {
        let cut: String = joined.chars().take(PREVIEW_CHARS - 1).collect();
        format!("{cut}…")
    } else {
        joined
    }
}
