//! Announcement history.
//!
//! The history is an ordered, newest-first collection of
//! [`AnnouncementRecord`]s kept as a single versioned JSON document under
//! one storage key. Every mutation reads the stored document, applies the
//! change in memory and rewrites the whole document.

mod view;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::record::{AnnouncementRecord, RecordId};
use crate::storage::Storage;

pub use view::{HistoryAction, HistoryItem, HistoryView, EMPTY_HISTORY_PLACEHOLDER};

/// Version written into every stored history document.
pub const DOCUMENT_VERSION: u32 = 1;

/// The stored layout of the history collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct HistoryDocument {
    version: u32,
    records: Vec<AnnouncementRecord>,
}

/// Layouts accepted on read.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredHistory {
    Versioned(HistoryDocument),
    /// Bare array written before the document was versioned.
    Legacy(Vec<AnnouncementRecord>),
}

/// Decode a stored history value.
///
/// Anything that is not a readable history document decodes to an empty
/// collection.
fn decode(raw: &str) -> Vec<AnnouncementRecord> {
    match serde_json::from_str::<StoredHistory>(raw) {
        Ok(StoredHistory::Versioned(doc)) if doc.version == DOCUMENT_VERSION => doc.records,
        Ok(StoredHistory::Versioned(doc)) => {
            warn!(
                "Unsupported history document version {}, treating history as empty",
                doc.version
            );
            Vec::new()
        }
        Ok(StoredHistory::Legacy(records)) => {
            debug!("Read {} records from unversioned history", records.len());
            records
        }
        Err(e) => {
            warn!("Stored history is unreadable, treating it as empty: {}", e);
            Vec::new()
        }
    }
}

fn encode(records: &[AnnouncementRecord]) -> Result<String> {
    #[derive(Serialize)]
    struct DocumentRef<'a> {
        version: u32,
        records: &'a [AnnouncementRecord],
    }

    Ok(serde_json::to_string(&DocumentRef {
        version: DOCUMENT_VERSION,
        records,
    })?)
}

/// Durable, ordered announcement history.
#[derive(Debug)]
pub struct HistoryStore {
    storage: Storage,
    key: String,
    records: Vec<AnnouncementRecord>,
}

impl HistoryStore {
    /// Open the history stored under `key`, reading the current collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails. A missing or corrupt
    /// value is not an error.
    pub fn open(storage: Storage, key: impl Into<String>) -> Result<Self> {
        let mut store = Self {
            storage,
            key: key.into(),
            records: Vec::new(),
        };
        store.load()?;
        Ok(store)
    }

    /// Re-read the full collection from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn load(&mut self) -> Result<&[AnnouncementRecord]> {
        self.records = match self.storage.get(&self.key)? {
            Some(raw) => decode(&raw),
            None => Vec::new(),
        };
        Ok(&self.records)
    }

    /// The collection as last read or written, newest first.
    #[must_use]
    pub fn records(&self) -> &[AnnouncementRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The storage key the collection lives under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying storage.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Save a new announcement at the head of the history.
    ///
    /// `at` is the corrected creation time the id is derived from and
    /// `timestamp` its display form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyContent`] without touching storage when the
    /// content is blank, or a storage error if the write fails.
    pub fn save<Tz: TimeZone>(
        &mut self,
        content: &str,
        include_clock: bool,
        at: &DateTime<Tz>,
        timestamp: impl Into<String>,
    ) -> Result<RecordId> {
        // Validate before any read so a rejected save has no side effects
        let draft = AnnouncementRecord::new(RecordId::new(0), content, include_clock, timestamp)?;

        self.load()?;
        let newest = self.records.iter().map(|r| r.id).max();
        let record = AnnouncementRecord {
            id: RecordId::next_after(at, newest),
            ..draft
        };
        let id = record.id;

        self.records.insert(0, record);
        self.persist()?;

        info!("Saved announcement {} ({} in history)", id, self.records.len());
        Ok(id)
    }

    /// Look up a record by id.
    #[must_use]
    pub fn find(&self, id: RecordId) -> Option<&AnnouncementRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Delete the record with `id`.
    ///
    /// Returns `true` if a record was removed. When nothing matches, the
    /// stored collection is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn delete(&mut self, id: RecordId) -> Result<bool> {
        self.load()?;
        let Some(position) = self.records.iter().position(|r| r.id == id) else {
            debug!("No announcement with id {} to delete", id);
            return Ok(false);
        };

        self.records.remove(position);
        self.persist()?;

        info!("Deleted announcement {}", id);
        Ok(true)
    }

    /// Remove the whole persisted collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn clear_all(&mut self) -> Result<()> {
        let removed = self.storage.remove(&self.key)?;
        self.records.clear();
        if removed {
            info!("Cleared announcement history");
        }
        Ok(())
    }

    /// Render the current collection for listing.
    #[must_use]
    pub fn view(&self) -> HistoryView {
        HistoryView::render(&self.records)
    }

    fn persist(&self) -> Result<()> {
        let encoded = encode(&self.records)?;
        self.storage.set(&self.key, &encoded)
    }
}

impl From<HistoryStore> for Storage {
    fn from(store: HistoryStore) -> Self {
        store.storage
    }
}

/// Check whether an error means the content was rejected as blank.
#[must_use]
pub fn is_rejected(err: &Error) -> bool {
    matches!(err, Error::EmptyContent)
}
