//! Rolling print activity log.
//!
//! Newest entry first; the persisted list never exceeds `MAX_LOG_ENTRIES`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use labeldesk_core::{JsonStorage, Observable, PrintJobId, StorageResult, SubscriptionId, keys};

use crate::template::PrintTemplate;

pub const MAX_LOG_ENTRIES: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintLogEntry {
    pub id: PrintJobId,
    pub template: PrintTemplate,
    pub barcode: String,
    pub copies: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    pub printed_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct PrintLogStore {
    storage: JsonStorage,
    capacity: usize,
    entries: Observable<Vec<PrintLogEntry>>,
}

impl PrintLogStore {
    pub fn new(storage: JsonStorage) -> Self {
        Self::with_capacity(storage, MAX_LOG_ENTRIES)
    }

    pub fn with_capacity(storage: JsonStorage, capacity: usize) -> Self {
        let mut initial: Vec<PrintLogEntry> = storage.get_or_default(keys::PRINT_LOG);
        initial.truncate(capacity);
        Self {
            storage,
            capacity,
            entries: Observable::new(initial),
        }
    }

    /// Prepend an entry, dropping the oldest beyond capacity.
    pub fn record(&self, entry: PrintLogEntry) -> StorageResult<()> {
        self.entries.try_update(|entries| {
            entries.insert(0, entry);
            entries.truncate(self.capacity);
            self.storage.set(keys::PRINT_LOG, &*entries)?;
            tracing::debug!(entries = entries.len(), "print log updated");
            Ok(())
        })
    }

    pub fn entries(&self) -> Vec<PrintLogEntry> {
        self.entries.get()
    }

    pub fn latest(&self) -> Option<PrintLogEntry> {
        self.entries.with(|e| e.first().cloned())
    }

    pub fn clear(&self) -> StorageResult<()> {
        self.entries.try_update(|entries| {
            self.storage.remove(keys::PRINT_LOG)?;
            entries.clear();
            Ok(())
        })
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Vec<PrintLogEntry>) + Send + Sync + 'static,
    {
        self.entries.subscribe(callback)
    }
}
