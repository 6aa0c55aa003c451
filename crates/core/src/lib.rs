//! `labeldesk-core`: persistence and state building blocks shared by the
//! console crates.
//!
//! Nothing here knows about HTTP, routing or permissions.

pub mod error;
pub mod id;
pub mod keys;
pub mod observer;
pub mod preferences;
pub mod storage;

pub use error::{StorageError, StorageResult};
pub use id::{PrintJobId, RequestId};
pub use observer::{Observable, SubscriptionId};
pub use preferences::{AppPreferences, PreferencesStore, Theme};
pub use storage::{FileStorage, JsonStorage, KeyValueStore, MemoryStorage};
