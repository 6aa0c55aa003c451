//! Permission strings and the persisted permission store.
//!
//! Checks are plain containment tests. An empty requirement always passes:
//! routes and buttons without a permission tag are visible to every
//! logged-in operator.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use labeldesk_core::{JsonStorage, Observable, StorageResult, SubscriptionId, keys};

/// Unordered set of granted permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    granted: HashSet<String>,
}

impl PermissionSet {
    pub fn new<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            granted: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// True for an empty requirement; otherwise membership.
    pub fn allows(&self, required: &str) -> bool {
        required.is_empty() || self.granted.contains(required)
    }

    pub fn allows_all<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required.iter().all(|p| self.allows(p.as_ref()))
    }

    /// An empty list is no requirement at all and passes.
    pub fn allows_any<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required.is_empty() || required.iter().any(|p| self.allows(p.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.granted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.granted.is_empty()
    }

    /// Sorted copy, for persistence and display.
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut list: Vec<String> = self.granted.iter().cloned().collect();
        list.sort();
        list
    }
}

/// Persisted shape: `{ "permissions": [...], "role": "..." }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionRecord {
    pub permissions: Vec<String>,
    /// Informational only; access decisions use `permissions`.
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PermissionState {
    set: PermissionSet,
    role: Option<String>,
}

impl PermissionState {
    fn from_record(record: PermissionRecord) -> Self {
        Self {
            set: PermissionSet::new(record.permissions),
            role: record.role,
        }
    }

    fn to_record(&self) -> PermissionRecord {
        PermissionRecord {
            permissions: self.set.to_sorted_vec(),
            role: self.role.clone(),
        }
    }
}

#[derive(Debug)]
pub struct PermissionStore {
    storage: JsonStorage,
    state: Observable<PermissionState>,
}

impl PermissionStore {
    pub fn new(storage: JsonStorage) -> Self {
        let record: PermissionRecord = storage.get_or_default(keys::PERMISSIONS);
        Self {
            storage,
            state: Observable::new(PermissionState::from_record(record)),
        }
    }

    /// Replace the permission set wholesale.
    pub fn load<I, S>(&self, permissions: I) -> StorageResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = PermissionSet::new(permissions);
        self.commit(|state| state.set = set)
    }

    pub fn set_role(&self, role: Option<String>) -> StorageResult<()> {
        self.commit(|state| state.role = role)
    }

    pub fn clear(&self) -> StorageResult<()> {
        self.commit(|state| *state = PermissionState::default())
    }

    pub fn role(&self) -> Option<String> {
        self.state.with(|s| s.role.clone())
    }

    pub fn snapshot(&self) -> PermissionSet {
        self.state.with(|s| s.set.clone())
    }

    pub fn has_page(&self, permission: &str) -> bool {
        self.state.with(|s| s.set.allows(permission))
    }

    pub fn has_button(&self, permission: &str) -> bool {
        self.state.with(|s| s.set.allows(permission))
    }

    pub fn has_all<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        self.state.with(|s| s.set.allows_all(permissions))
    }

    pub fn has_any<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        self.state.with(|s| s.set.allows_any(permissions))
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&PermissionSet) + Send + Sync + 'static,
    {
        self.state.subscribe(move |state| callback(&state.set))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }

    fn commit(&self, f: impl FnOnce(&mut PermissionState)) -> StorageResult<()> {
        self.state.try_update(|state| {
            f(state);
            self.storage.set(keys::PERMISSIONS, &state.to_record())?;
            tracing::debug!(count = state.set.len(), "permission state persisted");
            Ok(())
        })
    }
}
