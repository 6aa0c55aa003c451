//! Persisted UI preferences (sidebar state, theme).

use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::keys;
use crate::observer::{Observable, SubscriptionId};
use crate::storage::JsonStorage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppPreferences {
    pub sidebar_collapsed: bool,
    pub theme: Theme,
}

#[derive(Debug)]
pub struct PreferencesStore {
    storage: JsonStorage,
    state: Observable<AppPreferences>,
}

impl PreferencesStore {
    /// Rehydrate from storage; a missing or corrupt record yields defaults.
    pub fn new(storage: JsonStorage) -> Self {
        let initial: AppPreferences = storage.get_or_default(keys::PREFERENCES);
        Self {
            storage,
            state: Observable::new(initial),
        }
    }

    pub fn get(&self) -> AppPreferences {
        self.state.get()
    }

    pub fn toggle_sidebar(&self) -> StorageResult<bool> {
        self.mutate(|prefs| {
            prefs.sidebar_collapsed = !prefs.sidebar_collapsed;
        })
        .map(|prefs| prefs.sidebar_collapsed)
    }

    pub fn set_sidebar_collapsed(&self, collapsed: bool) -> StorageResult<()> {
        self.mutate(|prefs| prefs.sidebar_collapsed = collapsed).map(|_| ())
    }

    pub fn set_theme(&self, theme: Theme) -> StorageResult<()> {
        self.mutate(|prefs| prefs.theme = theme).map(|_| ())
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&AppPreferences) + Send + Sync + 'static,
    {
        self.state.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }

    fn mutate(&self, f: impl FnOnce(&mut AppPreferences)) -> StorageResult<AppPreferences> {
        self.state.try_update(|prefs| {
            f(prefs);
            self.storage.set(keys::PREFERENCES, &*prefs)?;
            Ok(prefs.clone())
        })
    }
}
