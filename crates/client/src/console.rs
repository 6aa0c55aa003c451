//! One place that wires storage, stores, client and services together.

use std::sync::Arc;

use labeldesk_auth::{
    GuardDecision, MenuItem, NavigationGuard, PermissionStore, SessionStore, build_menu,
    console_routes, generate_routes,
};
use labeldesk_core::{JsonStorage, PreferencesStore};
use labeldesk_print::PrintLogStore;

use crate::client::{ApiClient, ApiClientBuilder};
use crate::config::ClientConfig;
use crate::services::{AuthService, BarcodeService, OrderService, PrintService, UserService};

/// Shared console state. Cloning is cheap; every handle points at the same
/// stores.
#[derive(Debug, Clone)]
pub struct Console {
    pub session: Arc<SessionStore>,
    pub permissions: Arc<PermissionStore>,
    pub preferences: Arc<PreferencesStore>,
    pub print_log: Arc<PrintLogStore>,
    pub client: ApiClient,
    pub guard: Arc<NavigationGuard>,
}

impl Console {
    /// Rehydrate every store from `storage` and build a default client.
    pub fn open(config: ClientConfig, storage: JsonStorage) -> Self {
        Self::open_with(config, storage, |builder| builder)
    }

    /// Like [`Console::open`], with a hook to swap client collaborators.
    pub fn open_with<F>(config: ClientConfig, storage: JsonStorage, customize: F) -> Self
    where
        F: FnOnce(ApiClientBuilder) -> ApiClientBuilder,
    {
        let session = Arc::new(SessionStore::new(storage.clone()));
        let permissions = Arc::new(PermissionStore::new(storage.clone()));
        let preferences = Arc::new(PreferencesStore::new(storage.clone()));
        let print_log = Arc::new(PrintLogStore::new(storage));
        let guard = Arc::new(
            NavigationGuard::new(console_routes()).with_login_path(config.login_path.clone()),
        );
        let client = customize(ApiClient::builder(config, session.clone())).build();

        Self {
            session,
            permissions,
            preferences,
            print_log,
            client,
            guard,
        }
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.client.clone(), self.permissions.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.client.clone())
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.client.clone())
    }

    pub fn barcodes(&self) -> BarcodeService {
        BarcodeService::new(self.client.clone())
    }

    pub fn printing(&self) -> PrintService {
        PrintService::new(self.client.clone(), self.print_log.clone())
    }

    pub fn navigate(&self, path: &str) -> GuardDecision {
        self.guard.check(path, &self.session, &self.permissions)
    }

    /// Menu for the current permission set.
    pub fn menu(&self) -> Vec<MenuItem> {
        build_menu(&generate_routes(
            self.guard.routes(),
            &self.permissions.snapshot(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use labeldesk_core::JsonStorage;

    use super::*;
    use crate::testing::{RecordingNavigator, ScriptedTransport, Step};

    fn console(steps: Vec<Step>, storage: JsonStorage) -> (Console, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::default());
        let transport = Arc::new(ScriptedTransport::new(steps));
        let nav = navigator.clone();
        let console = Console::open_with(ClientConfig::default(), storage, move |b| {
            b.transport(transport).navigator(nav)
        });
        (console, navigator)
    }

    #[tokio::test]
    async fn login_unlocks_permitted_routes_only() {
        let (console, _) = console(
            vec![Step::ok(json!({
                "token": "abc123",
                "userInfo": {"userId": "u1"},
                "permissions": ["order:list"]
            }))],
            JsonStorage::in_memory(),
        );

        assert!(matches!(
            console.navigate("/business/orders"),
            GuardDecision::RedirectToLogin { .. }
        ));

        console.auth().login("ada", "pw").await.unwrap();

        assert!(matches!(console.navigate("/business/orders"), GuardDecision::Render(_)));
        assert!(matches!(console.navigate("/system/users"), GuardDecision::Forbidden { .. }));

        let menu = console.menu();
        let keys: Vec<&str> = menu.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["/dashboard", "/system", "/business"]);
        assert!(menu[1].children.is_empty());
        let business: Vec<&str> = menu[2].children.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(business, vec!["/business/orders"]);
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let storage = JsonStorage::in_memory();
        let (first, _) = console(
            vec![Step::ok(json!({
                "token": "abc123",
                "userInfo": {"userId": "u1"},
                "permissions": ["print:submit"]
            }))],
            storage.clone(),
        );
        first.auth().login("ada", "pw").await.unwrap();
        first.preferences.toggle_sidebar().unwrap();

        let (second, _) = console(vec![], storage);
        assert!(second.session.is_logged_in());
        assert!(second.permissions.has_page("print:submit"));
        assert!(second.preferences.get().sidebar_collapsed);
    }

    #[tokio::test]
    async fn unauthorized_response_sends_user_to_login() {
        let (console, navigator) = console(vec![Step::status(401)], JsonStorage::in_memory());
        console
            .session
            .login("stale", labeldesk_auth::UserProfile::new("u1"), None)
            .unwrap();

        let err = console
            .orders()
            .list(&Default::default())
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::ApiError::Unauthorized));
        assert!(!console.session.is_logged_in());
        assert_eq!(navigator.paths(), vec!["/login".to_string()]);
    }
}
