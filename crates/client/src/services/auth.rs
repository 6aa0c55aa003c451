//! Login / logout and permission refresh.

use std::sync::Arc;

use chrono::{Duration, Utc};

use labeldesk_auth::PermissionStore;

use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;
use crate::services::dto::{LoginRequest, LoginResponse, PermissionGrant};
use crate::transport::Method;

#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
    permissions: Arc<PermissionStore>,
}

impl AuthService {
    pub fn new(client: ApiClient, permissions: Arc<PermissionStore>) -> Self {
        Self {
            client,
            permissions,
        }
    }

    /// Authenticate, then populate the session and permission stores.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.client.post("/auth/login", &request).await?;

        let expires_at = response
            .expires_in
            .filter(|secs| *secs > 0)
            .map(|secs| Utc::now() + Duration::seconds(secs));

        self.client
            .session()
            .login(response.token.clone(), response.user_info.clone(), expires_at)?;
        self.permissions.load(response.permissions.iter().cloned())?;
        self.permissions.set_role(response.role.clone())?;

        tracing::info!(
            user = %response.user_info.user_id,
            permissions = response.permissions.len(),
            "logged in"
        );
        Ok(response)
    }

    /// Re-fetch the permission list and replace the local set wholesale.
    pub async fn refresh_permissions(&self) -> Result<(), ApiError> {
        let grant: PermissionGrant = self.client.get("/auth/permissions", &()).await?;
        self.permissions.load(grant.permissions)?;
        self.permissions.set_role(grant.role)?;
        Ok(())
    }

    /// Best-effort server logout, then drop all local auth state.
    pub async fn logout(&self) -> Result<(), ApiError> {
        if self.client.session().is_logged_in() {
            let notify = ApiRequest::new(Method::Post, "/auth/logout").retries(0).silent();
            if let Err(err) = self.client.send_value(notify).await {
                tracing::warn!(error = %err, "server logout failed; clearing local session anyway");
            }
        }
        self.client.registry().cancel_all();
        self.client.session().clear()?;
        self.permissions.clear()?;
        Ok(())
    }
}
