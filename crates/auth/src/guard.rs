//! Navigation guard: decides, per navigation attempt, whether to render the
//! target route or redirect.
//!
//! - No IO
//! - No panics
//! - Missing permission is a routing decision, never an error

use crate::permissions::PermissionStore;
use crate::routes::{RouteNode, find_route_chain};
use crate::session::SessionStore;

pub const LOGIN_PATH: &str = "/login";
pub const FORBIDDEN_PATH: &str = "/403";
pub const NOT_FOUND_PATH: &str = "/404";
pub const HOME_PATH: &str = "/dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Authorized: render the route's screen.
    Render(RouteNode),
    /// No valid session; `to` carries the originating path.
    RedirectToLogin { to: String },
    /// Logged in but missing a required permission.
    Forbidden { to: String },
    /// No route matches the requested path.
    NotFound { to: String },
    /// Logged-in user asked for the login screen.
    RedirectHome { to: String },
}

impl GuardDecision {
    /// Where the browser should go instead, if anywhere.
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            GuardDecision::Render(_) => None,
            GuardDecision::RedirectToLogin { to }
            | GuardDecision::Forbidden { to }
            | GuardDecision::NotFound { to }
            | GuardDecision::RedirectHome { to } => Some(to),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavigationGuard {
    routes: Vec<RouteNode>,
    login_path: String,
    home_path: String,
}

impl NavigationGuard {
    pub fn new(routes: Vec<RouteNode>) -> Self {
        Self {
            routes,
            login_path: LOGIN_PATH.to_string(),
            home_path: HOME_PATH.to_string(),
        }
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_home_path(mut self, path: impl Into<String>) -> Self {
        self.home_path = path.into();
        self
    }

    pub fn routes(&self) -> &[RouteNode] {
        &self.routes
    }

    pub fn check(
        &self,
        path: &str,
        session: &SessionStore,
        permissions: &PermissionStore,
    ) -> GuardDecision {
        let logged_in = session.is_logged_in();

        let chain = find_route_chain(&self.routes, path).unwrap_or_default();
        let Some(&route) = chain.last() else {
            tracing::debug!(path, "navigation to unknown route");
            return GuardDecision::NotFound {
                to: NOT_FOUND_PATH.to_string(),
            };
        };

        if route.path == self.login_path && logged_in {
            return GuardDecision::RedirectHome {
                to: self.home_path.clone(),
            };
        }

        if route.requires_auth && !logged_in {
            return GuardDecision::RedirectToLogin {
                to: login_redirect(&self.login_path, path),
            };
        }

        // Ancestors count too: a subtree hidden by its parent's tag is not
        // reachable by typing its URL.
        let denied = chain.iter().find(|node| !permissions.has_all(&node.permissions));
        if let Some(denied) = denied {
            tracing::info!(
                path,
                at = %denied.path,
                required = ?denied.permissions,
                "navigation denied"
            );
            return GuardDecision::Forbidden {
                to: FORBIDDEN_PATH.to_string(),
            };
        }

        GuardDecision::Render(route.clone())
    }
}

/// `/login?redirect=<origin>` with the origin percent-encoded.
pub fn login_redirect(login_path: &str, origin: &str) -> String {
    format!("{}?redirect={}", login_path, urlencoding::encode(origin))
}
