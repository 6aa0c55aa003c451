//! `labeldesk-auth`: session, permissions and route authorization.
//!
//! This crate is decoupled from HTTP: the client crate drives it, and tests
//! drive it directly with in-memory storage.

pub mod guard;
pub mod permissions;
pub mod routes;
pub mod session;

pub use guard::{GuardDecision, NavigationGuard};
pub use permissions::{PermissionRecord, PermissionSet, PermissionStore};
pub use routes::{
    MenuItem, RouteNode, build_menu, console_routes, find_route, find_route_chain, generate_routes,
};
pub use session::{Session, SessionStore, UserProfile};
