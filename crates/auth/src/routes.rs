//! Static route tree, permission filtering and menu derivation.

use serde::{Deserialize, Serialize};

use crate::permissions::PermissionSet;

/// One node of the console's route tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteNode {
    pub path: String,
    pub title: String,
    /// Permission tags; all must be granted. Empty means unguarded.
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default = "default_requires_auth")]
    pub requires_auth: bool,
    /// Hidden routes are navigable but never appear in the menu.
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub children: Vec<RouteNode>,
}

fn default_requires_auth() -> bool {
    true
}

impl RouteNode {
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            permissions: Vec::new(),
            requires_auth: true,
            hidden: false,
            icon: None,
            children: Vec::new(),
        }
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn children(mut self, children: Vec<RouteNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_permitted(&self, granted: &PermissionSet) -> bool {
        granted.allows_all(&self.permissions)
    }
}

/// Keep only the routes the permission set grants, recursively.
///
/// A dropped node takes its subtree with it; siblings are still evaluated.
/// Order and content of kept nodes are preserved.
pub fn generate_routes(routes: &[RouteNode], granted: &PermissionSet) -> Vec<RouteNode> {
    routes
        .iter()
        .filter(|route| route.is_permitted(granted))
        .map(|route| RouteNode {
            children: generate_routes(&route.children, granted),
            ..route.clone()
        })
        .collect()
}

/// Menu entry derived from a route: `key` is the route path, `label` its title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

/// Mirror the (already filtered) route tree, skipping hidden nodes.
pub fn build_menu(routes: &[RouteNode]) -> Vec<MenuItem> {
    routes
        .iter()
        .filter(|route| !route.hidden)
        .map(|route| MenuItem {
            key: route.path.clone(),
            label: route.title.clone(),
            icon: route.icon.clone(),
            children: build_menu(&route.children),
        })
        .collect()
}

/// Depth-first lookup of a route by exact path (query string ignored).
pub fn find_route<'a>(routes: &'a [RouteNode], path: &str) -> Option<&'a RouteNode> {
    find_route_chain(routes, path).and_then(|chain| chain.last().copied())
}

/// Like [`find_route`], but returns every node from the root down to the
/// match, outermost first.
pub fn find_route_chain<'a>(routes: &'a [RouteNode], path: &str) -> Option<Vec<&'a RouteNode>> {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    chain_to(routes, path)
}

fn chain_to<'a>(routes: &'a [RouteNode], path: &str) -> Option<Vec<&'a RouteNode>> {
    for route in routes {
        if route.path == path {
            return Some(vec![route]);
        }
        if let Some(mut chain) = chain_to(&route.children, path) {
            chain.insert(0, route);
            return Some(chain);
        }
    }
    None
}

/// The console's built-in route table.
pub fn console_routes() -> Vec<RouteNode> {
    vec![
        RouteNode::new("/login", "Login").public().hidden(),
        RouteNode::new("/403", "Forbidden").public().hidden(),
        RouteNode::new("/404", "Not Found").public().hidden(),
        RouteNode::new("/dashboard", "Dashboard").icon("dashboard"),
        RouteNode::new("/system", "System")
            .icon("setting")
            .children(vec![
                RouteNode::new("/system/users", "User Management").permission("user:list"),
            ]),
        RouteNode::new("/business", "Business")
            .icon("barcode")
            .children(vec![
                RouteNode::new("/business/orders", "Order Management").permission("order:list"),
                RouteNode::new("/business/barcodes", "Barcode Records").permission("barcode:list"),
                RouteNode::new("/business/print", "Label Printing").permission("print:submit"),
            ]),
    ]
}
