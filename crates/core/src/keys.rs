//! Fixed storage keys for every persisted record.

pub const SESSION: &str = "labeldesk.session";
pub const PERMISSIONS: &str = "labeldesk.permissions";
pub const PREFERENCES: &str = "labeldesk.preferences";
pub const PRINT_LOG: &str = "labeldesk.print_log";
