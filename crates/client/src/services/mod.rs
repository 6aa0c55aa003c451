//! Typed service calls behind the console screens.

pub mod auth;
pub mod dto;
pub mod orders;
pub mod print;
pub mod users;

pub use auth::AuthService;
pub use orders::{BarcodeService, OrderService};
pub use print::{MAX_COPIES, PrintJobError, PrintService};
pub use users::UserService;
