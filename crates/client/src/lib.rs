//! `labeldesk-client`: the authenticated HTTP layer of the label console.
//!
//! [`ApiClient`] attaches the session token, unwraps the response envelope,
//! retries transient failures, cancels superseded duplicates and routes 401s
//! back to login. Typed services and the [`Console`] bundle sit on top.

pub mod client;
pub mod config;
pub mod console;
pub mod effects;
pub mod envelope;
pub mod error;
pub mod registry;
pub mod retry;
pub mod services;
pub mod signature;
pub mod transport;

#[cfg(test)]
mod testing;

pub use client::{ApiClient, ApiClientBuilder, ApiRequest, RequestOptions};
pub use config::{ClientConfig, ConfigError};
pub use console::Console;
pub use effects::{Navigator, NoticeLevel, Notifier, TracingNavigator, TracingNotifier};
pub use envelope::Envelope;
pub use error::{ApiError, TransportError};
pub use registry::{InFlightGuard, InFlightRegistry};
pub use retry::{FixedDelay, RetryPolicy};
pub use signature::RequestSignature;
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
