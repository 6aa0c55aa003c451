//! `ApiClient`: the single choke point for outbound API calls.
//!
//! Per call: register the signature (cancelling a same-signature request
//! still in flight), attach the bearer token, dispatch with a bounded
//! fixed-delay retry on transient failures, and normalize the outcome into
//! the unwrapped payload or an `ApiError`.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{Abortable, Aborted};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::Instrument;

use labeldesk_auth::SessionStore;
use labeldesk_core::RequestId;

use crate::config::ClientConfig;
use crate::effects::{Navigator, NoticeLevel, Notifier, TracingNavigator, TracingNotifier};
use crate::envelope::{Envelope, error_message};
use crate::error::{ApiError, TransportError};
use crate::registry::InFlightRegistry;
use crate::retry::{FixedDelay, RetryPolicy};
use crate::signature::{RequestSignature, query_pairs};
use crate::transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};

const MSG_SESSION_EXPIRED: &str = "Your session has expired, please log in again";
const MSG_FORBIDDEN: &str = "You do not have permission to perform this action";
const MSG_NOT_FOUND: &str = "The requested resource was not found";
const MSG_SERVER: &str = "Server error, please try again later";
const MSG_NETWORK: &str = "Network error, please check your connection";
const MSG_BUSINESS: &str = "Request failed";
const MSG_BAD_RESPONSE: &str = "Unexpected response from server";
const MSG_BAD_REQUEST: &str = "Could not prepare the request";

/// Per-request overrides of the client defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub retries: Option<u32>,
    pub timeout: Option<Duration>,
    /// Suppress user notifications (errors are still returned).
    pub silent: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub params: Option<Value>,
    pub body: Option<Value>,
    pub options: RequestOptions,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: None,
            body: None,
            options: RequestOptions::default(),
        }
    }

    pub fn params(mut self, params: Value) -> Self {
        self.params = (!params.is_null()).then_some(params);
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = (!body.is_null()).then_some(body);
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.options.retries = Some(retries);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn silent(mut self) -> Self {
        self.options.silent = true;
        self
    }
}

struct Inner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
    registry: InFlightRegistry,
    retry: Arc<dyn RetryPolicy>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

/// Cheap to clone; clones share the registry and session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

pub struct ApiClientBuilder {
    config: ClientConfig,
    session: Arc<SessionStore>,
    transport: Option<Arc<dyn Transport>>,
    retry: Option<Arc<dyn RetryPolicy>>,
    notifier: Option<Arc<dyn Notifier>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl ApiClientBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn retry_policy(mut self, retry: Arc<dyn RetryPolicy>) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn build(self) -> ApiClient {
        let retry = self.retry.unwrap_or_else(|| {
            Arc::new(FixedDelay::new(self.config.retries, self.config.retry_delay))
        });
        ApiClient {
            inner: Arc::new(Inner {
                transport: self
                    .transport
                    .unwrap_or_else(|| Arc::new(ReqwestTransport::new())),
                session: self.session,
                registry: InFlightRegistry::new(),
                retry,
                notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
                navigator: self.navigator.unwrap_or_else(|| Arc::new(TracingNavigator)),
                config: self.config,
            }),
        }
    }
}

impl ApiClient {
    pub fn builder(config: ClientConfig, session: Arc<SessionStore>) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            session,
            transport: None,
            retry: None,
            notifier: None,
            navigator: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.inner.session
    }

    pub fn registry(&self) -> &InFlightRegistry {
        &self.inner.registry
    }

    pub async fn get<T, P>(&self, path: &str, params: &P) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let params = self.encode(params)?;
        self.send(ApiRequest::new(Method::Get, path).params(params)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.encode(body)?;
        self.send(ApiRequest::new(Method::Post, path).body(body)).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.encode(body)?;
        self.send(ApiRequest::new(Method::Put, path).body(body)).await
    }

    /// Delete endpoints answer with anything from `null` to the removed
    /// record, so the payload is handed back undecoded.
    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.send_value(ApiRequest::new(Method::Delete, path)).await
    }

    /// Send and decode the unwrapped payload.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let options = request.options.clone();
        let data = self.send_value(request).await?;
        serde_json::from_value(data).map_err(|err| {
            tracing::error!(error = %err, "response payload has an unexpected shape");
            self.notify(&options, NoticeLevel::Error, MSG_BAD_RESPONSE);
            ApiError::Decode(err)
        })
    }

    /// Send and return the raw unwrapped payload.
    pub async fn send_value(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let url = self.inner.config.resolve(&request.path);
        let signature = RequestSignature::new(
            request.method,
            &url,
            request.params.as_ref(),
            request.body.as_ref(),
        );
        let request_id = RequestId::new();
        let span = tracing::info_span!(
            "api_request",
            id = %request_id,
            method = %request.method,
            url = %url,
        );

        let (guard, registration) = self.inner.registry.register(signature);
        let outcome = Abortable::new(self.dispatch(&request, &url), registration)
            .instrument(span.clone())
            .await;
        drop(guard);

        match outcome {
            Ok(result) => result,
            Err(Aborted) => {
                span.in_scope(|| tracing::debug!("request superseded"));
                Err(ApiError::Cancelled)
            }
        }
    }

    async fn dispatch(&self, request: &ApiRequest, url: &str) -> Result<Value, ApiError> {
        let timeout = request.options.timeout.unwrap_or(self.inner.config.timeout);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let http = self.build_http_request(request, url, timeout);
            let result = match tokio::time::timeout(timeout, self.inner.transport.execute(http)).await
            {
                Ok(result) => result,
                Err(_elapsed) => Err(TransportError::Timeout),
            };

            let error = match result {
                Ok(response) => return self.handle_response(response, &request.options),
                Err(error) => error,
            };

            match self.retry_delay(&request.options, attempt, &error) {
                Some(delay) => {
                    tracing::warn!(attempt, error = %error, "transient failure, retrying");
                    tokio::time::sleep(delay).await;
                }
                None => {
                    tracing::error!(attempts = attempt, error = %error, "request failed");
                    self.notify(&request.options, NoticeLevel::Error, MSG_NETWORK);
                    return Err(ApiError::Transport {
                        attempts: attempt,
                        source: error,
                    });
                }
            }
        }
    }

    fn retry_delay(
        &self,
        options: &RequestOptions,
        attempt: u32,
        error: &TransportError,
    ) -> Option<Duration> {
        match options.retries {
            Some(retries) => FixedDelay::new(retries, self.inner.config.retry_delay)
                .next_delay(attempt, error),
            None => self.inner.retry.next_delay(attempt, error),
        }
    }

    fn build_http_request(&self, request: &ApiRequest, url: &str, timeout: Duration) -> HttpRequest {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(token) = self.inner.session.token() {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        HttpRequest {
            method: request.method,
            url: url.to_string(),
            headers,
            query: query_pairs(request.params.as_ref()),
            body: request.body.clone(),
            timeout,
        }
    }

    fn handle_response(
        &self,
        response: HttpResponse,
        options: &RequestOptions,
    ) -> Result<Value, ApiError> {
        let status = response.status;
        tracing::debug!(status, "response received");

        if response.is_success() {
            let envelope = match Envelope::parse(&response.body) {
                Ok(envelope) => envelope,
                Err(err) => {
                    self.notify(options, NoticeLevel::Error, MSG_BAD_RESPONSE);
                    return Err(err);
                }
            };
            if envelope.is_success() {
                return Ok(envelope.data);
            }
            let message = envelope.message_or(MSG_BUSINESS);
            tracing::info!(code = ?envelope.code, %message, "request rejected by server");
            self.notify(options, NoticeLevel::Error, &message);
            return Err(ApiError::Business {
                code: envelope.code,
                message,
            });
        }

        match status {
            401 => {
                self.on_unauthorized(options);
                Err(ApiError::Unauthorized)
            }
            403 => {
                self.notify(options, NoticeLevel::Error, MSG_FORBIDDEN);
                Err(ApiError::Forbidden {
                    message: error_message(&response.body, MSG_FORBIDDEN),
                })
            }
            404 => {
                self.notify(options, NoticeLevel::Error, MSG_NOT_FOUND);
                Err(ApiError::NotFound {
                    message: error_message(&response.body, MSG_NOT_FOUND),
                })
            }
            500..=599 => {
                self.notify(options, NoticeLevel::Error, MSG_SERVER);
                Err(ApiError::Server {
                    status,
                    message: error_message(&response.body, MSG_SERVER),
                })
            }
            _ => {
                let message = error_message(&response.body, &format!("HTTP {status}"));
                self.notify(options, NoticeLevel::Error, &message);
                Err(ApiError::Http { status, message })
            }
        }
    }

    fn on_unauthorized(&self, options: &RequestOptions) {
        tracing::warn!("received 401, clearing session");
        if let Err(err) = self.inner.session.clear() {
            tracing::error!(error = %err, "failed to clear persisted session");
        }
        self.notify(options, NoticeLevel::Warning, MSG_SESSION_EXPIRED);
        self.inner.navigator.navigate(&self.inner.config.login_path);
    }

    fn encode<V: Serialize + ?Sized>(&self, value: &V) -> Result<Value, ApiError> {
        serde_json::to_value(value).map_err(|err| {
            tracing::error!(error = %err, "request payload is not serializable");
            self.notify(&RequestOptions::default(), NoticeLevel::Error, MSG_BAD_REQUEST);
            ApiError::Encode(err)
        })
    }

    fn notify(&self, options: &RequestOptions, level: NoticeLevel, message: &str) {
        if !options.silent {
            self.inner.notifier.notify(level, message);
        }
    }
}

impl core::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.inner.config)
            .field("in_flight", &self.inner.registry.len())
            .finish_non_exhaustive()
    }
}
