//! Scripted collaborators for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::effects::{Navigator, NoticeLevel, Notifier};
use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpResponse, Transport};

#[derive(Debug, Clone)]
pub enum Step {
    Respond {
        status: u16,
        body: String,
        delay: Duration,
    },
    Fail(TransportError),
    /// Never answers; only a timeout or cancellation ends the attempt.
    Hang,
}

impl Step {
    pub fn ok(data: Value) -> Self {
        Self::json(200, json!({"code": 200, "success": true, "data": data}))
    }

    pub fn json(status: u16, body: Value) -> Self {
        Self::text(status, &body.to_string())
    }

    pub fn text(status: u16, body: &str) -> Self {
        Step::Respond {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self::text(status, "")
    }

    pub fn fail(error: TransportError) -> Self {
        Step::Fail(error)
    }

    pub fn delayed(self, by: Duration) -> Self {
        match self {
            Step::Respond { status, body, .. } => Step::Respond {
                status,
                body,
                delay: by,
            },
            other => other,
        }
    }
}

/// Answers each call with the next scripted step, in call order.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Respond {
                status,
                body,
                delay,
            }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(HttpResponse { status, body })
            }
            Some(Step::Fail(error)) => Err(error),
            Some(Step::Hang) => futures::future::pending().await,
            None => Err(TransportError::Network("no scripted response".to_string())),
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices.lock().unwrap().push((level, message.to_string()));
    }
}

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    paths: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.paths.lock().unwrap().push(path.to_string());
    }
}
