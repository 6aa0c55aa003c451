use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use labeldesk_auth::{GuardDecision, UserProfile};
use labeldesk_client::services::dto::{Order, OrderQuery, Page, PageQuery};
use labeldesk_client::{ApiError, ClientConfig, Console, Navigator};
use labeldesk_core::JsonStorage;

const TOKEN: &str = "tok-ada";

#[derive(Default)]
struct Backend {
    flaky_hits: AtomicUsize,
    slow_hits: AtomicUsize,
}

fn ok(data: Value) -> Response {
    Json(json!({"code": 200, "success": true, "data": data})).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != "secret" {
        return Json(json!({"code": 1001, "success": false, "message": "invalid credentials"}))
            .into_response();
    }
    ok(json!({
        "token": TOKEN,
        "expiresIn": 3600,
        "userInfo": {"userId": "u1", "username": body["username"]},
        "permissions": ["order:list", "print:submit"],
        "role": "operator"
    }))
}

async fn orders(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
    if !authorized(&headers) {
        let body = Json(json!({"message": "token expired"}));
        return (StatusCode::UNAUTHORIZED, body).into_response();
    }
    let page: u32 = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    ok(json!({
        "list": [
            {"orderId": "o1", "orderNo": "SO-1001", "status": "pending", "quantity": 12},
            {"orderId": "o2", "orderNo": "SO-1002", "status": "printed", "quantity": 3}
        ],
        "total": 2,
        "page": page,
        "pageSize": 20
    }))
}

/// First hit stalls past the client timeout; later hits answer at once.
async fn flaky(State(backend): State<Arc<Backend>>) -> Response {
    if backend.flaky_hits.fetch_add(1, Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    ok(json!("recovered"))
}

async fn slow(
    State(backend): State<Arc<Backend>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    backend.slow_hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(100)).await;
    ok(json!({"page": query.get("page")}))
}

async fn broken() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"message": "database unavailable"})))
        .into_response()
}

struct TestServer {
    base_url: String,
    backend: Arc<Backend>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let backend = Arc::new(Backend::default());
        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/orders", get(orders))
            .route("/api/flaky", get(flaky))
            .route("/api/slow", get(slow))
            .route("/api/broken", get(broken))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}/api", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            backend,
            handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Default)]
struct Recorder {
    paths: Mutex<Vec<String>>,
}

impl Navigator for Recorder {
    fn navigate(&self, path: &str) {
        self.paths.lock().unwrap().push(path.to_string());
    }
}

fn console(srv: &TestServer) -> (Console, Arc<Recorder>) {
    let config = ClientConfig {
        timeout: Duration::from_millis(200),
        retries: 2,
        retry_delay: Duration::from_millis(10),
        ..ClientConfig::new(srv.base_url.clone())
    };
    let recorder = Arc::new(Recorder::default());
    let navigator = recorder.clone();
    let console = Console::open_with(config, JsonStorage::in_memory(), move |builder| {
        builder.navigator(navigator)
    });
    (console, recorder)
}

#[tokio::test]
async fn login_then_list_orders_with_bearer_token() {
    let srv = TestServer::spawn().await;
    let (console, _) = console(&srv);

    console.auth().login("ada", "secret").await.unwrap();
    assert!(console.session.is_logged_in());
    assert!(matches!(console.navigate("/business/orders"), GuardDecision::Render(_)));

    let query = OrderQuery {
        page: PageQuery {
            page: 3,
            ..PageQuery::default()
        },
        ..OrderQuery::default()
    };
    let page: Page<Order> = console.orders().list(&query).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.page, 3);
    assert_eq!(page.list[0].order_no, "SO-1001");
}

#[tokio::test]
async fn rejected_credentials_surface_the_server_message() {
    let srv = TestServer::spawn().await;
    let (console, _) = console(&srv);

    let err = console.auth().login("ada", "wrong").await.unwrap_err();
    match err {
        ApiError::Business { code, message } => {
            assert_eq!(code, Some(1001));
            assert_eq!(message, "invalid credentials");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!console.session.is_logged_in());
}

#[tokio::test]
async fn stale_token_clears_session_and_redirects() {
    let srv = TestServer::spawn().await;
    let (console, recorder) = console(&srv);
    console
        .session
        .login("stale", UserProfile::new("u1"), None)
        .unwrap();

    let err = console.orders().list(&OrderQuery::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    assert!(!console.session.is_logged_in());
    assert_eq!(console.session.snapshot().token, None);
    assert_eq!(*recorder.paths.lock().unwrap(), vec!["/login".to_string()]);
}

#[tokio::test]
async fn timed_out_attempt_is_retried() {
    let srv = TestServer::spawn().await;
    let (console, _) = console(&srv);

    let value: String = console.client.get("/flaky", &()).await.unwrap();
    assert_eq!(value, "recovered");
    assert_eq!(srv.backend.flaky_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn server_errors_are_not_retried() {
    let srv = TestServer::spawn().await;
    let (console, _) = console(&srv);

    let err = console.client.get::<Value, _>("/broken", &()).await.unwrap_err();
    match err {
        ApiError::Server { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn back_to_back_duplicates_keep_only_the_latest() {
    let srv = TestServer::spawn().await;
    let (console, _) = console(&srv);

    let client = console.client.clone();
    let first = tokio::spawn(async move {
        client
            .get::<Value, _>("/slow", &json!({"page": 1}))
            .await
    });
    while console.client.registry().is_empty() {
        tokio::task::yield_now().await;
    }
    let second: Value = console
        .client
        .get("/slow", &json!({"page": 1}))
        .await
        .unwrap();

    assert!(matches!(first.await.unwrap(), Err(ApiError::Cancelled)));
    assert_eq!(second, json!({"page": "1"}));
    assert!(console.client.registry().is_empty());
    assert!(srv.backend.slow_hits.load(Ordering::SeqCst) >= 1);
}
