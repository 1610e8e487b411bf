//! Fakes shared by the unit tests: scripted operator input, in-process pool
//! and wallet daemon servers, and fake wallet executables.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::{net::TcpListener, sync::Mutex};

use crate::{
    error::{PayoutError, PayoutResult},
    prompt::Prompter,
};

// ============= Prompter =============

/// Answers prompts from a fixed script, then reports closed input
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// Every prompt shown so far
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    fn next(&mut self, prompt: &str) -> PayoutResult<String> {
        self.asked.push(prompt.to_string());
        self.answers.pop_front().ok_or(PayoutError::InputClosed)
    }
}

impl Prompter for ScriptedPrompter {
    fn read_line(&mut self, prompt: &str) -> PayoutResult<String> {
        self.next(prompt)
    }

    fn read_secret(&mut self, prompt: &str) -> PayoutResult<String> {
        self.next(prompt)
    }
}

// ============= Pool API =============

pub const POOL_USER: &str = "miner";
pub const POOL_PASS: &str = "pw";
pub const POOL_USER_ID: u64 = 42;
// "miner:pw"
const POOL_AUTH: &str = "Basic bWluZXI6cHc=";

/// How the fake pool answers
#[derive(Debug, Clone)]
pub struct PoolStub {
    pub balance: Option<i64>,
    pub slate: String,
    pub submit_status: u16,
}

impl Default for PoolStub {
    fn default() -> Self {
        Self {
            balance: Some(5_000_000_000),
            slate: r#"{"id":"fresh-slate","amount":5000000000}"#.to_string(),
            submit_status: 200,
        }
    }
}

#[derive(Clone)]
struct PoolState {
    stub: Arc<PoolStub>,
    calls: Arc<Mutex<Vec<&'static str>>>,
    submitted: Arc<Mutex<Vec<String>>>,
}

pub struct PoolHandle {
    pub url: String,
    state: PoolState,
}

impl PoolHandle {
    /// Endpoint names in call order
    pub async fn calls(&self) -> Vec<&'static str> {
        self.state.calls.lock().await.clone()
    }

    /// Bodies of every signed slate submission
    pub async fn submitted(&self) -> Vec<String> {
        self.state.submitted.lock().await.clone()
    }
}

fn pool_authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == POOL_AUTH)
        .unwrap_or(false)
}

async fn pool_users(State(state): State<PoolState>, headers: HeaderMap) -> impl IntoResponse {
    state.calls.lock().await.push("users");
    if pool_authorized(&headers) {
        Json(json!({ "id": POOL_USER_ID })).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "Invalid login").into_response()
    }
}

async fn pool_balance(State(state): State<PoolState>, Path(_user_id): Path<u64>) -> impl IntoResponse {
    state.calls.lock().await.push("balance");
    match state.stub.balance {
        Some(amount) => Json(json!({ "amount": amount })),
        None => Json(serde_json::Value::Null),
    }
}

async fn pool_get_tx_slate(State(state): State<PoolState>, Path(_user_id): Path<u64>) -> impl IntoResponse {
    state.calls.lock().await.push("get_tx_slate");
    state.stub.slate.clone()
}

async fn pool_submit_tx_slate(
    State(state): State<PoolState>,
    Path(_user_id): Path<u64>,
    body: String,
) -> impl IntoResponse {
    state.calls.lock().await.push("submit_tx_slate");
    state.submitted.lock().await.push(body);
    let status = StatusCode::from_u16(state.stub.submit_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_success() {
        status.into_response()
    } else {
        (status, "slate rejected").into_response()
    }
}

pub async fn spawn_pool_stub(stub: PoolStub) -> PoolHandle {
    let state = PoolState {
        stub: Arc::new(stub),
        calls: Arc::default(),
        submitted: Arc::default(),
    };
    let app = Router::new()
        .route("/pool/users", get(pool_users))
        .route("/worker/utxo/{user_id}", get(pool_balance))
        .route("/pool/payment/get_tx_slate/{user_id}", post(pool_get_tx_slate))
        .route("/pool/payment/submit_tx_slate/{user_id}", post(pool_submit_tx_slate))
        .with_state(state.clone());

    PoolHandle {
        url: serve(app).await,
        state,
    }
}

// ============= Wallet daemon =============

const DAEMON_USER: &str = "miner";
const DAEMON_PASS: &str = "secret";
const DAEMON_TOKEN: &str = "token-1";

/// How the fake wallet daemon answers
#[derive(Debug, Clone, Default)]
pub struct DaemonStub {
    pub reject_receive: bool,
    /// Answer receive with 201 and logout with 204 instead of 200
    pub non_200_success: bool,
}

#[derive(Clone)]
struct DaemonState {
    stub: Arc<DaemonStub>,
    logouts: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<String>>>,
}

pub struct DaemonHandle {
    pub url: String,
    state: DaemonState,
}

impl DaemonHandle {
    pub fn logouts(&self) -> usize {
        self.state.logouts.load(Ordering::SeqCst)
    }

    /// Raw receive_tx request bodies
    pub async fn received(&self) -> Vec<String> {
        self.state.received.lock().await.clone()
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn daemon_login(headers: HeaderMap) -> impl IntoResponse {
    if header(&headers, "username") == Some(DAEMON_USER) && header(&headers, "password") == Some(DAEMON_PASS) {
        Json(json!({ "session_token": DAEMON_TOKEN })).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "invalid login").into_response()
    }
}

async fn daemon_receive(State(state): State<DaemonState>, headers: HeaderMap, body: String) -> impl IntoResponse {
    if header(&headers, "session_token") != Some(DAEMON_TOKEN) {
        return (StatusCode::UNAUTHORIZED, "no session").into_response();
    }
    state.received.lock().await.push(body.clone());
    if state.stub.reject_receive {
        return (StatusCode::BAD_REQUEST, "slate not accepted").into_response();
    }

    let request: serde_json::Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(_) => return (StatusCode::BAD_REQUEST, "bad json").into_response(),
    };
    let status = if state.stub.non_200_success {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, json!({ "signed": request["slate"] }).to_string()).into_response()
}

async fn daemon_logout(State(state): State<DaemonState>, headers: HeaderMap) -> impl IntoResponse {
    if header(&headers, "session_token") != Some(DAEMON_TOKEN) {
        return StatusCode::UNAUTHORIZED;
    }
    state.logouts.fetch_add(1, Ordering::SeqCst);
    if state.stub.non_200_success {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::OK
    }
}

pub async fn spawn_daemon_stub(stub: DaemonStub) -> DaemonHandle {
    let state = DaemonState {
        stub: Arc::new(stub),
        logouts: Arc::default(),
        received: Arc::default(),
    };
    let app = Router::new()
        .route("/v1/wallet/owner/login", post(daemon_login))
        .route("/v1/wallet/owner/receive_tx", post(daemon_receive))
        .route("/v1/wallet/owner/logout", post(daemon_logout))
        .with_state(state.clone());

    DaemonHandle {
        url: serve(app).await,
        state,
    }
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

// ============= Fake executables =============

/// Write an executable shell script called `name` into `dir`
#[cfg(unix)]
pub fn write_script(dir: &std::path::Path, name: &str, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
