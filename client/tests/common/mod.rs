#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use task_manager_client::api::transport::{HttpRequest, HttpResponse, Transport};
use task_manager_client::{ApiClient, ApiResult, ClientConfig, Notifier, SessionStore};
use tokio::sync::Semaphore;

pub const BASE_URL: &str = "http://backend.test/api";
pub const REFRESH_URL: &str = "http://backend.test/api/auth/refresh-token";

type Handler = dyn Fn(&HttpRequest) -> ApiResult<HttpResponse> + Send + Sync;

/// Transport answering from a closure and recording every request.
pub struct MockTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
    refresh_gate: Option<Arc<Semaphore>>,
}

impl MockTransport {
    pub fn new(
        handler: impl Fn(&HttpRequest) -> ApiResult<HttpResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            refresh_gate: None,
        }
    }

    /// Holds refresh calls until the gate receives a permit.
    pub fn with_refresh_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.refresh_gate = Some(gate);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn refresh_calls(&self) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url == REFRESH_URL)
            .collect()
    }

    pub fn calls_to(&self, url: &str) -> Vec<HttpRequest> {
        self.requests().into_iter().filter(|r| r.url == url).collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if request.url == REFRESH_URL {
            if let Some(gate) = &self.refresh_gate {
                gate.acquire().await.unwrap().forget();
            }
        }

        (self.handler)(&request)
    }
}

pub fn respond(status: u16, body: Value) -> ApiResult<HttpResponse> {
    Ok(HttpResponse {
        status,
        body: body.to_string(),
    })
}

pub fn unauthorized() -> ApiResult<HttpResponse> {
    respond(401, json!({"message": "Token expired"}))
}

/// Notifier remembering what the user would have seen.
#[derive(Default)]
pub struct RecordingNotifier {
    pub errors: Mutex<Vec<String>>,
    pub redirects: Mutex<Vec<Duration>>,
}

impl RecordingNotifier {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn redirects(&self) -> Vec<Duration> {
        self.redirects.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn redirect_to_login(&self, after: Duration) {
        self.redirects.lock().unwrap().push(after);
    }
}

pub struct Harness {
    pub client: Arc<ApiClient>,
    pub transport: Arc<MockTransport>,
    pub session: Arc<SessionStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness(transport: MockTransport) -> Harness {
    harness_with_session(transport, Arc::new(SessionStore::in_memory()))
}

pub fn harness_with_session(transport: MockTransport, session: Arc<SessionStore>) -> Harness {
    let transport = Arc::new(transport);
    let notifier = Arc::new(RecordingNotifier::default());
    let client = Arc::new(ApiClient::with_transport(
        ClientConfig::new(BASE_URL),
        transport.clone(),
        session.clone(),
        notifier.clone(),
    ));

    Harness {
        client,
        transport,
        session,
        notifier,
    }
}

/// A signed JWT for `sub` that expires `exp_offset` seconds from now.
pub fn jwt(sub: &str, exp_offset: i64) -> String {
    let now = Utc::now().timestamp();
    encode(
        &Header::default(),
        &json!({"sub": sub, "iat": now, "exp": now + exp_offset, "roles": ["ROLE_USER"]}),
        &EncodingKey::from_secret(b"backend-secret"),
    )
    .unwrap()
}

/// Polls until `condition` holds, failing the test after two seconds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
