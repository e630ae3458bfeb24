#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use early_access_server::{
    build_router,
    config::{EmailConfig, GeoConfig, StorageKind},
    email::{EmailError, EmailMessage, EmailSender},
    error::Result,
    models::{EmailLogEntry, NewEmailLog, NewSignup, Signup},
    AppError, AppState, Config, GeoResolver, Mailer, MemoryStore, SignupStore,
};

pub const FROM_ADDRESS: &str = "updates@launch.io";

// =============================================================================
// Configuration
// =============================================================================

/// Test configuration: in-memory store, no geolocation providers, no admin gate
pub fn test_config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        storage: StorageKind::Memory,
        database_url: None,
        email: EmailConfig {
            api_key: None,
            api_url: "http://127.0.0.1:9".to_string(),
            from_address: FROM_ADDRESS.to_string(),
            test_mode: false,
        },
        geo: GeoConfig {
            timeout: Duration::from_millis(200),
            ip_detect_url: "http://127.0.0.1:9/".to_string(),
            ip_api_url: None,
            geojs_url: None,
            ipapi_url: None,
        },
        admin: None,
        environment: "test".to_string(),
    }
}

pub fn create_app(store: Arc<dyn SignupStore>, mailer: Option<Mailer>, config: Config) -> Router {
    let geo = GeoResolver::new(config.geo.clone()).expect("geo client");
    build_router(AppState::new(store, mailer, geo, config))
}

pub fn mailer(sender: Arc<FakeSender>) -> Mailer {
    Mailer::new(sender, FROM_ADDRESS, false)
}

// =============================================================================
// Fake email provider
// =============================================================================

/// Records every send; can be told to fail single sends or a given batch
#[derive(Default)]
pub struct FakeSender {
    pub singles: Mutex<Vec<EmailMessage>>,
    pub batches: Mutex<Vec<Vec<EmailMessage>>>,
    fail_single: bool,
    fail_batch_at: Option<usize>,
}

impl FakeSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_single: true,
            ..Self::default()
        })
    }

    /// Fail the batch call with this zero-based index
    pub fn failing_batch(index: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_batch_at: Some(index),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.singles.lock().len() + self.batches.lock().len()
    }
}

fn provider_error() -> EmailError {
    EmailError::Provider {
        status: 429,
        message: "Too many requests".to_string(),
    }
}

#[async_trait]
impl EmailSender for FakeSender {
    async fn send(
        &self,
        message: &EmailMessage,
    ) -> std::result::Result<Option<String>, EmailError> {
        let mut singles = self.singles.lock();
        singles.push(message.clone());
        if self.fail_single {
            return Err(provider_error());
        }
        Ok(Some(format!("msg-{}", singles.len())))
    }

    async fn send_batch(
        &self,
        messages: &[EmailMessage],
    ) -> std::result::Result<Vec<String>, EmailError> {
        let mut batches = self.batches.lock();
        let index = batches.len();
        batches.push(messages.to_vec());
        if self.fail_batch_at == Some(index) {
            return Err(provider_error());
        }
        Ok((0..messages.len())
            .map(|i| format!("batch{}-{}", index, i))
            .collect())
    }
}

// =============================================================================
// Stores
// =============================================================================

/// Memory store that counts every call
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    pub calls: AtomicUsize,
}

impl CountingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SignupStore for CountingStore {
    async fn upsert_signup(&self, signup: &NewSignup) -> Result<Signup> {
        self.hit();
        self.inner.upsert_signup(signup).await
    }

    async fn list_signups(&self) -> Result<Vec<Signup>> {
        self.hit();
        self.inner.list_signups().await
    }

    async fn find_signup_by_email(&self, email: &str) -> Result<Option<Signup>> {
        self.hit();
        self.inner.find_signup_by_email(email).await
    }

    async fn insert_email_log(&self, entry: &NewEmailLog) -> Result<i32> {
        self.hit();
        self.inner.insert_email_log(entry).await
    }

    async fn recent_email_logs(&self, limit: i64) -> Result<Vec<EmailLogEntry>> {
        self.hit();
        self.inner.recent_email_logs(limit).await
    }

    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }
}

/// Store whose database is unreachable
pub struct FailingStore;

fn unavailable() -> AppError {
    AppError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl SignupStore for FailingStore {
    async fn upsert_signup(&self, _signup: &NewSignup) -> Result<Signup> {
        Err(unavailable())
    }

    async fn list_signups(&self) -> Result<Vec<Signup>> {
        Err(unavailable())
    }

    async fn find_signup_by_email(&self, _email: &str) -> Result<Option<Signup>> {
        Err(unavailable())
    }

    async fn insert_email_log(&self, _entry: &NewEmailLog) -> Result<i32> {
        Err(unavailable())
    }

    async fn recent_email_logs(&self, _limit: i64) -> Result<Vec<EmailLogEntry>> {
        Err(unavailable())
    }

    async fn ping(&self) -> Result<()> {
        Err(unavailable())
    }
}

pub async fn seed(store: &dyn SignupStore, emails: &[&str]) {
    for (i, email) in emails.iter().enumerate() {
        store
            .upsert_signup(&NewSignup::new(format!("User {}", i), *email, None, None))
            .await
            .unwrap();
    }
}

// =============================================================================
// Fake geolocation providers
// =============================================================================

/// Serve `router` on a random local port and return its base URL
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A port that accepts connections and never answers
pub async fn serve_silent() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}", addr)
}

/// ip-api style provider answering `body` for every lookup
pub async fn serve_ip_api(body: Value) -> String {
    let router = Router::new().route(
        "/json/:ip",
        get(move || {
            let body = body.clone();
            async move { axum::Json(body) }
        }),
    );
    format!("{}/json", serve(router).await)
}

/// ip-api style provider that succeeds on the first lookup and fails afterwards
pub async fn serve_ip_api_once(body: Value) -> String {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new().route(
        "/json/:ip",
        get(move || {
            let body = body.clone();
            let hits = hits.clone();
            async move {
                if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                    axum::Json(body)
                } else {
                    axum::Json(serde_json::json!({ "status": "fail", "message": "quota" }))
                }
            }
        }),
    );
    format!("{}/json", serve(router).await)
}

/// Provider that always answers 500
pub async fn serve_broken() -> String {
    let router = Router::new().fallback(|| async { StatusCode::INTERNAL_SERVER_ERROR });
    serve(router).await
}

// =============================================================================
// Requests
// =============================================================================

pub async fn body_to_json(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn make_post_request(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

/// POST from a public client address
pub fn make_forwarded_post(uri: &str, body: String, ip: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(body))
        .unwrap()
}

pub fn make_get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}
