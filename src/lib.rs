//! Early Access Signup Server Library
//!
//! Signup capture with IP geolocation, welcome and broadcast email, and the
//! admin listing endpoints. Exported for the binary and for integration tests.

pub mod broadcast;
pub mod config;
pub mod constants;
pub mod db;
pub mod email;
pub mod error;
pub mod geo;
pub mod models;
pub mod routes;
pub mod security;

pub use config::Config;
pub use db::{MemoryStore, PgStore, SignupStore};
pub use email::Mailer;
pub use error::{AppError, Result};
pub use geo::GeoResolver;

use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SignupStore>,
    /// `None` when no usable email API key is configured
    pub mailer: Option<Mailer>,
    pub geo: GeoResolver,
    pub config: Config,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SignupStore>,
        mailer: Option<Mailer>,
        geo: GeoResolver,
        config: Config,
    ) -> Self {
        Self {
            store,
            mailer,
            geo,
            config,
        }
    }
}

/// Build the HTTP router with CORS and request tracing
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let admin = Router::new()
        .route("/api/signups", get(routes::list_signups))
        .route("/api/signups/export", get(routes::export_signups))
        .route("/api/stats", get(routes::signup_stats))
        .route("/api/send-broadcast", post(routes::send_broadcast))
        .route("/api/email-logs", get(routes::list_email_logs))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            routes::require_admin,
        ));

    Router::new()
        .route("/health", get(routes::health_check))
        .route("/api/signup", post(routes::signup))
        .route("/api/resend-welcome", post(routes::resend_welcome))
        .route("/api/admin/login", post(routes::admin_login))
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
