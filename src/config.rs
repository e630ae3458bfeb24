use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_FROM_ADDRESS, DEFAULT_GEOJS_URL, DEFAULT_IPAPI_URL, DEFAULT_IP_API_URL,
    DEFAULT_IP_DETECT_URL, DEFAULT_RESEND_API_URL, MIN_API_KEY_LEN,
};

/// Which backing store the server persists signups in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

/// Email provider settings
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub from_address: String,
    /// Redirect every outbound message to the provider's sandbox inbox
    pub test_mode: bool,
}

impl EmailConfig {
    /// Returns the API key only when it looks usable (non-empty, minimum length)
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| key.len() >= MIN_API_KEY_LEN)
    }
}

/// Geolocation lookup settings
#[derive(Debug, Clone)]
pub struct GeoConfig {
    pub timeout: Duration,
    pub ip_detect_url: String,
    pub ip_api_url: Option<String>,
    pub geojs_url: Option<String>,
    pub ipapi_url: Option<String>,
}

/// Server-verified admin credential. Absent means the admin routes are open.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
    pub token_secret: String,
    pub token_ttl_secs: i64,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub storage: StorageKind,
    pub database_url: Option<String>,
    pub email: EmailConfig,
    pub geo: GeoConfig,
    pub admin: Option<AdminConfig>,
    pub environment: String,
}

/// Read an optional provider URL; an explicitly empty value disables the provider
fn provider_url(key: &str, default: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => None,
        Ok(value) => Some(value.trim().to_string()),
        Err(_) => Some(default.to_string()),
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let storage = match env::var("STORAGE")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" | "pg" => StorageKind::Postgres,
            "memory" => StorageKind::Memory,
            other => return Err(format!("Invalid STORAGE: {}", other)),
        };

        let database_url = non_empty_var("DATABASE_URL");
        if storage == StorageKind::Postgres && database_url.is_none() {
            return Err("DATABASE_URL must be set when STORAGE=postgres".to_string());
        }

        let email = EmailConfig {
            api_key: non_empty_var("RESEND_API_KEY"),
            api_url: env::var("RESEND_API_URL")
                .unwrap_or_else(|_| DEFAULT_RESEND_API_URL.to_string()),
            from_address: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            test_mode: env::var("RESEND_TEST_MODE")
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        };

        let geo_timeout_ms: u64 = env::var("GEO_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .map_err(|_| "Invalid GEO_TIMEOUT_MS")?;

        let geo = GeoConfig {
            timeout: Duration::from_millis(geo_timeout_ms),
            ip_detect_url: env::var("GEO_IP_DETECT_URL")
                .unwrap_or_else(|_| DEFAULT_IP_DETECT_URL.to_string()),
            ip_api_url: provider_url("GEO_IP_API_URL", DEFAULT_IP_API_URL),
            geojs_url: provider_url("GEO_GEOJS_URL", DEFAULT_GEOJS_URL),
            ipapi_url: provider_url("GEO_IPAPI_URL", DEFAULT_IPAPI_URL),
        };

        let admin = match non_empty_var("ADMIN_PASSWORD") {
            Some(password) => {
                let token_secret = non_empty_var("ADMIN_TOKEN_SECRET")
                    .ok_or("ADMIN_TOKEN_SECRET must be set when ADMIN_PASSWORD is set")?;
                let token_ttl_secs = env::var("ADMIN_TOKEN_TTL_SECS")
                    .unwrap_or_else(|_| "28800".to_string())
                    .parse()
                    .map_err(|_| "Invalid ADMIN_TOKEN_TTL_SECS")?;
                Some(AdminConfig {
                    email: env::var("ADMIN_EMAIL").unwrap_or_default(),
                    password,
                    token_secret,
                    token_ttl_secs,
                })
            }
            None => None,
        };

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        Ok(Config {
            server_host,
            server_port,
            storage,
            database_url,
            email,
            geo,
            admin,
            environment,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
