use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::SignupStore;
use crate::error::Result;
use crate::models::{EmailLogEntry, NewEmailLog, NewSignup, Signup};

const SIGNUP_COLUMNS: &str = "id, name, email, ip, city, region, country, country_code, \
     latitude, longitude, timezone, created_at";

/// Postgres-backed store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tables if they do not exist yet
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SignupStore for PgStore {
    async fn upsert_signup(&self, signup: &NewSignup) -> Result<Signup> {
        let row = sqlx::query_as::<_, Signup>(&format!(
            r#"
            INSERT INTO early_access_signups (
                name, email, ip, city, region, country, country_code,
                latitude, longitude, timezone, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW())
            ON CONFLICT (email) DO UPDATE SET
                name = EXCLUDED.name,
                ip = COALESCE(EXCLUDED.ip, early_access_signups.ip),
                city = COALESCE(EXCLUDED.city, early_access_signups.city),
                region = COALESCE(EXCLUDED.region, early_access_signups.region),
                country = COALESCE(EXCLUDED.country, early_access_signups.country),
                country_code = COALESCE(EXCLUDED.country_code, early_access_signups.country_code),
                latitude = COALESCE(EXCLUDED.latitude, early_access_signups.latitude),
                longitude = COALESCE(EXCLUDED.longitude, early_access_signups.longitude),
                timezone = COALESCE(EXCLUDED.timezone, early_access_signups.timezone)
            RETURNING {SIGNUP_COLUMNS}
            "#
        ))
        .bind(&signup.name)
        .bind(&signup.email)
        .bind(&signup.ip)
        .bind(&signup.city)
        .bind(&signup.region)
        .bind(&signup.country)
        .bind(&signup.country_code)
        .bind(signup.latitude)
        .bind(signup.longitude)
        .bind(&signup.timezone)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_signups(&self) -> Result<Vec<Signup>> {
        let rows = sqlx::query_as::<_, Signup>(&format!(
            "SELECT {SIGNUP_COLUMNS} FROM early_access_signups ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_signup_by_email(&self, email: &str) -> Result<Option<Signup>> {
        let row = sqlx::query_as::<_, Signup>(&format!(
            "SELECT {SIGNUP_COLUMNS} FROM early_access_signups WHERE email = $1 LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn insert_email_log(&self, entry: &NewEmailLog) -> Result<i32> {
        let (id,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO email_logs (
                email, recipient_name, email_type, subject, status,
                provider_message_id, error_message, metadata, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            RETURNING id
            "#,
        )
        .bind(&entry.email)
        .bind(&entry.recipient_name)
        .bind(entry.email_type.as_str())
        .bind(&entry.subject)
        .bind(entry.status.as_str())
        .bind(&entry.provider_message_id)
        .bind(&entry.error_message)
        .bind(&entry.metadata)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn recent_email_logs(&self, limit: i64) -> Result<Vec<EmailLogEntry>> {
        let rows = sqlx::query_as::<_, EmailLogEntry>(
            r#"
            SELECT id, email, recipient_name, email_type, subject, status,
                   provider_message_id, error_message, metadata, created_at
            FROM email_logs
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
