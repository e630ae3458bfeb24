use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::db::SignupStore;
use crate::error::{AppError, Result};
use crate::models::{EmailLogEntry, NewEmailLog, NewSignup, Signup};

#[derive(Debug, Default)]
struct Tables {
    signups: Vec<Signup>,
    email_logs: Vec<EmailLogEntry>,
}

/// In-process store with the same upsert semantics as [`super::PgStore`]
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    email_logs_enabled: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::default(),
            email_logs_enabled: true,
        }
    }

    /// A store whose audit table is missing: every log write fails
    pub fn without_email_logs() -> Self {
        Self {
            email_logs_enabled: false,
            ..Self::new()
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignupStore for MemoryStore {
    async fn upsert_signup(&self, signup: &NewSignup) -> Result<Signup> {
        let mut tables = self.tables.write();

        if let Some(existing) = tables.signups.iter_mut().find(|s| s.email == signup.email) {
            existing.merge(signup);
            return Ok(existing.clone());
        }

        let id = tables.signups.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let row = Signup::from_new(id, signup, Utc::now());
        tables.signups.push(row.clone());

        Ok(row)
    }

    async fn list_signups(&self) -> Result<Vec<Signup>> {
        let mut rows = self.tables.read().signups.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn find_signup_by_email(&self, email: &str) -> Result<Option<Signup>> {
        Ok(self
            .tables
            .read()
            .signups
            .iter()
            .find(|s| s.email == email)
            .cloned())
    }

    async fn insert_email_log(&self, entry: &NewEmailLog) -> Result<i32> {
        if !self.email_logs_enabled {
            return Err(AppError::Database(sqlx::Error::Protocol(
                "relation \"email_logs\" does not exist".to_string(),
            )));
        }

        let mut tables = self.tables.write();
        let id = tables.email_logs.len() as i32 + 1;
        tables
            .email_logs
            .push(entry.clone().into_entry(id, Utc::now()));

        Ok(id)
    }

    async fn recent_email_logs(&self, limit: i64) -> Result<Vec<EmailLogEntry>> {
        let tables = self.tables.read();
        Ok(tables
            .email_logs
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
