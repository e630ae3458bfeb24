pub mod memory;
pub mod pg;
pub mod pool;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{EmailLogEntry, NewEmailLog, NewSignup, Signup};

pub use memory::MemoryStore;
pub use pg::PgStore;
pub use pool::create_pool;

/// Persistence for signups and the email audit trail.
///
/// Implemented by [`PgStore`] for production and [`MemoryStore`] for tests and
/// local runs without a database.
#[async_trait]
pub trait SignupStore: Send + Sync + 'static {
    /// Insert or update keyed on email and return the stored row.
    ///
    /// On conflict the name is overwritten unconditionally while each location
    /// field is only overwritten when the new value is present.
    async fn upsert_signup(&self, signup: &NewSignup) -> Result<Signup>;

    /// All signups, newest first
    async fn list_signups(&self) -> Result<Vec<Signup>>;

    async fn find_signup_by_email(&self, email: &str) -> Result<Option<Signup>>;

    /// Append an audit row and return its id
    async fn insert_email_log(&self, entry: &NewEmailLog) -> Result<i32>;

    /// Most recent audit rows, newest first
    async fn recent_email_logs(&self, limit: i64) -> Result<Vec<EmailLogEntry>>;

    /// Cheap connectivity probe for the health endpoint
    async fn ping(&self) -> Result<()>;
}
