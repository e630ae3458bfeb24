pub mod admin;
pub mod broadcast;
pub mod email_logs;
pub mod health;
pub mod signup;
pub mod signups;
pub mod welcome;

pub use admin::{admin_login, require_admin};
pub use broadcast::send_broadcast;
pub use email_logs::list_email_logs;
pub use health::health_check;
pub use signup::signup;
pub use signups::{export_signups, list_signups, signup_stats};
pub use welcome::resend_welcome;
