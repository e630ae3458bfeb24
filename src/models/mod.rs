pub mod email_log;
pub mod signup;

pub use email_log::{EmailLogEntry, EmailStatus, EmailType, NewEmailLog};
pub use signup::{GeoLocation, NewSignup, Signup};
