/// Maximum messages per provider batch call
pub const BROADCAST_BATCH_SIZE: usize = 100;

/// Number of rows returned by the email log listing
pub const EMAIL_LOG_LIMIT: i64 = 500;

/// Provider API keys shorter than this are treated as unset
pub const MIN_API_KEY_LEN: usize = 10;

/// Provider sandbox inbox used when test mode is on
pub const SANDBOX_ADDRESS: &str = "delivered@resend.dev";

/// Name used in greetings when neither the request nor the store has one
pub const FALLBACK_DISPLAY_NAME: &str = "there";

pub const WELCOME_SUBJECT: &str = "Welcome to Early Access";

/// Domains never included in a broadcast. Any domain ending in `.test` is
/// rejected as well.
pub const BLOCKED_DOMAINS: &[&str] = &[
    "example.com",
    "example.org",
    "example.net",
    "test.com",
    "localhost",
    "mailinator.com",
    "guerrillamail.com",
    "10minutemail.com",
    "tempmail.com",
    "yopmail.com",
];

// =============================================================================
// Default endpoints
// =============================================================================

pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com";
pub const DEFAULT_FROM_ADDRESS: &str = "onboarding@resend.dev";

pub const DEFAULT_IP_DETECT_URL: &str = "https://api.ipify.org?format=json";
pub const DEFAULT_IP_API_URL: &str = "http://ip-api.com/json";
pub const DEFAULT_GEOJS_URL: &str = "https://get.geojs.io/v1/ip/geo";
pub const DEFAULT_IPAPI_URL: &str = "https://ipapi.co";

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_NAME_EMAIL_REQUIRED: &str = "Name and email are required";

pub const ERR_EMAIL_REQUIRED: &str = "Email is required";

pub const ERR_SUBJECT_MESSAGE_REQUIRED: &str = "Subject and message are required";

pub const ERR_EMAIL_NOT_CONFIGURED: &str = "Email service not configured";

pub const ERR_NO_RECIPIENTS: &str = "No valid recipients found";

pub const ERR_INTERNAL: &str = "Something went wrong. Please try again.";
