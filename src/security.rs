use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Admin credentials
// =============================================================================

/// Compare two secrets without leaking where they differ.
///
/// Both sides are run through HMAC with a per-call key so the comparison time
/// does not depend on the length of the common prefix.
pub fn secrets_match(provided: &str, expected: &str, key: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(key.as_bytes()) else {
        tracing::error!("Failed to create HMAC instance");
        return false;
    };
    mac.update(expected.as_bytes());
    let expected_tag = mac.finalize().into_bytes();

    let Ok(mut mac) = HmacSha256::new_from_slice(key.as_bytes()) else {
        return false;
    };
    mac.update(provided.as_bytes());
    mac.verify_slice(&expected_tag).is_ok()
}

// =============================================================================
// Admin tokens
// =============================================================================

fn token_mac(secret: &str, expires_at: i64) -> Option<HmacSha256> {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        tracing::error!("Admin token secret rejected by HMAC");
        return None;
    };
    mac.update(format!("admin:{}", expires_at).as_bytes());
    Some(mac)
}

fn sign(secret: &str, expires_at: i64) -> Option<String> {
    token_mac(secret, expires_at).map(|mac| hex::encode(mac.finalize().into_bytes()))
}

/// Hex signature check for a token expiring at `expires_at`
fn signature_valid(secret: &str, expires_at: i64, signature: &str) -> bool {
    let Ok(tag) = hex::decode(signature) else {
        tracing::warn!("Admin token signature is not hex");
        return false;
    };
    token_mac(secret, expires_at).is_some_and(|mac| mac.verify_slice(&tag).is_ok())
}

/// Issue a stateless admin token of the form `<expires_at>.<hex hmac>`
pub fn issue_token(secret: &str, now: i64, ttl_secs: i64) -> Option<(String, i64)> {
    let expires_at = now + ttl_secs;
    let signature = sign(secret, expires_at)?;
    Some((format!("{}.{}", expires_at, signature), expires_at))
}

/// Check signature and expiry of a token produced by [`issue_token`]
pub fn verify_token(token: &str, secret: &str, now: i64) -> bool {
    let Some((expires_at, signature)) = token.split_once('.') else {
        return false;
    };
    let Ok(expires_at) = expires_at.parse::<i64>() else {
        return false;
    };

    if !signature_valid(secret, expires_at, signature) {
        tracing::warn!("Invalid admin token signature");
        return false;
    }

    if now >= expires_at {
        tracing::info!("Expired admin token");
        return false;
    }

    true
}
