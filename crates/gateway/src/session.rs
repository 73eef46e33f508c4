//! Session cookie signing.
//!
//! The session cookie is name-fixed, HTTP-only, SameSite=Lax, expires
//! after 24 hours, and carries an HMAC-SHA256 signature over its value
//! so it cannot be forged without the session secret. Verification
//! uses constant-time comparison.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Fixed session cookie name.
pub const SESSION_COOKIE: &str = "leadsbox.sid";

const MAX_AGE_SECS: u64 = 60 * 60 * 24;

/// Issues and verifies signed session cookies.
#[derive(Clone)]
pub struct SessionSigner {
    secret: String,
    secure: bool,
}

impl SessionSigner {
    pub fn new(secret: impl Into<String>, secure: bool) -> Self {
        Self {
            secret: secret.into(),
            secure,
        }
    }

    fn sign(&self, value: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(value.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// The `Set-Cookie` header value for a new session.
    pub fn issue(&self, user_id: &str) -> String {
        let signed = format!("{}.{}", user_id, self.sign(user_id));
        let mut cookie = format!(
            "{SESSION_COOKIE}={signed}; Path=/; HttpOnly; SameSite=Lax; Max-Age={MAX_AGE_SECS}"
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Verify a cookie value (`<user_id>.<hex signature>`), returning
    /// the user id when the signature checks out.
    pub fn verify(&self, cookie_value: &str) -> Option<String> {
        let (value, sig_hex) = cookie_value.rsplit_once('.')?;
        let provided = hex::decode(sig_hex).ok()?;

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(value.as_bytes());
        mac.verify_slice(&provided).ok()?;

        Some(value.to_string())
    }
}

/// Pull the session value out of a `Cookie` request header.
pub fn from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|pair| {
            pair.strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("secret", &"[REDACTED]")
            .field("secure", &self.secure)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_sets_cookie_attributes() {
        let signer = SessionSigner::new("secret", false);
        let cookie = signer.issue("10223");
        assert!(cookie.starts_with("leadsbox.sid="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn secure_flag_only_in_production() {
        let signer = SessionSigner::new("secret", true);
        assert!(signer.issue("10223").contains("; Secure"));
    }

    #[test]
    fn round_trip_verifies() {
        let signer = SessionSigner::new("secret", false);
        let cookie = signer.issue("10223");
        let value = cookie
            .strip_prefix("leadsbox.sid=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();
        assert_eq!(signer.verify(value).as_deref(), Some("10223"));
    }

    #[test]
    fn tampered_value_is_rejected() {
        let signer = SessionSigner::new("secret", false);
        let signed = format!("99999.{}", "0".repeat(64));
        assert!(signer.verify(&signed).is_none());
    }

    #[test]
    fn cookie_header_parsing_finds_session() {
        let header = "theme=dark; leadsbox.sid=10223.abcd; other=1";
        assert_eq!(from_cookie_header(header), Some("10223.abcd"));
        assert_eq!(from_cookie_header("theme=dark"), None);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let signer = SessionSigner::new("secret", false);
        let other = SessionSigner::new("other-secret", false);
        let cookie = signer.issue("10223");
        let value = cookie
            .strip_prefix("leadsbox.sid=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();
        assert!(other.verify(value).is_none());
    }
}
