//! Session state and identifiers.
//!
//! A session carries the cart, the logged-in user (if any), a CSRF token,
//! and queued flash messages. Sessions expire 24 hours after creation.

use bolster_commerce::cart::Cart;
use bolster_commerce::ids::UserId;
use crate::AuthError;
use serde::{Deserialize, Serialize};

/// Session lifetime: 24 hours.
pub const SESSION_DURATION_SECS: i64 = 24 * 60 * 60;

/// A session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new cryptographically random session ID.
    pub fn generate() -> Self {
        Self(generate_token("sess"))
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Kind of flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    /// CSS class hook for templates.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
        }
    }
}

/// A one-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub kind: FlashKind,
    pub text: String,
}

/// Per-session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    /// Logged-in user, if any.
    pub user_id: Option<UserId>,
    /// The session cart.
    pub cart: Cart,
    /// CSRF token expected on state-changing form submissions.
    pub csrf_token: String,
    /// Queued flash messages.
    pub flash: Vec<FlashMessage>,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp when the session expires.
    pub expires_at: i64,
}

impl SessionData {
    /// Create a fresh anonymous session.
    pub fn new() -> Self {
        let now = current_timestamp();
        Self {
            user_id: None,
            cart: Cart::new(),
            csrf_token: generate_token("csrf"),
            flash: Vec::new(),
            created_at: now,
            expires_at: now + SESSION_DURATION_SECS,
        }
    }

    /// Check if the session has expired.
    pub fn is_expired(&self) -> bool {
        current_timestamp() > self.expires_at
    }

    /// Check if a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Log a user in, rotating the CSRF token.
    pub fn login(&mut self, user_id: UserId) {
        self.user_id = Some(user_id);
        self.csrf_token = generate_token("csrf");
    }

    /// Log the user out, clearing user-scoped state.
    pub fn logout(&mut self) {
        self.user_id = None;
        self.cart.clear();
        self.csrf_token = generate_token("csrf");
    }

    /// Verify a submitted CSRF token.
    pub fn verify_csrf(&self, token: &str) -> Result<(), AuthError> {
        if constant_time_eq(self.csrf_token.as_bytes(), token.as_bytes()) {
            Ok(())
        } else {
            Err(AuthError::CsrfMismatch)
        }
    }

    /// Queue a flash message.
    pub fn flash(&mut self, kind: FlashKind, text: impl Into<String>) {
        self.flash.push(FlashMessage {
            kind,
            text: text.into(),
        });
    }

    /// Drain queued flash messages for rendering.
    pub fn take_flash(&mut self) -> Vec<FlashMessage> {
        std::mem::take(&mut self.flash)
    }
}

impl Default for SessionData {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a prefixed random token (18 random bytes, base64-url).
fn generate_token(prefix: &str) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use rand::Rng;

    let bytes: [u8; 18] = rand::thread_rng().gen();
    format!("{}_{}", prefix, URL_SAFE_NO_PAD.encode(bytes))
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Get current Unix timestamp.
fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_anonymous() {
        let session = SessionData::new();
        assert!(!session.is_authenticated());
        assert!(!session.is_expired());
        assert!(session.cart.is_empty());
    }

    #[test]
    fn test_session_id_generation() {
        let id1 = SessionId::generate();
        let id2 = SessionId::generate();
        assert!(id1.as_str().starts_with("sess_"));
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_csrf_verification() {
        let session = SessionData::new();
        let token = session.csrf_token.clone();
        assert!(session.verify_csrf(&token).is_ok());
        assert!(matches!(
            session.verify_csrf("csrf_forged"),
            Err(AuthError::CsrfMismatch)
        ));
    }

    #[test]
    fn test_login_rotates_csrf() {
        let mut session = SessionData::new();
        let before = session.csrf_token.clone();
        session.login(UserId::new("u1"));
        assert!(session.is_authenticated());
        assert_ne!(session.csrf_token, before);
    }

    #[test]
    fn test_logout_clears_cart() {
        use bolster_commerce::cart::LineKey;
        use bolster_commerce::ids::ProductId;

        let mut session = SessionData::new();
        session.login(UserId::new("u1"));
        session
            .cart
            .add(LineKey::new(ProductId::new("p1"), None::<&str>, None::<&str>), 1)
            .unwrap();

        session.logout();
        assert!(!session.is_authenticated());
        assert!(session.cart.is_empty());
    }

    #[test]
    fn test_flash_drains() {
        let mut session = SessionData::new();
        session.flash(FlashKind::Success, "Product added");
        session.flash(FlashKind::Error, "Oops");

        let messages = session.take_flash();
        assert_eq!(messages.len(), 2);
        assert!(session.take_flash().is_empty());
    }
}
