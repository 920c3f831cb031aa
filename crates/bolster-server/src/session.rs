//! Cookie-backed session middleware and request extractors.
//!
//! The middleware resolves the session cookie to stored session data
//! (creating a fresh session when absent or expired), exposes it to
//! handlers through request extensions, and persists it after the
//! handler runs. The cookie is HTTP-only with a 24-hour lifetime;
//! `Secure` is added when configured for production.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::{header, request::Parts, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use bolster_auth::{FlashKind, SessionData, SessionId, SESSION_DURATION_SECS};
use bolster_auth::User;
use bolster_commerce::ids::UserId;
use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::state::AppState;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "bolster_session";

/// Handle to the per-request session.
#[derive(Clone)]
pub struct Session {
    id: SessionId,
    inner: Arc<Mutex<SessionData>>,
}

impl Session {
    fn new(id: SessionId, data: SessionData) -> Self {
        Self {
            id,
            inner: Arc::new(Mutex::new(data)),
        }
    }

    /// The session id.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Run a closure against the mutable session data.
    pub fn with<R>(&self, f: impl FnOnce(&mut SessionData) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// Logged-in user id, if any.
    pub fn user_id(&self) -> Option<UserId> {
        self.with(|data| data.user_id.clone())
    }

    /// Current CSRF token.
    pub fn csrf_token(&self) -> String {
        self.with(|data| data.csrf_token.clone())
    }

    /// Verify a submitted CSRF token.
    pub fn verify_csrf(&self, token: &str) -> Result<(), AppError> {
        self.with(|data| data.verify_csrf(token)).map_err(AppError::from)
    }

    /// Queue a flash message.
    pub fn flash(&self, kind: FlashKind, text: impl Into<String>) {
        self.with(|data| data.flash(kind, text));
    }

    /// Copy of the current session data.
    fn snapshot(&self) -> SessionData {
        self.with(|data| data.clone())
    }
}

/// Load-or-create the session, expose it, and persist it afterwards.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_id = request
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(cookie_value)
        .and_then(|value| decode_cookie(&state.config.session_secret, &value));

    let (id, data, is_new) = match cookie_id {
        Some(id) => {
            let id = SessionId::from(id);
            match state.db.load_session(&id).await {
                Ok(Some(data)) if !data.is_expired() => (id, data, false),
                Ok(_) => (SessionId::generate(), SessionData::new(), true),
                Err(e) => {
                    tracing::error!(error = %e, "session load failed");
                    (SessionId::generate(), SessionData::new(), true)
                }
            }
        }
        None => (SessionId::generate(), SessionData::new(), true),
    };

    let session = Session::new(id, data);
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    let data = session.snapshot();
    if let Err(e) = state.db.save_session(session.id(), &data).await {
        tracing::error!(error = %e, "session save failed");
    }

    if is_new {
        if let Ok(value) = set_cookie_header(
            session.id(),
            &state.config.session_secret,
            state.config.cookie_secure,
        ) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}

/// Extract our session cookie's value from a Cookie header.
fn cookie_value(header: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

fn set_cookie_header(id: &SessionId, secret: &str, secure: bool) -> Result<HeaderValue, AppError> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        encode_cookie(secret, id.as_str()),
        SESSION_DURATION_SECS
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(|e| AppError::Internal(e.to_string()))
}

/// Sign a session id into its cookie form: `<id>.<hmac-hex>`.
fn encode_cookie(secret: &str, id: &str) -> String {
    format!("{}.{}", id, cookie_signature(secret, id))
}

/// Verify a signed cookie value, returning the session id.
fn decode_cookie(secret: &str, value: &str) -> Option<String> {
    let (id, supplied) = value.rsplit_once('.')?;
    let expected = cookie_signature(secret, id);
    if constant_time_eq(expected.as_bytes(), supplied.as_bytes()) {
        Some(id.to_string())
    } else {
        tracing::warn!("session cookie signature mismatch");
        None
    }
}

fn cookie_signature(secret: &str, id: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(id.as_bytes());
    mac.finalize()
        .into_bytes()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

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

impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session middleware not installed".to_string()))
    }
}

/// Extractor for routes that require a logged-in user.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;

        let Some(user_id) = session.user_id() else {
            session.flash(FlashKind::Error, "Please log in to access this page");
            return Err(AppError::Unauthorized);
        };

        match state.db.find_user(&user_id).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                session.with(|data| data.logout());
                Err(AppError::Unauthorized)
            }
        }
    }
}

/// Extractor for routes that require the admin role.
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            session.flash(FlashKind::Error, "You are not authorized to view this page");
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value_parsing() {
        assert_eq!(
            cookie_value("bolster_session=abc123; other=x"),
            Some("abc123".to_string())
        );
        assert_eq!(
            cookie_value("other=x;  bolster_session=abc123"),
            Some("abc123".to_string())
        );
        assert_eq!(cookie_value("other=x"), None);
    }

    #[test]
    fn test_set_cookie_attributes() {
        let id = SessionId::generate();
        let value = set_cookie_header(&id, "secret", false).unwrap();
        let s = value.to_str().unwrap();
        assert!(s.contains("HttpOnly"));
        assert!(s.contains("Max-Age=86400"));
        assert!(!s.contains("Secure"));

        let value = set_cookie_header(&id, "secret", true).unwrap();
        assert!(value.to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn test_signed_cookie_roundtrip() {
        let encoded = encode_cookie("secret", "sess_abc");
        assert_eq!(decode_cookie("secret", &encoded), Some("sess_abc".to_string()));
    }

    #[test]
    fn test_tampered_cookie_rejected() {
        let encoded = encode_cookie("secret", "sess_abc");
        let forged = encoded.replace("sess_abc", "sess_xyz");
        assert_eq!(decode_cookie("secret", &forged), None);
        assert_eq!(decode_cookie("other_secret", &encoded), None);
        assert_eq!(decode_cookie("secret", "no-dot-here"), None);
    }

    #[test]
    fn test_session_handle_mutation() {
        let session = Session::new(SessionId::generate(), SessionData::new());
        session.flash(FlashKind::Success, "hi");
        assert_eq!(session.snapshot().flash.len(), 1);
        assert!(session.user_id().is_none());
    }
}
