//! Admin session persistence and the route guard in front of the portal.
//!
//! # Design
//! - The session is three plain strings in a [`KeyValueStore`]; an empty token means signed out.
//! - Token claims are read best-effort and never verified; the backend remains the authority.
//! - Any non-admin role or a 401 response clears the whole session.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use tesoro_api_models::LoginResponse;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::error::UiError;
use crate::core::store::{SharedStore, StorePatch};

/// Storage key for the bearer token.
pub const TOKEN_KEY: &str = "tesoro.token";
/// Storage key for the lowercased role.
pub const ROLE_KEY: &str = "tesoro.role";
/// Storage key for the display name.
pub const NAME_KEY: &str = "tesoro.name";
/// Only role allowed into the portal.
pub const ADMIN_ROLE: &str = "admin";
/// Message shown on the login page after a non-admin is turned away.
pub const ADMIN_ONLY_MESSAGE: &str = "Only admins can access this portal.";

/// Signed-in admin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminSession {
    /// Bearer token.
    pub token: String,
    /// Lowercased role.
    pub role: String,
    /// Display name.
    pub name: String,
}

/// Why a login response was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    /// The response carried no token.
    #[error("login response did not include a token")]
    MissingToken,
    /// The account is not an admin.
    #[error("Only admins can access this portal.")]
    NotAdmin,
}

impl From<LoginError> for UiError {
    fn from(error: LoginError) -> Self {
        match error {
            LoginError::MissingToken => Self::validation("token", "is missing"),
            LoginError::NotAdmin => Self::validation("role", "must be admin"),
        }
    }
}

/// Claims read from a JWT payload without verification.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Role claim, if present.
    #[serde(default)]
    pub role: Option<String>,
    /// Expiry in seconds since the epoch.
    #[serde(default)]
    pub exp: Option<u64>,
}

impl TokenClaims {
    /// Decode the payload segment of `token`; `None` for opaque or malformed tokens.
    #[must_use]
    pub fn decode(token: &str) -> Option<Self> {
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Whether `exp` lies at or before `now_ms`.
    #[must_use]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.exp
            .is_some_and(|exp| exp.saturating_mul(1000) <= now_ms)
    }
}

/// Decision for a protected route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteAccess {
    /// Render the route.
    Allowed(AdminSession),
    /// Redirect to the login page.
    Login,
    /// Redirect to the login page with an explanation.
    Denied {
        /// Message for the login page.
        message: &'static str,
    },
}

/// Session persisted in a key/value store (local storage in the browser).
#[derive(Clone)]
pub struct SessionStore {
    store: SharedStore,
}

impl SessionStore {
    /// Session backed by `store`.
    #[must_use]
    pub const fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Stored session, if a token is present.
    #[must_use]
    pub fn load(&self) -> Option<AdminSession> {
        let read = |key: &str| self.store.get(key).unwrap_or_default();
        let token = read(TOKEN_KEY);
        if token.trim().is_empty() {
            return None;
        }
        Some(AdminSession {
            token,
            role: read(ROLE_KEY).to_lowercase(),
            name: read(NAME_KEY),
        })
    }

    /// Bearer token, if signed in.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.load().map(|session| session.token)
    }

    /// Persist `session` in one write.
    pub fn save(&self, session: &AdminSession) {
        self.store.commit(
            StorePatch::new()
                .set(TOKEN_KEY, session.token.clone())
                .set_or_remove(ROLE_KEY, &session.role)
                .set_or_remove(NAME_KEY, &session.name),
        );
    }

    /// Forget the session.
    pub fn clear(&self) {
        self.store.commit(
            StorePatch::new()
                .remove(TOKEN_KEY)
                .remove(ROLE_KEY)
                .remove(NAME_KEY),
        );
    }

    /// Clear the session when `error` is a 401. Returns whether it did.
    pub fn on_unauthorized(&self, error: &UiError) -> bool {
        if !error.is_unauthorized() {
            return false;
        }
        warn!("session rejected by the server; signing out");
        self.clear();
        true
    }

    /// Validate a login response and persist it.
    ///
    /// # Errors
    /// Returns [`LoginError`] when the response has no token or a non-admin role;
    /// nothing is stored in that case.
    pub fn accept_login(&self, response: &LoginResponse) -> Result<AdminSession, LoginError> {
        if response.token.trim().is_empty() {
            return Err(LoginError::MissingToken);
        }
        if !response.is_admin() {
            return Err(LoginError::NotAdmin);
        }
        let session = AdminSession {
            token: response.token.clone(),
            role: response.role.clone(),
            name: response.name.clone(),
        };
        self.save(&session);
        info!(name = %session.name, "admin signed in");
        Ok(session)
    }
}

/// Decide whether the stored session may enter a protected route.
pub fn guard(session: &SessionStore, now_ms: u64) -> RouteAccess {
    let Some(mut current) = session.load() else {
        return RouteAccess::Login;
    };
    let claims = TokenClaims::decode(&current.token).unwrap_or_default();
    if current.role.is_empty() {
        current.role = claims.role.clone().unwrap_or_default().to_lowercase();
    }
    if current.role != ADMIN_ROLE {
        warn!(role = %current.role, "non-admin session refused");
        session.clear();
        return RouteAccess::Denied {
            message: ADMIN_ONLY_MESSAGE,
        };
    }
    if claims.is_expired(now_ms) {
        info!("session token expired");
        session.clear();
        return RouteAccess::Login;
    }
    RouteAccess::Allowed(current)
}
