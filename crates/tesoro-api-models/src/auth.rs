//! Login response parsing.

use serde::Serialize;
use serde_json::Value;

use crate::first_match;

const TOKEN_PATHS: &[&str] = &[
    "/token",
    "/accessToken",
    "/access_token",
    "/data/token",
    "/data/accessToken",
];
const ROLE_PATHS: &[&str] = &["/role", "/user/role", "/data/role", "/data/user/role"];
const NAME_PATHS: &[&str] = &["/name", "/user/name", "/data/name", "/data/user/name"];

/// Login endpoint path.
pub const LOGIN_PATH: &str = "/auth/login";

/// Credentials posted to [`LOGIN_PATH`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// Fields the admin client needs from a login response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginResponse {
    /// Bearer token, empty when the server returned none.
    pub token: String,
    /// Lowercased role name.
    pub role: String,
    /// Display name, empty when absent.
    pub name: String,
}

impl LoginResponse {
    /// Extract token, role and name from whichever envelope the server used.
    #[must_use]
    pub fn from_value(body: &Value) -> Self {
        let text = |paths: &[&str]| {
            first_match(body, paths, |value| {
                value.as_str().filter(|text| !text.is_empty()).map(str::to_string)
            })
            .unwrap_or_default()
        };
        Self {
            token: text(TOKEN_PATHS),
            role: text(ROLE_PATHS).to_lowercase(),
            name: text(NAME_PATHS),
        }
    }

    /// Whether the response carries the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

#[cfg(test)]
mod tests {
    use super::LoginResponse;
    use serde_json::json;

    #[test]
    fn reads_nested_data_envelope() {
        let response = LoginResponse::from_value(&json!({
            "data": { "accessToken": "t-1", "user": { "role": "ADMIN", "name": "Root" } }
        }));
        assert_eq!(response.token, "t-1");
        assert_eq!(response.role, "admin");
        assert_eq!(response.name, "Root");
        assert!(response.is_admin());
    }

    #[test]
    fn top_level_fields_win() {
        let response = LoginResponse::from_value(&json!({
            "token": "top", "role": "user", "data": { "token": "nested" }
        }));
        assert_eq!(response.token, "top");
        assert!(!response.is_admin());
    }

    #[test]
    fn missing_fields_are_empty() {
        let response = LoginResponse::from_value(&json!({"ok": true}));
        assert_eq!(response, LoginResponse::default());
    }
}
