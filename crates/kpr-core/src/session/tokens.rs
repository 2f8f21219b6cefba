use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cookie holding the short-lived bearer token.
pub const ACCESS_TOKEN_COOKIE: &str = "token";
/// Cookie holding the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
/// Names written by earlier dashboard releases. Deleted on every session write.
pub const LEGACY_COOKIE_NAMES: &[&str] = &["accessToken", "access_token", "refresh_token", "authToken"];

/// The bearer/refresh pair issued by `/auth/login`, `/auth/verify-otp` and
/// `/auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

impl SessionTokens {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Pull a token pair out of an auth response body.
    ///
    /// The backend answers either `{ accessToken, refreshToken }` or the same
    /// wrapped in `data`, with `token` as an older alias for the access token.
    /// A body without a new refresh token keeps `current_refresh`.
    pub fn from_auth_body(body: &Value, current_refresh: &str) -> Option<Self> {
        let payload = match body.get("data") {
            Some(data) if data.is_object() => data,
            _ => body,
        };

        let access = ["accessToken", "access_token", "token"]
            .iter()
            .find_map(|k| payload.get(*k).and_then(Value::as_str))
            .filter(|s| !s.is_empty())?;

        let refresh = ["refreshToken", "refresh_token"]
            .iter()
            .find_map(|k| payload.get(*k).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .unwrap_or(current_refresh);

        if refresh.is_empty() {
            return None;
        }

        Some(Self::new(access, refresh))
    }
}

/// Max-age of each cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::minutes(15),
            refresh: Duration::hours(24),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_body() {
        let body = json!({ "accessToken": "a1", "refreshToken": "r1" });
        assert_eq!(
            SessionTokens::from_auth_body(&body, "old"),
            Some(SessionTokens::new("a1", "r1"))
        );
    }

    #[test]
    fn test_wrapped_body_with_legacy_token_key() {
        let body = json!({ "success": true, "data": { "token": "a2" } });
        assert_eq!(
            SessionTokens::from_auth_body(&body, "old"),
            Some(SessionTokens::new("a2", "old"))
        );
    }

    #[test]
    fn test_missing_access_token() {
        let body = json!({ "data": { "refreshToken": "r" } });
        assert_eq!(SessionTokens::from_auth_body(&body, "old"), None);
        assert_eq!(SessionTokens::from_auth_body(&json!({ "accessToken": "" }), "old"), None);
    }

    #[test]
    fn test_default_lifetimes() {
        let l = TokenLifetimes::default();
        assert_eq!(l.access.num_minutes(), 15);
        assert_eq!(l.refresh.num_hours(), 24);
    }
}
