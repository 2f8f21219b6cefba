use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::tokens::TokenLifetimes;

/// Settings for one API client and its session coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// API root, e.g. `https://api.example.co.id/api/v1`
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub access_token_max_age_secs: i64,
    pub refresh_token_max_age_secs: i64,
    /// Where the browser is sent when the session cannot be recovered
    pub login_path: String,
    /// Endpoint exchanging a refresh token for a new pair
    pub refresh_path: String,
    pub logout_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".into(),
            request_timeout_secs: 60,
            access_token_max_age_secs: 15 * 60,
            refresh_token_max_age_secs: 24 * 60 * 60,
            login_path: "/login".into(),
            refresh_path: "/auth/refresh".into(),
            logout_path: "/auth/logout".into(),
        }
    }
}

impl SessionConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    /// Cookie max-ages. Out-of-range values saturate instead of panicking.
    pub fn lifetimes(&self) -> TokenLifetimes {
        TokenLifetimes {
            access: max_age(self.access_token_max_age_secs),
            refresh: max_age(self.refresh_token_max_age_secs),
        }
    }
}

fn max_age(secs: i64) -> Duration {
    Duration::try_seconds(secs).unwrap_or(if secs < 0 { Duration::MIN } else { Duration::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: SessionConfig =
            serde_json::from_str(r#"{ "base_url": "https://kpr.test/api", "request_timeout_secs": 30 }"#)
                .unwrap();
        assert_eq!(cfg.base_url, "https://kpr.test/api");
        assert_eq!(cfg.request_timeout().as_secs(), 30);
        assert_eq!(cfg.login_path, "/login");
        assert_eq!(cfg.lifetimes(), TokenLifetimes::default());
    }

    #[test]
    fn test_out_of_range_max_age_saturates() {
        let cfg: SessionConfig = serde_json::from_str(&format!(
            r#"{{ "access_token_max_age_secs": {}, "refresh_token_max_age_secs": {} }}"#,
            i64::MAX,
            i64::MIN
        ))
        .unwrap();
        let lifetimes = cfg.lifetimes();
        assert_eq!(lifetimes.access, Duration::MAX);
        assert_eq!(lifetimes.refresh, Duration::MIN);
    }
}
