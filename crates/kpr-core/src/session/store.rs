//! Token storage.
//!
//! The dashboard keeps its tokens in browser cookies. [`SessionStore`] is the
//! seam the coordinator talks to; [`MemorySessionStore`] is a cookie jar with
//! per-cookie max-age that backs tests and non-browser clients.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

use super::tokens::{
    SessionTokens, TokenLifetimes, ACCESS_TOKEN_COOKIE, LEGACY_COOKIE_NAMES, REFRESH_TOKEN_COOKIE,
};

/// Where the access/refresh pair lives between requests.
pub trait SessionStore: Send + Sync {
    /// Current bearer token, if present and not expired.
    fn access_token(&self) -> Option<String>;

    /// Current refresh token, if present and not expired.
    fn refresh_token(&self) -> Option<String>;

    /// Persist a new pair with independent expirations.
    fn store(&self, tokens: &SessionTokens, lifetimes: &TokenLifetimes);

    /// Remove both tokens.
    fn clear(&self);
}

#[derive(Debug, Clone)]
struct Cookie {
    value: String,
    expires_at: DateTime<Utc>,
}

impl Cookie {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// `now + max_age`, pinned to the representable range.
fn expiry(now: DateTime<Utc>, max_age: Duration) -> DateTime<Utc> {
    now.checked_add_signed(max_age).unwrap_or(if max_age < Duration::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// In-memory cookie jar.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    cookies: Mutex<HashMap<String, Cookie>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jar pre-loaded with a token pair.
    pub fn with_tokens(tokens: &SessionTokens, lifetimes: &TokenLifetimes) -> Self {
        let store = Self::new();
        store.store(tokens, lifetimes);
        store
    }

    /// Set an arbitrary cookie.
    pub fn set_cookie(&self, name: &str, value: &str, max_age: Duration) {
        self.cookies.lock().insert(
            name.to_string(),
            Cookie {
                value: value.to_string(),
                expires_at: expiry(Utc::now(), max_age),
            },
        );
    }

    /// Read a cookie by name, ignoring expired entries.
    pub fn cookie(&self, name: &str) -> Option<String> {
        let now = Utc::now();
        self.cookies
            .lock()
            .get(name)
            .filter(|c| c.is_live(now))
            .map(|c| c.value.clone())
    }

    /// Whether a cookie entry exists at all, expired or not.
    pub fn contains(&self, name: &str) -> bool {
        self.cookies.lock().contains_key(name)
    }

    fn purge_legacy(cookies: &mut HashMap<String, Cookie>) {
        for name in LEGACY_COOKIE_NAMES {
            cookies.remove(*name);
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn access_token(&self) -> Option<String> {
        self.cookie(ACCESS_TOKEN_COOKIE)
    }

    fn refresh_token(&self) -> Option<String> {
        self.cookie(REFRESH_TOKEN_COOKIE)
    }

    fn store(&self, tokens: &SessionTokens, lifetimes: &TokenLifetimes) {
        let now = Utc::now();
        let mut cookies = self.cookies.lock();
        Self::purge_legacy(&mut cookies);
        cookies.insert(
            ACCESS_TOKEN_COOKIE.to_string(),
            Cookie {
                value: tokens.access_token.clone(),
                expires_at: expiry(now, lifetimes.access),
            },
        );
        cookies.insert(
            REFRESH_TOKEN_COOKIE.to_string(),
            Cookie {
                value: tokens.refresh_token.clone(),
                expires_at: expiry(now, lifetimes.refresh),
            },
        );
    }

    fn clear(&self) {
        let mut cookies = self.cookies.lock();
        Self::purge_legacy(&mut cookies);
        cookies.remove(ACCESS_TOKEN_COOKIE);
        cookies.remove(REFRESH_TOKEN_COOKIE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> SessionTokens {
        SessionTokens::new("access-1", "refresh-1")
    }

    #[test]
    fn test_store_and_read() {
        let store = MemorySessionStore::with_tokens(&pair(), &TokenLifetimes::default());
        assert_eq!(store.access_token().as_deref(), Some("access-1"));
        assert_eq!(store.refresh_token().as_deref(), Some("refresh-1"));
    }

    #[test]
    fn test_independent_expiry() {
        let lifetimes = TokenLifetimes {
            access: Duration::zero(),
            refresh: Duration::hours(24),
        };
        let store = MemorySessionStore::with_tokens(&pair(), &lifetimes);
        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token().as_deref(), Some("refresh-1"));
    }

    #[test]
    fn test_extreme_lifetimes_do_not_overflow() {
        let lifetimes = TokenLifetimes {
            access: Duration::MAX,
            refresh: Duration::MIN,
        };
        let store = MemorySessionStore::with_tokens(&pair(), &lifetimes);
        assert_eq!(store.access_token().as_deref(), Some("access-1"));
        assert_eq!(store.refresh_token(), None);
    }

    #[test]
    fn test_clear_removes_tokens_and_legacy_names() {
        let store = MemorySessionStore::with_tokens(&pair(), &TokenLifetimes::default());
        store.set_cookie("accessToken", "stale", Duration::hours(1));
        store.clear();
        assert!(!store.contains(ACCESS_TOKEN_COOKIE));
        assert!(!store.contains(REFRESH_TOKEN_COOKIE));
        assert!(!store.contains("accessToken"));
    }

    #[test]
    fn test_store_purges_legacy_names() {
        let store = MemorySessionStore::new();
        store.set_cookie("refresh_token", "stale", Duration::hours(1));
        store.store(&pair(), &TokenLifetimes::default());
        assert!(!store.contains("refresh_token"));
        assert!(store.contains(REFRESH_TOKEN_COOKIE));
    }
}
