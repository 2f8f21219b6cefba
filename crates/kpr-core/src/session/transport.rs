//! Wire side of the API client: request/response values, the transport seam
//! and its `reqwest` implementation.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::config::SessionConfig;
use super::tokens::SessionTokens;
use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// An API call relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Patch, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// The same call marked as already replayed after a refresh.
    pub fn into_retry(mut self) -> Self {
        self.retried = true;
        self
    }

    pub fn is_retry(&self) -> bool {
        self.retried
    }
}

/// Status and decoded body of an HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 401 and 403 both mean the bearer token is no longer accepted.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status, 401 | 403)
    }

    /// Server-provided error message, falling back to the status line.
    pub fn error_message(&self) -> String {
        ["message", "error"]
            .iter()
            .find_map(|k| self.body.get(*k).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| {
                reqwest::StatusCode::from_u16(self.status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("unknown status")
                    .to_string()
            })
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, SessionError> {
        Ok(serde_json::from_value(self.body.clone())?)
    }
}

/// Sends requests and performs the token refresh exchange.
///
/// `send` reports every HTTP status as `Ok`; only network-level failures
/// (connect, timeout, unreadable body) are errors.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn send(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<ApiResponse, SessionError>;

    /// Exchange a refresh token. `Ok(None)` when the server answers without a
    /// usable access token.
    async fn refresh(&self, refresh_token: &str) -> Result<Option<SessionTokens>, SessionError>;
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    base_url: String,
    refresh_path: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            refresh_path: config.refresh_path.clone(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn send(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<ApiResponse, SessionError> {
        let url = self.url(&request.path);
        let mut builder = self.client.request(request.method.into(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!(method = ?request.method, %url, status, "api response");

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok(ApiResponse::new(status, body))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Option<SessionTokens>, SessionError> {
        let request = ApiRequest::post(
            self.refresh_path.clone(),
            serde_json::json!({ "refreshToken": refresh_token }),
        );
        let response = self.send(&request, None).await?;
        if !response.is_success() {
            return Err(SessionError::Status {
                status: response.status,
                message: response.error_message(),
            });
        }
        Ok(SessionTokens::from_auth_body(&response.body, refresh_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auth_failure_statuses() {
        assert!(ApiResponse::new(401, Value::Null).is_auth_failure());
        assert!(ApiResponse::new(403, Value::Null).is_auth_failure());
        assert!(!ApiResponse::new(404, Value::Null).is_auth_failure());
        assert!(!ApiResponse::new(500, Value::Null).is_auth_failure());
    }

    #[test]
    fn test_error_message_prefers_body() {
        let r = ApiResponse::new(422, json!({ "message": "NIK sudah terdaftar" }));
        assert_eq!(r.error_message(), "NIK sudah terdaftar");
        assert_eq!(ApiResponse::new(404, Value::Null).error_message(), "Not Found");
    }

    #[test]
    fn test_retry_flag() {
        let req = ApiRequest::get("/kpr-applications").with_query("page", "2");
        assert!(!req.is_retry());
        let retry = req.clone().into_retry();
        assert!(retry.is_retry());
        assert_eq!(retry.query, req.query);
    }

    #[test]
    fn test_url_join() {
        let t = HttpTransport::new(&SessionConfig::new("https://kpr.test/api/")).unwrap();
        assert_eq!(t.url("/auth/login"), "https://kpr.test/api/auth/login");
        assert_eq!(t.url("users/me"), "https://kpr.test/api/users/me");
    }
}
