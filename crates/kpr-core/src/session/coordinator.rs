//! Bearer attachment and single-flight token refresh.
//!
//! Every call goes out with the stored access token. When the server answers
//! 401 or 403 to a call that has not been replayed yet, exactly one refresh
//! runs per coordinator; calls that hit 401/403 while it is in flight wait in
//! a FIFO queue and are replayed with the new token once it lands. A failed
//! refresh clears the session, rejects every waiter and sends the user to the
//! login page once.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use super::store::SessionStore;
use super::tokens::SessionTokens;
use super::transport::{ApiRequest, ApiResponse, ApiTransport, Method};
use crate::error::SessionError;

type Waiter = oneshot::Sender<Result<String, SessionError>>;

/// Hard navigation to the login entry point.
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self, login_path: &str);
}

/// Redirect sink that only remembers where it was asked to go.
#[derive(Debug, Default)]
pub struct RecordingRedirect {
    visits: Mutex<Vec<String>>,
}

impl RecordingRedirect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.visits.lock().len()
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().clone()
    }
}

impl LoginRedirect for RecordingRedirect {
    fn redirect_to_login(&self, login_path: &str) {
        self.visits.lock().push(login_path.to_string());
    }
}

#[derive(Default)]
struct RefreshState {
    is_refreshing: bool,
    pending: VecDeque<Waiter>,
}

/// Per-client session coordinator. Clients backed by different APIs each own
/// one, so their refresh cycles never interfere.
pub struct SessionCoordinator {
    transport: Arc<dyn ApiTransport>,
    store: Arc<dyn SessionStore>,
    redirect: Arc<dyn LoginRedirect>,
    config: SessionConfig,
    state: Mutex<RefreshState>,
}

impl SessionCoordinator {
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        store: Arc<dyn SessionStore>,
        redirect: Arc<dyn LoginRedirect>,
        config: SessionConfig,
    ) -> Self {
        Self {
            transport,
            store,
            redirect,
            config,
            state: Mutex::new(RefreshState::default()),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.lock().is_refreshing
    }

    /// Requests waiting on the in-flight refresh.
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Persist a pair issued by login or OTP verification.
    pub fn establish(&self, tokens: &SessionTokens) {
        self.store.store(tokens, &self.config.lifetimes());
        info!("session established");
    }

    /// Tell the backend the session is over, then drop local tokens. The
    /// logout call is best effort.
    pub async fn logout(&self) {
        if self.store.access_token().is_some() {
            let request = ApiRequest::new(Method::Post, self.config.logout_path.clone());
            if let Err(e) = self.execute(request).await {
                warn!(error = %e, "logout call failed, clearing session anyway");
            }
        }
        self.store.clear();
        info!("session ended");
    }

    /// Send `request` with the current bearer token, refreshing and replaying
    /// once on 401/403.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, SessionError> {
        let bearer = self.store.access_token();
        let response = self.transport.send(&request, bearer.as_deref()).await?;

        if !response.is_auth_failure() {
            return into_result(response);
        }
        if request.is_retry() {
            warn!(path = %request.path, status = response.status, "replayed request still unauthorized");
            return Err(SessionError::Unauthorized {
                status: response.status,
            });
        }

        let token = self.fresh_token().await?;
        let replay = request.into_retry();
        let response = self.transport.send(&replay, Some(&token)).await?;
        if response.is_auth_failure() {
            warn!(path = %replay.path, status = response.status, "replayed request still unauthorized");
            return Err(SessionError::Unauthorized {
                status: response.status,
            });
        }
        into_result(response)
    }

    /// Decode a successful response body into `T`.
    pub async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, SessionError> {
        self.execute(request).await?.json()
    }

    /// Join the in-flight refresh, or lead a new one.
    async fn fresh_token(&self) -> Result<String, SessionError> {
        let waiter = {
            let mut state = self.state.lock();
            if state.is_refreshing {
                let (tx, rx) = oneshot::channel();
                state.pending.push_back(tx);
                Some(rx)
            } else {
                state.is_refreshing = true;
                None
            }
        };

        if let Some(rx) = waiter {
            debug!("refresh in flight, request queued");
            return rx
                .await
                .unwrap_or_else(|_| Err(SessionError::RefreshFailed("refresh abandoned".into())));
        }

        let mut cycle = RefreshCycle {
            state: &self.state,
            outcome: None,
        };
        let outcome = self.run_refresh().await;
        cycle.outcome = Some(outcome.clone());
        drop(cycle);

        if outcome.is_err() {
            self.redirect.redirect_to_login(&self.config.login_path);
        }
        outcome
    }

    async fn run_refresh(&self) -> Result<String, SessionError> {
        info!("access token rejected, refreshing session");

        let result = match self.store.refresh_token() {
            None => Err(SessionError::RefreshFailed("no refresh token".into())),
            Some(refresh_token) => match self.transport.refresh(&refresh_token).await {
                Ok(Some(tokens)) => Ok(tokens),
                Ok(None) => Err(SessionError::RefreshFailed(
                    "refresh response carried no access token".into(),
                )),
                Err(e) => Err(SessionError::RefreshFailed(e.to_string())),
            },
        };

        match result {
            Ok(tokens) => {
                self.store.store(&tokens, &self.config.lifetimes());
                info!("session refreshed");
                Ok(tokens.access_token)
            }
            Err(e) => {
                self.store.clear();
                warn!(error = %e, "session refresh failed, tokens cleared");
                Err(e)
            }
        }
    }
}

/// Ends a refresh cycle: resets the flag and settles every waiter in arrival
/// order. Waiters are rejected if the leading call is dropped mid-refresh.
struct RefreshCycle<'a> {
    state: &'a Mutex<RefreshState>,
    outcome: Option<Result<String, SessionError>>,
}

impl Drop for RefreshCycle<'_> {
    fn drop(&mut self) {
        let pending = {
            let mut state = self.state.lock();
            state.is_refreshing = false;
            std::mem::take(&mut state.pending)
        };
        let outcome = self
            .outcome
            .take()
            .unwrap_or_else(|| Err(SessionError::RefreshFailed("refresh cancelled".into())));
        if !pending.is_empty() {
            debug!(waiters = pending.len(), ok = outcome.is_ok(), "releasing queued requests");
        }
        for tx in pending {
            let _ = tx.send(outcome.clone());
        }
    }
}

fn into_result(response: ApiResponse) -> Result<ApiResponse, SessionError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(SessionError::Status {
            status: response.status,
            message: response.error_message(),
        })
    }
}
