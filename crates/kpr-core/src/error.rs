use thiserror::Error;

#[derive(Debug, Error)]
pub enum KprError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid segment sequence at segment {index}: {reason}")]
    InvalidSegmentSequence { index: usize, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for KprError {
    fn from(e: serde_json::Error) -> Self {
        KprError::SerializationError(e.to_string())
    }
}

/// Failures surfaced by the API session coordinator.
#[cfg(feature = "session")]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("Unauthorized: server answered {status} after the token was refreshed")]
    Unauthorized { status: u16 },

    #[error("Session refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

#[cfg(feature = "session")]
impl From<reqwest::Error> for SessionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SessionError::Transport(format!("request timed out: {e}"))
        } else if e.is_decode() {
            SessionError::Decode(e.to_string())
        } else {
            SessionError::Transport(e.to_string())
        }
    }
}

#[cfg(feature = "session")]
impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        SessionError::Decode(e.to_string())
    }
}
