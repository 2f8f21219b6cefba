//! API session handling: bearer tokens in a cookie-like store and
//! single-flight refresh-and-replay on 401/403.

pub mod config;
pub mod coordinator;
pub mod store;
pub mod tokens;
pub mod transport;

pub use config::SessionConfig;
pub use coordinator::{LoginRedirect, RecordingRedirect, SessionCoordinator};
pub use store::{MemorySessionStore, SessionStore};
pub use tokens::{SessionTokens, TokenLifetimes};
pub use transport::{ApiRequest, ApiResponse, ApiTransport, HttpTransport, Method};
