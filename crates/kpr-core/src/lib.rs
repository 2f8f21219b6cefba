pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "session")]
pub mod session;

pub use error::KprError;
#[cfg(feature = "session")]
pub use error::SessionError;
pub use types::*;

/// Standard result type for all kpr-core operations
pub type KprResult<T> = Result<T, KprError>;
