pub mod error;
pub mod format;
pub mod parse;
pub mod types;

#[cfg(feature = "credit_limit")]
pub mod credit_limit;

#[cfg(feature = "profitability")]
pub mod profitability;

#[cfg(feature = "profitability")]
pub mod session;

#[cfg(feature = "profitability")]
pub mod store;

#[cfg(feature = "murabahah")]
pub mod murabahah;

pub use error::{StoreError, ToolkitError};
pub use types::*;

/// Standard result type for all toolkit operations
pub type ToolkitResult<T> = Result<T, ToolkitError>;
