use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolkitError {
    #[error("Input errors: {}", .violations.join("; "))]
    Validation { violations: Vec<String> },

    #[error("Not eligible: {}", .reasons.join("; "))]
    Ineligible { reasons: Vec<String> },

    #[error("Invalid input ({field}): {reason}")]
    InvalidInput { field: String, reason: String },

    /// The store committed fewer rows than were submitted. Some rows may
    /// already exist remotely; staged deals are kept for reconciliation.
    #[error("Partial save: stored {saved} of {attempted} deals; staged deals were kept")]
    PartialSave { saved: usize, attempted: usize },

    #[error("Save failed: {0}")]
    SaveFailed(String),

    #[error("Not authenticated: log in first")]
    NotAuthenticated,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ToolkitError {
    /// An accepted amount is too large for the arithmetic built on it.
    pub(crate) fn overflow(field: &str) -> Self {
        ToolkitError::InvalidInput {
            field: field.to_string(),
            reason: "amount is too large to calculate".into(),
        }
    }
}

impl From<serde_json::Error> for ToolkitError {
    fn from(e: serde_json::Error) -> Self {
        ToolkitError::Serialization(e.to_string())
    }
}

impl From<csv::Error> for ToolkitError {
    fn from(e: csv::Error) -> Self {
        ToolkitError::Export(e.to_string())
    }
}

/// Failures reported by the identity provider or the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[cfg(feature = "supabase")]
    #[error("Store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unexpected store response: {0}")]
    Decode(String),

    #[error("Store configuration error: {0}")]
    Config(String),
}
