//! Domain errors for the Lacework adapter.

use thiserror::Error;

/// Errors surfaced to the host as a command's failure result.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(
        "Lacework API authentication failed. Please validate Account, Sub-Account, API Key, \
         and API Secret. Error: {0}"
    )]
    AuthenticationFailure(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid Alert Severity Threshold was defined: {0}")]
    InvalidSeverity(String),

    #[error("Error: {message}. {hint}: {doc_url}")]
    VendorApi {
        message: String,
        hint: String,
        doc_url: String,
    },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("State store error: {0}")]
    State(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Failed to write output: {0}")]
    Output(String),
}

impl AdapterError {
    /// Build a vendor error carrying a remediation hint and documentation link.
    pub fn vendor(
        message: impl Into<String>,
        hint: impl Into<String>,
        doc_url: impl Into<String>,
    ) -> Self {
        Self::VendorApi {
            message: message.into(),
            hint: hint.into(),
            doc_url: doc_url.into(),
        }
    }

    /// True for errors caused by caller-supplied input rather than the vendor.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_) | Self::InvalidSeverity(_) | Self::UnknownCommand(_)
        )
    }
}

pub type AdapterResult<T> = Result<T, AdapterError>;

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
