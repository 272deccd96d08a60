//! Error types for form intake
//!
//! Every failure on the submission path ends up as an [`IntakeError`], whose
//! `Display` text is what the POST handler reports back to the submitter.
//! - Configuration errors (spreadsheet never configured)
//! - Spreadsheet access errors
//! - Malformed payloads
//! - Storage failures during header or row writes

/// Main intake error type
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    /// Spreadsheet identifier is unset or still the placeholder
    #[error("configuration error: {0}")]
    Config(String),

    /// Spreadsheet could not be opened
    #[error(
        "could not open spreadsheet: check that the spreadsheet id is correct and the \
         service has access to it ({source})"
    )]
    SpreadsheetUnavailable {
        /// The underlying store failure
        #[source]
        source: StoreError,
    },

    /// Request body is not a JSON object
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Read or write against the worksheet failed
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl IntakeError {
    /// Check if error stems from deployment configuration rather than the request
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_) | Self::SpreadsheetUnavailable { .. })
    }

    /// Check if the submitter sent something unusable
    #[inline]
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MalformedPayload(_))
    }
}

/// Errors raised by a [`SheetStore`](crate::store::SheetStore) backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Spreadsheet or worksheet does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller lacks access to the resource
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Credentials could not be obtained or were rejected
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Request never produced a response
    #[error("transport failure: {0}")]
    Transport(String),

    /// Backend answered with an error status
    #[error("api error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error text reported by the backend
        message: String,
    },

    /// Backend answered with something we could not interpret
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl StoreError {
    /// Whether the error means the resolved worksheet handle went stale
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
