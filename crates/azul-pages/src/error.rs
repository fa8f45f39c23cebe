use thiserror::Error;

/// Errors returned by payment-page operations.
#[derive(Debug, Error)]
pub enum AzulError {
    /// The acquirer configuration is unusable (missing merchant fields or
    /// auth key). Blocks checkout before anything is sent to the acquirer.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A checkout request or acquirer callback failed validation: missing
    /// or duplicate reference, signature mismatch, malformed amount.
    #[error("validation error: {0}")]
    Validation(String),

    /// The transaction store could not complete a lookup or write.
    #[error("storage error: {0}")]
    Store(String),
}
