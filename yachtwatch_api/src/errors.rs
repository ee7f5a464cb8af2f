//! Error types for the source clients.

/// Errors that can occur when talking to an external source.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error, timeout, or unreadable body).
    #[error("request failed")]
    RequestFailed,
    /// The source returned a non-success status with a body snippet.
    #[error("request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The response body did not have the expected shape.
    #[error("unexpected response shape: {0}")]
    BadResponse(String),
}
