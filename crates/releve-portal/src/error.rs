//! Error types for portal access.

use thiserror::Error;

/// Errors raised while talking to the portal.
#[derive(Error, Debug)]
pub enum PortalError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The session cookie is no longer accepted (HTTP 401).
    #[error("portal session expired")]
    SessionExpired,

    /// The portal refused the download.
    #[error("download failed for {client}: HTTP {status}")]
    Download { client: String, status: u16 },

    /// The response body is not a PDF document.
    #[error("response for {client} is not a PDF")]
    NotAPdf { client: String },

    /// The batch was cancelled before this download could run.
    #[error("batch cancelled")]
    Cancelled,
}
