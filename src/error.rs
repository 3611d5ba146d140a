//! Custom error types for the instrument control layer.
//!
//! `HarpiaError` is the single error type returned by the connector and the
//! device controllers. It separates two fault classes:
//!
//! - **Precondition faults**: `EmptyPath`, `GetWithBody`, `PutWithoutBody`,
//!   `UnknownShutter` and `InvalidSpectraCount`. These are caller bugs. They
//!   are always returned before any request reaches the transport and should
//!   abort the current script step rather than be retried.
//! - **Runtime faults**: `DeviceApi` (the instrument answered with a non-2xx
//!   status), `Transport` (the request never completed) and `Decode` (the
//!   instrument answered 2xx with a body that is not JSON). The caller decides
//!   whether to retry, abort or notify an operator.
//!
//! Notification and configuration failures have their own types
//! (`NotifyError`, [`crate::config::ConfigError`]) so that a broken messaging
//! channel can never be mistaken for an instrument fault.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results using the instrument error type.
pub type HarpiaResult<T> = std::result::Result<T, HarpiaError>;

/// Errors raised while talking to the instrument HTTP API.
#[derive(Error, Debug)]
pub enum HarpiaError {
    /// The request path was empty.
    #[error("Request path must not be empty")]
    EmptyPath,

    /// A GET request was issued with a body.
    #[error("GET requests cannot have a body (path: {path})")]
    GetWithBody {
        /// Requested path.
        path: String,
    },

    /// A PUT request was issued without a body.
    #[error("PUT requests must have a body (path: {path})")]
    PutWithoutBody {
        /// Requested path.
        path: String,
    },

    /// A shutter identifier outside the known set.
    #[error("Invalid shutter '{0}'. Use one of pump, probe, gate")]
    UnknownShutter(String),

    /// Spectra-per-acquisition was not a positive whole number.
    #[error("Invalid spectra_per_acquisition: {0}")]
    InvalidSpectraCount(String),

    /// The instrument answered with a non-success status code.
    #[error("{message}")]
    DeviceApi {
        /// Caller-supplied or synthesized message.
        message: String,
        /// Path of the failing request.
        path: String,
        /// HTTP status code returned by the instrument.
        status: u16,
    },

    /// The request could not be delivered or the response could not be read.
    #[error("Transport error for {url}: {reason}")]
    Transport {
        /// Full URL of the request.
        url: String,
        /// Underlying failure description.
        reason: String,
    },

    /// A success response carried a body that is not valid JSON.
    #[error("Failed to decode JSON response from {path}: {source}")]
    Decode {
        /// Path of the request.
        path: String,
        /// JSON parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The blocking runtime behind the HTTP transport could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarpiaError {
    /// True for faults that indicate a bug in the caller rather than a
    /// failure of the instrument or the network.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::EmptyPath
                | Self::GetWithBody { .. }
                | Self::PutWithoutBody { .. }
                | Self::UnknownShutter(_)
                | Self::InvalidSpectraCount(_)
        )
    }

    /// HTTP status code carried by a `DeviceApi` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::DeviceApi { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised by the operator notification channel.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The image file does not exist.
    #[error("Invalid image path: {0}")]
    ImageNotFound(PathBuf),

    /// The image file has an extension other than png, jpg or jpeg.
    #[error("Invalid image format for {0}. Use .png, .jpg, or .jpeg")]
    UnsupportedImageFormat(PathBuf),

    /// The messaging service could not be reached.
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    /// The messaging service refused the message.
    #[error("Notification rejected (status {status}): {description}")]
    Rejected {
        /// HTTP status returned by the messaging service.
        status: u16,
        /// Service-provided description.
        description: String,
    },

    /// Reading the image or creating the delivery runtime failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NotifyError {
    /// True when the image was rejected before any delivery was attempted.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::ImageNotFound(_) | Self::UnsupportedImageFormat(_)
        )
    }
}
