// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture core and its collaborators
//!
//! Each layer has its own error enum; [`AppError`] wraps them for the binary
//! and for callers that do not care which layer failed.

use crate::backends::camera::types::BackendError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Session configuration and lifecycle errors
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    /// Single-shot capture errors
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
    /// Local photo storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    /// Configuration file errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors reported synchronously by device selection and session transitions
///
/// None of these are fatal: a failed `configure()` leaves the session
/// `Unconfigured` and can simply be retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    /// Enumeration produced no usable device
    #[error("No capture device available")]
    NoDeviceAvailable,
    /// Device binding failed (busy, permission denied, ...)
    #[error("Session configuration failed: {0}")]
    ConfigurationFailed(String),
    /// A transition that needs a bound device was requested before `configure()`
    #[error("Session is not configured")]
    NotConfigured,
    /// The hardware refused to start producing frames
    #[error("Failed to start session: {0}")]
    StartFailed(String),
}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        CameraError::ConfigurationFailed(err.to_string())
    }
}

/// Errors carried by a capture result
///
/// `SessionNotRunning` and `NoSinkBound` are local precondition failures.
/// `CaptureHardwareFailure` and `DecodeFailed` only ever arrive through the
/// result sink; the session stays `Running` after them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("Capture session is not running")]
    SessionNotRunning,
    #[error("No result sink bound to the capture request")]
    NoSinkBound,
    #[error("Capture hardware failure: {0}")]
    CaptureHardwareFailure(String),
    #[error("Failed to decode captured image: {0}")]
    DecodeFailed(String),
}

impl From<BackendError> for CaptureError {
    fn from(err: BackendError) -> Self {
        CaptureError::CaptureHardwareFailure(err.to_string())
    }
}

/// Photo storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage task failed: {0}")]
    Task(String),
    #[error("Empty image payload")]
    EmptyPayload,
}

/// Configuration load/save errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_errors_map_per_layer() {
        let camera: CameraError = BackendError::DeviceBusy.into();
        assert!(matches!(camera, CameraError::ConfigurationFailed(_)));

        let capture: CaptureError = BackendError::CaptureFailed("sensor".into()).into();
        assert!(matches!(capture, CaptureError::CaptureHardwareFailure(msg) if msg.contains("sensor")));
    }

    #[test]
    fn test_app_error_wraps_layers() {
        let err: AppError = CaptureError::SessionNotRunning.into();
        assert_eq!(
            err.to_string(),
            "Capture error: Capture session is not running"
        );
    }
}
