// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::pipelines::photo::encoding::{EncodingFormat, EncodingQuality};
use serde::{Deserialize, Serialize};

/// Which way a capture device faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraPosition {
    /// Facing the user (selfie camera)
    Front,
    /// Facing away from the user (main camera)
    Back,
    /// Externally attached, position unknown
    External,
}

impl std::fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraPosition::Front => write!(f, "front"),
            CameraPosition::Back => write!(f, "back"),
            CameraPosition::External => write!(f, "external"),
        }
    }
}

/// Lens/sensor class of a capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    /// Standard wide-angle lens, present on virtually every device
    WideAngle,
    UltraWide,
    Telephoto,
    /// Depth / time-of-flight sensor, not usable for photos
    Depth,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceKind::WideAngle => write!(f, "wide-angle"),
            DeviceKind::UltraWide => write!(f, "ultra-wide"),
            DeviceKind::Telephoto => write!(f, "telephoto"),
            DeviceKind::Depth => write!(f, "depth"),
        }
    }
}

/// What a capture device can produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Maximum still-photo width in pixels
    pub max_width: u32,
    /// Maximum still-photo height in pixels
    pub max_height: u32,
    /// Still-photo encodings the device can hand back
    pub formats: Vec<EncodingFormat>,
    pub has_flash: bool,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1080,
            formats: vec![EncodingFormat::Jpeg],
            has_flash: false,
        }
    }
}

/// Represents a capture device
///
/// Immutable once enumerated; the session refers to the selected device
/// but never changes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Stable backend identifier (node id, device path, ...)
    pub id: String,
    /// Human readable name
    pub name: String,
    pub position: CameraPosition,
    pub kind: DeviceKind,
    pub capabilities: DeviceCapabilities,
}

impl CameraDevice {
    /// Create a device with default capabilities
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        position: CameraPosition,
        kind: DeviceKind,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
            kind,
            capabilities: DeviceCapabilities::default(),
        }
    }

    /// Check whether the device can hand back photos in `format`
    pub fn supports(&self, format: EncodingFormat) -> bool {
        self.capabilities.formats.contains(&format)
    }
}

impl std::fmt::Display for CameraDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} {}, {})", self.name, self.position, self.kind, self.id)
    }
}

/// Photo output attached to a configured session
///
/// Mirrors the prepared photo settings of a hardware photo output: the
/// encoding every capture on this output is expected to come back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoOutput {
    pub format: EncodingFormat,
}

impl Default for PhotoOutput {
    fn default() -> Self {
        Self {
            format: EncodingFormat::Jpeg,
        }
    }
}

/// Per-shot settings handed to the hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoSettings {
    pub format: EncodingFormat,
    pub quality: EncodingQuality,
}

impl Default for PhotoSettings {
    fn default() -> Self {
        Self {
            format: EncodingFormat::Jpeg,
            quality: EncodingQuality::High,
        }
    }
}

/// Encoded still as returned by the hardware, before it has been verified
#[derive(Debug, Clone)]
pub struct RawPhoto {
    pub data: Vec<u8>,
    pub format: EncodingFormat,
}

/// Sending half of a hardware capture completion
pub type CaptureCompletion = futures::channel::oneshot::Sender<BackendResult<RawPhoto>>;

/// Receiving half of a hardware capture completion
///
/// Resolves once the hardware worker has finished the shot. Resolves to
/// `Canceled` if the worker dropped the completion without reporting.
pub type PendingCapture = futures::channel::oneshot::Receiver<BackendResult<RawPhoto>>;

/// Create a linked completion pair for one hardware capture
pub fn capture_channel() -> (CaptureCompletion, PendingCapture) {
    futures::channel::oneshot::channel()
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Backend is not available on this system
    #[error("Backend not available: {0}")]
    NotAvailable(String),
    /// Camera device not found
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    /// Device is held by another client
    #[error("Device is busy")]
    DeviceBusy,
    /// Camera access was refused
    #[error("Camera permission denied")]
    PermissionDenied,
    /// Operation needs a bound device
    #[error("No device bound")]
    NotBound,
    /// Format not supported by the bound device
    #[error("Format not supported: {0}")]
    FormatNotSupported(String),
    /// The shot itself failed
    #[error("Capture failed: {0}")]
    CaptureFailed(String),
    #[error("Error: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_display() {
        let device = CameraDevice::new("cam0", "Rear", CameraPosition::Back, DeviceKind::WideAngle);
        assert_eq!(device.to_string(), "Rear (back wide-angle, cam0)");
    }

    #[test]
    fn test_default_capabilities_support_jpeg_only() {
        let device = CameraDevice::new("cam0", "Rear", CameraPosition::Back, DeviceKind::WideAngle);
        assert!(device.supports(EncodingFormat::Jpeg));
        assert!(!device.supports(EncodingFormat::Png));
    }
}
