// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! ```text
//! ┌──────────────────────┐
//! │ Presentation Adapter │
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐     ┌──────────────────┐
//! │  SessionController   │ ──▶ │  DeviceSelector  │
//! └──────────┬───────────┘     └──────────────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │ CameraBackend Trait  │  ← Hardware seam
//! └──────────┬───────────┘
//!            │
//!            ▼
//!     ┌─────────────┐
//!     │  Synthetic  │  ← In-process implementation
//!     └─────────────┘
//! ```

pub mod frame_loop;
pub mod selector;
pub mod session;
pub mod synthetic;
pub mod types;

pub use selector::DeviceSelector;
pub use session::{SessionController, SessionState};
pub use synthetic::{SyntheticBackend, SyntheticConfig};
pub use types::*;

/// Hardware capture session
///
/// Implementations own the physical device handle and run capture and
/// frame production on their own worker context. Every method here is
/// called with the session controller's backend lock held, so none of
/// them may block on a capture completing.
pub trait CameraBackend: Send {
    // ===== Enumeration =====

    /// Enumerate every capture device currently visible to the backend
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    // ===== Lifecycle =====

    /// Open `device` and attach `output` to the session
    ///
    /// # Returns
    /// * `Ok(())` - Device bound, session ready to start
    /// * `Err(BackendError::DeviceBusy)` / `Err(BackendError::PermissionDenied)` - Binding refused
    fn bind(&mut self, device: &CameraDevice, output: &PhotoOutput) -> BackendResult<()>;

    /// Release the bound device
    fn unbind(&mut self);

    /// Begin producing frames
    fn start_running(&mut self) -> BackendResult<()>;

    /// Stop producing frames
    ///
    /// Captures already issued must still complete.
    fn stop_running(&mut self);

    /// Check if frames are currently being produced
    fn is_running(&self) -> bool;

    // ===== Capture =====

    /// Issue a single still capture
    ///
    /// Returns immediately; the hardware fills the returned completion
    /// from its worker context once the shot is done.
    fn capture_photo(&self, settings: &PhotoSettings) -> BackendResult<PendingCapture>;
}
