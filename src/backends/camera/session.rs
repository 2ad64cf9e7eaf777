// SPDX-License-Identifier: GPL-3.0-only

//! Capture session lifecycle controller
//!
//! The controller provides:
//! - The session state machine (configure, start, stop, grace stop)
//! - Serialized transitions: one in flight at a time, later ones queue
//! - Thread-safe access to the hardware backend for capture issuing
//!
//! ```text
//! Unconfigured ──configure()──▶ Configuring ──ok──▶ Stopped
//!       ▲                            │
//!       └────────────failure─────────┘
//!
//! Stopped ──start()──▶ Running ──stop()──▶ Stopped
//! Running ──schedule_grace_stop()──▶ StoppingGrace
//! StoppingGrace ──cancel_grace_stop()──▶ Running
//! StoppingGrace ──stop() (grace expired)──▶ Stopped
//! ```

use super::CameraBackend;
use super::selector::DeviceSelector;
use super::types::{CameraDevice, PendingCapture, PhotoOutput, PhotoSettings};
use crate::errors::{CameraError, CaptureError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Capture session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No device bound yet (initial state, and after a failed configure)
    Unconfigured,
    /// Device binding in progress
    Configuring,
    /// Frames flowing, captures accepted
    Running,
    /// Frames still flowing, a deferred stop is pending
    StoppingGrace,
    /// Device bound, hardware idle
    Stopped,
}

impl SessionState {
    /// Whether the hardware is producing frames and accepting captures
    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Running | SessionState::StoppingGrace)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Unconfigured => write!(f, "unconfigured"),
            SessionState::Configuring => write!(f, "configuring"),
            SessionState::Running => write!(f, "running"),
            SessionState::StoppingGrace => write!(f, "stopping (grace)"),
            SessionState::Stopped => write!(f, "stopped"),
        }
    }
}

/// State guarded by the short-lived session lock
struct SessionCore {
    state: SessionState,
    device: Option<CameraDevice>,
}

struct Inner {
    /// Held for the whole of a transition
    transition: Mutex<()>,
    /// Held briefly; never acquired while `backend` is held
    core: Mutex<SessionCore>,
    backend: Mutex<Box<dyn CameraBackend>>,
    selector: DeviceSelector,
    output: PhotoOutput,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Capture session controller
///
/// Owns the one capture session for its lifetime. Cloning yields another
/// handle to the same session; only this type mutates session state.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    /// Create a controller over `backend` using the default device policy
    pub fn new(backend: Box<dyn CameraBackend>) -> Self {
        Self::with_selector(backend, DeviceSelector::default(), PhotoOutput::default())
    }

    /// Create a controller with an explicit device policy and photo output
    pub fn with_selector(
        backend: Box<dyn CameraBackend>,
        selector: DeviceSelector,
        output: PhotoOutput,
    ) -> Self {
        info!(format = ?output.format, "Creating capture session controller");

        Self {
            inner: Arc::new(Inner {
                transition: Mutex::new(()),
                core: Mutex::new(SessionCore {
                    state: SessionState::Unconfigured,
                    device: None,
                }),
                backend: Mutex::new(backend),
                selector,
                output,
            }),
        }
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        lock(&self.inner.core).state
    }

    /// Whether captures are currently accepted
    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    /// The device bound by the last successful `configure()`
    pub fn active_device(&self) -> Option<CameraDevice> {
        lock(&self.inner.core).device.clone()
    }

    /// Enumerate devices without touching the session
    pub fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        lock(&self.inner.backend).enumerate_cameras()
    }

    /// Select a device and bind the photo output to the session
    ///
    /// Idempotent: once configured, further calls return `Ok(())` without
    /// touching the hardware.
    ///
    /// # Returns
    /// * `Ok(())` - Session is `Stopped` (or already further along)
    /// * `Err(CameraError::NoDeviceAvailable)` - Nothing to bind, session stays `Unconfigured`
    /// * `Err(CameraError::ConfigurationFailed)` - Binding refused, session stays `Unconfigured`
    pub fn configure(&self) -> Result<(), CameraError> {
        let _transition = lock(&self.inner.transition);

        {
            let mut core = lock(&self.inner.core);
            if core.state != SessionState::Unconfigured {
                debug!(state = %core.state, "Session already configured");
                return Ok(());
            }
            Self::set_state(&mut core, SessionState::Configuring);
        }

        let bound = {
            let mut backend = lock(&self.inner.backend);
            let devices = backend.enumerate_cameras();
            self.inner.selector.select(&devices).and_then(|device| {
                backend
                    .bind(&device, &self.inner.output)
                    .map(|()| device)
                    .map_err(CameraError::from)
            })
        };

        let mut core = lock(&self.inner.core);
        match bound {
            Ok(device) => {
                info!(device = %device, "Capture session configured");
                core.device = Some(device);
                Self::set_state(&mut core, SessionState::Stopped);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Capture session configuration failed");
                Self::set_state(&mut core, SessionState::Unconfigured);
                Err(e)
            }
        }
    }

    /// Start producing frames
    ///
    /// Starting a running session is a no-op. Starting during a grace stop
    /// cancels the grace stop (the hardware never stopped).
    pub fn start(&self) -> Result<(), CameraError> {
        let _transition = lock(&self.inner.transition);
        let mut core = lock(&self.inner.core);

        match core.state {
            SessionState::Running => {
                debug!("Session already running");
                Ok(())
            }
            SessionState::StoppingGrace => {
                Self::set_state(&mut core, SessionState::Running);
                Ok(())
            }
            SessionState::Stopped => {
                lock(&self.inner.backend)
                    .start_running()
                    .map_err(|e| CameraError::StartFailed(e.to_string()))?;
                Self::set_state(&mut core, SessionState::Running);
                Ok(())
            }
            SessionState::Unconfigured | SessionState::Configuring => {
                Err(CameraError::NotConfigured)
            }
        }
    }

    /// Stop producing frames
    ///
    /// Valid from `Running` and `StoppingGrace`; a no-op otherwise. Captures
    /// already issued still complete and deliver.
    pub fn stop(&self) {
        let _transition = lock(&self.inner.transition);
        let mut core = lock(&self.inner.core);

        if core.state.is_running() {
            lock(&self.inner.backend).stop_running();
            Self::set_state(&mut core, SessionState::Stopped);
        } else {
            debug!(state = %core.state, "Stop ignored");
        }
    }

    /// Mark a running session as pending a deferred stop
    ///
    /// Returns whether the transition happened.
    pub fn schedule_grace_stop(&self) -> bool {
        self.swap_state(SessionState::Running, SessionState::StoppingGrace)
    }

    /// Withdraw a pending deferred stop
    ///
    /// Returns whether the transition happened.
    pub fn cancel_grace_stop(&self) -> bool {
        self.swap_state(SessionState::StoppingGrace, SessionState::Running)
    }

    /// Stop the session and release the device
    pub fn unconfigure(&self) {
        let _transition = lock(&self.inner.transition);
        let mut core = lock(&self.inner.core);

        if core.state == SessionState::Unconfigured {
            return;
        }

        {
            let mut backend = lock(&self.inner.backend);
            if core.state.is_running() {
                backend.stop_running();
            }
            backend.unbind();
        }
        core.device = None;
        Self::set_state(&mut core, SessionState::Unconfigured);
    }

    /// Issue a hardware capture if the session is running
    ///
    /// The running check and the hardware call happen under the same lock,
    /// so a concurrent `stop()` lands either before (capture refused) or
    /// after (capture issued and allowed to complete).
    pub(crate) fn issue_capture(
        &self,
        settings: &PhotoSettings,
    ) -> Result<PendingCapture, CaptureError> {
        let core = lock(&self.inner.core);
        if !core.state.is_running() {
            return Err(CaptureError::SessionNotRunning);
        }

        let pending = lock(&self.inner.backend).capture_photo(settings)?;
        Ok(pending)
    }

    fn swap_state(&self, from: SessionState, to: SessionState) -> bool {
        let _transition = lock(&self.inner.transition);
        let mut core = lock(&self.inner.core);

        if core.state == from {
            Self::set_state(&mut core, to);
            true
        } else {
            debug!(state = %core.state, expected = %from, "Transition ignored");
            false
        }
    }

    fn set_state(core: &mut SessionCore, to: SessionState) {
        info!(from = %core.state, to = %to, "Session transition");
        core.state = to;
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = lock(&self.inner.core);
        f.debug_struct("SessionController")
            .field("state", &core.state)
            .field("device", &core.device.as_ref().map(|d| d.id.as_str()))
            .finish()
    }
}
