// SPDX-License-Identifier: GPL-3.0-only

//! In-process simulated camera hardware
//!
//! Behaves like a real capture session from the controller's point of view:
//! preview frames are produced on a worker thread while running, and every
//! still capture completes later on its own worker thread. Stills are a
//! rendered test pattern, encoded with the `image` crate.
//!
//! Failure injection through [`SyntheticFaults`] covers the error paths a
//! physical device can hit (busy device, denied permission, failed shot,
//! corrupt payload).

use super::CameraBackend;
use super::frame_loop::{FrameLoopController, LoopAction};
use super::types::*;
use crate::pipelines::photo::encoding;
use image::{Rgb, RgbImage};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Static description of the simulated hardware
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Devices reported by enumeration, in order
    pub devices: Vec<CameraDevice>,
    /// Time between issuing a capture and its completion
    pub capture_latency: Duration,
    /// Interval between preview frames
    pub frame_interval: Duration,
    /// Size of the rendered still
    pub still_size: (u32, u32),
    /// Initial bind failure, changeable later through [`SyntheticFaults`]
    pub bind_error: Option<BackendError>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            devices: vec![
                CameraDevice::new(
                    "synthetic:back",
                    "Synthetic Rear Camera",
                    CameraPosition::Back,
                    DeviceKind::WideAngle,
                ),
                CameraDevice::new(
                    "synthetic:front",
                    "Synthetic Front Camera",
                    CameraPosition::Front,
                    DeviceKind::WideAngle,
                ),
            ],
            capture_latency: Duration::from_millis(50),
            frame_interval: Duration::from_millis(33),
            still_size: (320, 240),
            bind_error: None,
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    bind_error: Option<BackendError>,
    capture_error: Option<BackendError>,
    corrupt_payload: bool,
    drop_completion: bool,
}

/// Handle for changing injected failures while the backend is owned by a controller
#[derive(Debug, Clone, Default)]
pub struct SyntheticFaults {
    inner: Arc<Mutex<Faults>>,
}

impl SyntheticFaults {
    /// Make the next `bind()` calls fail with `error`
    pub fn set_bind_error(&self, error: Option<BackendError>) {
        self.lock().bind_error = error;
    }

    /// Make subsequent captures complete with `error`
    pub fn set_capture_error(&self, error: Option<BackendError>) {
        self.lock().capture_error = error;
    }

    /// Make subsequent captures return bytes that do not decode
    pub fn set_corrupt_payload(&self, corrupt: bool) {
        self.lock().corrupt_payload = corrupt;
    }

    /// Make subsequent captures drop their completion without reporting
    pub fn set_drop_completion(&self, drop: bool) {
        self.lock().drop_completion = drop;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Faults> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Simulated camera backend
pub struct SyntheticBackend {
    config: SyntheticConfig,
    faults: SyntheticFaults,
    bound: Option<(CameraDevice, PhotoOutput)>,
    preview: Option<FrameLoopController>,
    frames: Arc<AtomicU64>,
    shots: AtomicU64,
}

impl SyntheticBackend {
    pub fn new(config: SyntheticConfig) -> Self {
        let faults = SyntheticFaults::default();
        faults.set_bind_error(config.bind_error.clone());

        Self {
            config,
            faults,
            bound: None,
            preview: None,
            frames: Arc::new(AtomicU64::new(0)),
            shots: AtomicU64::new(0),
        }
    }

    /// Failure injection handle
    pub fn faults(&self) -> SyntheticFaults {
        self.faults.clone()
    }

    /// Shared counter of preview frames produced so far
    pub fn frame_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.frames)
    }

    /// Render the test pattern for shot number `shot`
    ///
    /// A diagonal gradient tinted per shot, so consecutive stills differ.
    fn render_still(width: u32, height: u32, shot: u64) -> RgbImage {
        let tint = (shot.wrapping_mul(47) % 256) as u8;
        RgbImage::from_fn(width, height, |x, y| {
            let r = ((x * 255) / width.max(1)) as u8;
            let g = ((y * 255) / height.max(1)) as u8;
            Rgb([r, g, tint])
        })
    }
}

impl CameraBackend for SyntheticBackend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.config.devices.clone()
    }

    fn bind(&mut self, device: &CameraDevice, output: &PhotoOutput) -> BackendResult<()> {
        if let Some(error) = self.faults.lock().bind_error.clone() {
            return Err(error);
        }

        if !self.config.devices.iter().any(|d| d.id == device.id) {
            return Err(BackendError::DeviceNotFound(device.id.clone()));
        }

        if !device.supports(output.format) {
            return Err(BackendError::FormatNotSupported(format!(
                "{} cannot produce {:?}",
                device.name, output.format
            )));
        }

        info!(device = %device, "Synthetic device bound");
        self.bound = Some((device.clone(), *output));
        Ok(())
    }

    fn unbind(&mut self) {
        self.stop_running();
        if let Some((device, _)) = self.bound.take() {
            info!(device = %device.id, "Synthetic device released");
        }
    }

    fn start_running(&mut self) -> BackendResult<()> {
        if self.bound.is_none() {
            return Err(BackendError::NotBound);
        }
        if self.preview.is_some() {
            return Ok(());
        }

        let frames = Arc::clone(&self.frames);
        let interval = self.config.frame_interval;
        let preview = FrameLoopController::start("synthetic-preview", move || {
            thread::sleep(interval);
            frames.fetch_add(1, Ordering::Relaxed);
            LoopAction::Continue
        })
        .map_err(|e| BackendError::Other(format!("failed to spawn preview worker: {}", e)))?;
        self.preview = Some(preview);
        Ok(())
    }

    fn stop_running(&mut self) {
        if let Some(preview) = self.preview.take() {
            preview.stop();
        }
    }

    fn is_running(&self) -> bool {
        self.preview.is_some()
    }

    fn capture_photo(&self, settings: &PhotoSettings) -> BackendResult<PendingCapture> {
        if self.bound.is_none() {
            return Err(BackendError::NotBound);
        }
        if self.preview.is_none() {
            return Err(BackendError::CaptureFailed("session not running".into()));
        }

        let shot = self.shots.fetch_add(1, Ordering::SeqCst);
        let (completion, pending) = capture_channel();
        let settings = *settings;
        let latency = self.config.capture_latency;
        let (width, height) = self.config.still_size;
        let faults = self.faults.clone();

        debug!(shot, format = ?settings.format, "Synthetic capture issued");

        thread::Builder::new()
            .name(format!("synthetic-shot-{}", shot))
            .spawn(move || {
                thread::sleep(latency);

                let (capture_error, corrupt, drop_completion) = {
                    let f = faults.lock();
                    (f.capture_error.clone(), f.corrupt_payload, f.drop_completion)
                };

                if drop_completion {
                    warn!(shot, "Synthetic capture dropped without completion");
                    drop(completion);
                    return;
                }

                let result = match capture_error {
                    Some(error) => Err(error),
                    None if corrupt => Ok(RawPhoto {
                        data: b"\0corrupt sensor readout".to_vec(),
                        format: settings.format,
                    }),
                    None => {
                        let still = Self::render_still(width, height, shot);
                        encoding::encode(&still, settings.format, settings.quality)
                            .map(|data| RawPhoto {
                                data,
                                format: settings.format,
                            })
                            .map_err(BackendError::CaptureFailed)
                    }
                };

                if completion.send(result).is_err() {
                    debug!(shot, "Capture completed after requester went away");
                }
            })
            .map_err(|e| BackendError::Other(format!("failed to spawn capture worker: {}", e)))?;

        Ok(pending)
    }
}
