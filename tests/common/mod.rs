// SPDX-License-Identifier: GPL-3.0-only

//! Scripted camera backend for integration tests
//!
//! Captures never complete on their own: the test decides when and how
//! each issued capture finishes, in any order.

#![allow(dead_code)]

use foodcam::backends::camera::CameraBackend;
use foodcam::backends::camera::types::*;
use foodcam::pipelines::photo::encoding::{self, EncodingFormat, EncodingQuality};
use image::{Rgb, RgbImage};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Script {
    bind_error: Option<BackendError>,
    capture_error: Option<BackendError>,
    running: bool,
    bound: Option<String>,
    start_calls: usize,
    stop_calls: usize,
    pending: Vec<Option<CaptureCompletion>>,
}

/// Test-side control over a [`ScriptedBackend`]
#[derive(Clone, Default)]
pub struct ScriptHandle {
    script: Arc<Mutex<Script>>,
}

impl ScriptHandle {
    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub fn set_bind_error(&self, error: Option<BackendError>) {
        self.lock().bind_error = error;
    }

    /// Make the next `capture_photo` calls fail synchronously
    pub fn set_capture_error(&self, error: Option<BackendError>) {
        self.lock().capture_error = error;
    }

    /// Captures issued to the hardware so far
    pub fn issued(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn start_calls(&self) -> usize {
        self.lock().start_calls
    }

    pub fn stop_calls(&self) -> usize {
        self.lock().stop_calls
    }

    pub fn hardware_running(&self) -> bool {
        self.lock().running
    }

    pub fn bound_device(&self) -> Option<String> {
        self.lock().bound.clone()
    }

    /// Finish capture `index` with `result`
    pub fn complete(&self, index: usize, result: BackendResult<RawPhoto>) {
        let completion = self.lock().pending[index]
            .take()
            .expect("capture already completed");
        let _ = completion.send(result);
    }

    /// Finish capture `index` with a valid JPEG of the given size
    pub fn complete_with_jpeg(&self, index: usize, width: u32, height: u32) {
        self.complete(
            index,
            Ok(RawPhoto {
                data: jpeg(width, height),
                format: EncodingFormat::Jpeg,
            }),
        );
    }

    /// Drop capture `index` without reporting anything
    pub fn abandon(&self, index: usize) {
        drop(self.lock().pending[index].take());
    }
}

pub struct ScriptedBackend {
    devices: Vec<CameraDevice>,
    handle: ScriptHandle,
}

impl ScriptedBackend {
    pub fn new(devices: Vec<CameraDevice>) -> (Self, ScriptHandle) {
        let handle = ScriptHandle::default();
        (
            Self {
                devices,
                handle: handle.clone(),
            },
            handle,
        )
    }
}

impl CameraBackend for ScriptedBackend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.devices.clone()
    }

    fn bind(&mut self, device: &CameraDevice, _output: &PhotoOutput) -> BackendResult<()> {
        let mut script = self.handle.lock();
        if let Some(error) = script.bind_error.clone() {
            return Err(error);
        }
        script.bound = Some(device.id.clone());
        Ok(())
    }

    fn unbind(&mut self) {
        let mut script = self.handle.lock();
        script.running = false;
        script.bound = None;
    }

    fn start_running(&mut self) -> BackendResult<()> {
        let mut script = self.handle.lock();
        script.start_calls += 1;
        script.running = true;
        Ok(())
    }

    fn stop_running(&mut self) {
        let mut script = self.handle.lock();
        script.stop_calls += 1;
        script.running = false;
    }

    fn is_running(&self) -> bool {
        self.handle.lock().running
    }

    fn capture_photo(&self, _settings: &PhotoSettings) -> BackendResult<PendingCapture> {
        let mut script = self.handle.lock();
        if let Some(error) = script.capture_error.clone() {
            return Err(error);
        }
        let (completion, pending) = capture_channel();
        script.pending.push(Some(completion));
        Ok(pending)
    }
}

pub fn rear() -> CameraDevice {
    CameraDevice::new("rear", "Rear Camera", CameraPosition::Back, DeviceKind::WideAngle)
}

pub fn front() -> CameraDevice {
    CameraDevice::new("front", "Front Camera", CameraPosition::Front, DeviceKind::WideAngle)
}

/// A small but complete JPEG
pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    encoding::encode(&img, EncodingFormat::Jpeg, EncodingQuality::Medium).unwrap()
}
