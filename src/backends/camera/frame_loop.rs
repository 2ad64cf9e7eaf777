// SPDX-License-Identifier: GPL-3.0-only

//! Thread lifecycle management for frame production loops
//!
//! Backends that produce preview frames on their own worker thread use
//! [`FrameLoopController`] to start, signal and join that thread.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Action returned by the loop callback to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Preview worker thread with cooperative shutdown
///
/// ```ignore
/// let preview = FrameLoopController::start("preview", move || {
///     produce_frame();
///     LoopAction::Continue
/// })?;
///
/// preview.stop();
/// ```
pub struct FrameLoopController {
    worker: Option<JoinHandle<()>>,
    halt: Arc<AtomicBool>,
    name: String,
}

impl FrameLoopController {
    /// Spawn a named worker calling `step` until it returns
    /// `LoopAction::Stop` or the controller is stopped
    pub fn start<F>(name: &str, mut step: F) -> io::Result<Self>
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        let halt = Arc::new(AtomicBool::new(false));
        let worker_halt = Arc::clone(&halt);

        let worker = thread::Builder::new().name(name.to_string()).spawn(move || {
            let mut frames: u64 = 0;
            while !worker_halt.load(Ordering::Acquire) {
                if step() == LoopAction::Stop {
                    break;
                }
                frames += 1;
            }
            debug!(frames, "Frame loop exiting");
        })?;

        info!(name, "Frame loop started");
        Ok(Self {
            worker: Some(worker),
            halt,
            name: name.to_string(),
        })
    }

    /// Whether the worker thread is still alive
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Signal the worker and join it
    pub fn stop(mut self) {
        self.join();
    }

    fn join(&mut self) {
        self.halt.store(true, Ordering::Release);

        let Some(worker) = self.worker.take() else {
            return;
        };
        match worker.join() {
            Ok(()) => info!(name = %self.name, "Frame loop stopped"),
            Err(_) => warn!(name = %self.name, "Frame loop worker panicked"),
        }
    }
}

impl Drop for FrameLoopController {
    fn drop(&mut self) {
        self.join();
    }
}
