// SPDX-License-Identifier: GPL-3.0-only

//! Foodcam - capture core for a food-photo app
//!
//! This library owns the camera session, arbitrates start/stop against
//! view and app visibility, and turns shutter presses into exactly-once
//! delivered photos.
//!
//! # Architecture
//!
//! - [`backends`]: Device selection, session state machine, hardware seam
//! - [`pipelines`]: Single-shot capture coordination and post-capture handling
//! - [`lifecycle`]: Grace-period stop driven by visibility events
//! - [`config`]: User configuration handling
//! - [`storage`]: Local photo storage
//!
//! # Example
//!
//! ```no_run
//! use foodcam::backends::camera::{SessionController, SyntheticBackend, SyntheticConfig};
//! use foodcam::pipelines::photo::CaptureCoordinator;
//!
//! # async fn run() -> foodcam::errors::AppResult<()> {
//! let session = SessionController::new(Box::new(SyntheticBackend::new(SyntheticConfig::default())));
//! session.configure()?;
//! session.start()?;
//!
//! let coordinator = CaptureCoordinator::new(session.clone());
//! let photo = coordinator.capture().await?;
//! println!("{} bytes, {}x{}", photo.data.len(), photo.width, photo.height);
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod lifecycle;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use backends::camera::{DeviceSelector, SessionController, SessionState};
pub use config::Config;
pub use lifecycle::{LifecycleTimer, VisibilityEvent};
pub use pipelines::photo::{CaptureCoordinator, CaptureResult, Photo};
