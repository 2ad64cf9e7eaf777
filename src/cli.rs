// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for capture operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking, labeling and saving photos
//! - Exercising the grace-period lifecycle

use foodcam::backends::camera::types::{CameraPosition, DeviceKind, PhotoOutput, PhotoSettings};
use foodcam::backends::camera::{DeviceSelector, SessionController, SyntheticBackend, SyntheticConfig};
use foodcam::config::Config;
use foodcam::lifecycle::{LifecycleTimer, VisibilityEvent};
use foodcam::pipelines::photo::{CaptureCoordinator, FixedLabelClassifier, PhotoPipeline};
use foodcam::storage::PhotoStore;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Load the user configuration, falling back to defaults on error
pub fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Ignoring unreadable configuration");
        Config::default()
    })
}

fn backend() -> Box<SyntheticBackend> {
    Box::new(SyntheticBackend::new(SyntheticConfig::default()))
}

/// List all available cameras
pub fn list_cameras(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let session = SessionController::new(backend());
    let cameras = session.enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    let selected = DeviceSelector::default().select(&cameras).ok();
    let selected_id = selected.as_ref().map(|s| s.id.as_str());
    let last_used_id = config.last_camera_id.as_deref();

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!(
            "  [{}] {}{}",
            index,
            camera.name,
            camera_markers(&camera.id, selected_id, last_used_id)
        );
        println!(
            "      {} {}, up to {}x{}, formats: {:?}",
            camera.position,
            camera.kind,
            camera.capabilities.max_width,
            camera.capabilities.max_height,
            camera.capabilities.formats
        );
        println!();
    }

    Ok(())
}

/// Suffix shown after a camera name in the listing
fn camera_markers(id: &str, selected: Option<&str>, last_used: Option<&str>) -> String {
    let mut markers = Vec::new();
    if selected == Some(id) {
        markers.push("selected");
    }
    if last_used == Some(id) {
        markers.push("last used");
    }

    if markers.is_empty() {
        String::new()
    } else {
        format!(" ({})", markers.join(", "))
    }
}

/// Take a photo, label it and save it
pub fn take_photo(
    mut config: Config,
    front: bool,
    name: Option<String>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let selector = if front {
        DeviceSelector::with_preference(
            DeviceKind::WideAngle,
            vec![CameraPosition::Front, CameraPosition::Back],
        )
    } else {
        DeviceSelector::default()
    };
    let output_dir = output.unwrap_or_else(|| config.photos_dir());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let session = SessionController::with_selector(
            backend(),
            selector,
            PhotoOutput {
                format: config.photo_format,
            },
        );
        session.configure()?;
        session.start()?;

        if let Some(device) = session.active_device() {
            println!("Using camera: {}", device.name);
            config.last_camera_id = Some(device.id);
        }

        let coordinator = CaptureCoordinator::with_settings(
            session.clone(),
            PhotoSettings {
                format: config.photo_format,
                quality: config.photo_quality,
            },
            config.capture_timeout(),
        );

        println!("Capturing...");
        let photo = coordinator.capture().await;
        session.stop();
        let photo = photo?;
        println!("Captured {}x{} ({} bytes)", photo.width, photo.height, photo.data.len());

        let pipeline = PhotoPipeline::new(
            Box::new(FixedLabelClassifier::unlabeled()),
            PhotoStore::new(output_dir),
        );
        let saved = pipeline.process(&photo, name.as_deref()).await?;
        println!("Photo saved: {} ({})", saved.path.display(), saved.label);

        Ok::<_, Box<dyn std::error::Error>>(())
    })?;

    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save configuration");
    }
    Ok(())
}

/// Hide the camera view, optionally background the app, then report the session state
pub fn run_lifecycle(
    config: Config,
    hidden_ms: u64,
    background_ms: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let session = SessionController::new(backend());
        session.configure()?;

        let timer = LifecycleTimer::new(session.clone(), config.grace_period());
        timer.handle(VisibilityEvent::ViewWillAppear)?;
        println!("Grace period: {:?}", timer.grace_period());
        println!("Session: {}", session.state());

        timer.handle(VisibilityEvent::ViewWillDisappear)?;
        println!("View hidden, session: {}", session.state());

        match background_ms {
            Some(background_ms) => {
                let half = Duration::from_millis(hidden_ms / 2);
                tokio::time::sleep(half).await;
                timer.handle(VisibilityEvent::AppWillBackground)?;
                println!("App backgrounded, {:?} left", timer.remaining().unwrap_or_default());
                tokio::time::sleep(Duration::from_millis(background_ms)).await;
                timer.handle(VisibilityEvent::AppWillForeground)?;
                println!("App foregrounded, session: {}", session.state());
                tokio::time::sleep(Duration::from_millis(hidden_ms) - half).await;
            }
            None => tokio::time::sleep(Duration::from_millis(hidden_ms)).await,
        }

        println!("After {} ms hidden, session: {}", hidden_ms, session.state());
        timer.handle(VisibilityEvent::ViewWillAppear)?;
        println!("View shown, session: {}", session.state());

        session.unconfigure();
        Ok::<_, Box<dyn std::error::Error>>(())
    })
}
