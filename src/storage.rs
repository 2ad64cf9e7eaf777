// SPDX-License-Identifier: GPL-3.0-only

//! Local storage for captured photos

use crate::constants;
use crate::errors::StorageError;
use crate::pipelines::photo::capture::Photo;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Saves photo payloads into a directory
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save `photo` under a file name derived from `display_name`
    ///
    /// The file is named `<name>_<timestamp>_<id>.<ext>`, where `<id>` is the
    /// start of the request id, so two saves in the same second never collide.
    pub async fn save(&self, photo: &Photo, display_name: &str) -> Result<PathBuf, StorageError> {
        if photo.data.is_empty() {
            return Err(StorageError::EmptyPayload);
        }

        let timestamp = photo.captured_at.format("%Y%m%d_%H%M%S");
        let short_id = &photo.request_id.simple().to_string()[..8];
        let filename = format!(
            "{}_{}_{}.{}",
            sanitize_file_stem(display_name),
            timestamp,
            short_id,
            photo.format.extension()
        );
        let filepath = self.dir.join(filename);

        info!(path = %filepath.display(), "Saving photo");

        // Write to disk in background task (I/O-bound)
        let dir = self.dir.clone();
        let data = photo.data.clone();
        let target = filepath.clone();
        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&dir)?;
            std::fs::write(&target, &data)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))??;

        debug!(path = %filepath.display(), size = photo.data.len(), "Photo saved");
        Ok(filepath)
    }

    /// Most recently modified photo in the store, if any
    pub async fn latest(&self) -> Option<PathBuf> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || {
            std::fs::read_dir(&dir)
                .ok()?
                .flatten()
                .filter(|entry| {
                    entry.path().extension().is_some_and(|ext| {
                        let ext = ext.to_string_lossy();
                        ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("png")
                    })
                })
                .filter_map(|entry| {
                    let modified = entry.metadata().ok()?.modified().ok()?;
                    Some((modified, entry.path()))
                })
                .max_by_key(|(modified, _)| *modified)
                .map(|(_, path)| path)
        })
        .await
        .ok()
        .flatten()
    }
}

/// Turn a free-form display name into a safe file stem
fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .take(constants::MAX_FILE_STEM_LEN)
        .collect();

    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "photo".to_string()
    } else {
        stem.to_string()
    }
}
