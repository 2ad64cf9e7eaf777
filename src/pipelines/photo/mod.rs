// SPDX-License-Identifier: GPL-3.0-only

//! Photo capture pipeline
//!
//! ```text
//! Shutter → Hardware capture → Verify payload → Result sink
//!                                                   ↓
//!                                    Classify → Save (PhotoPipeline)
//! ```
//!
//! # Pipeline Stages
//!
//! 1. **Capture**: [`capture::CaptureCoordinator`] issues the shot and delivers exactly once
//! 2. **Classify**: a [`Classifier`] names the dish, falling back to a fixed title
//! 3. **Save**: [`PhotoStore`] writes the payload under the chosen display name

pub mod capture;
pub mod classify;
pub mod encoding;

pub use capture::{CaptureCoordinator, CaptureResult, Photo, RequestId, ResultSink, Shutter};
pub use classify::{Classifier, FixedLabelClassifier};
pub use encoding::{EncodingFormat, EncodingQuality};

use crate::constants;
use crate::errors::StorageError;
use crate::storage::PhotoStore;
use std::path::PathBuf;
use tracing::info;

/// A photo that has been labeled and written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedPhoto {
    pub path: PathBuf,
    pub label: String,
}

/// Post-capture handling: classify then save
pub struct PhotoPipeline {
    classifier: Box<dyn Classifier>,
    store: PhotoStore,
}

impl PhotoPipeline {
    pub fn new(classifier: Box<dyn Classifier>, store: PhotoStore) -> Self {
        Self { classifier, store }
    }

    /// Label for `photo`, or the fallback title
    pub fn label(&self, photo: &Photo) -> String {
        self.classifier
            .classify(photo)
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| constants::FALLBACK_FOOD_LABEL.to_string())
    }

    /// Classify and save a captured photo
    ///
    /// # Arguments
    /// * `photo` - Delivered capture
    /// * `display_name` - Name chosen by the user; the classifier label is used when `None`
    pub async fn process(
        &self,
        photo: &Photo,
        display_name: Option<&str>,
    ) -> Result<SavedPhoto, StorageError> {
        let label = self.label(photo);
        let name = display_name.unwrap_or(&label);
        let path = self.store.save(photo, name).await?;

        info!(label = %label, path = %path.display(), "Photo processed");
        Ok(SavedPhoto { path, label })
    }

    pub fn store(&self) -> &PhotoStore {
        &self.store
    }
}
