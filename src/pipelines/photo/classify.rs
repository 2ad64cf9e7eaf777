// SPDX-License-Identifier: GPL-3.0-only

//! Food classification boundary
//!
//! Inference itself lives outside this crate. A classifier only sees the
//! opaque photo payload and answers with a label, or nothing.

use super::capture::Photo;

/// Labels a captured photo
pub trait Classifier: Send + Sync {
    /// Best label for `photo`, or `None` if nothing was recognized
    fn classify(&self, photo: &Photo) -> Option<String>;
}

/// Classifier that always answers with the same label
#[derive(Debug, Clone, Default)]
pub struct FixedLabelClassifier {
    label: Option<String>,
}

impl FixedLabelClassifier {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
        }
    }

    /// Classifier that never recognizes anything
    pub fn unlabeled() -> Self {
        Self { label: None }
    }
}

impl Classifier for FixedLabelClassifier {
    fn classify(&self, _photo: &Photo) -> Option<String> {
        self.label.clone()
    }
}

impl<F> Classifier for F
where
    F: Fn(&Photo) -> Option<String> + Send + Sync,
{
    fn classify(&self, photo: &Photo) -> Option<String> {
        self(photo)
    }
}
