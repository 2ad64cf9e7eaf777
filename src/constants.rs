// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Grace period before a hidden camera view stops the session (milliseconds)
///
/// Long enough to flip to the saved-photos page and back without paying
/// for a session restart.
pub const DEFAULT_GRACE_PERIOD_MS: u64 = 2_000;

/// How long a capture may wait for the hardware before it is failed (milliseconds)
pub const DEFAULT_CAPTURE_TIMEOUT_MS: u64 = 10_000;

/// Title shown for a photo the classifier could not label
pub const FALLBACK_FOOD_LABEL: &str = "Food Name";

/// Subdirectory of the pictures directory photos are saved into
pub const PHOTOS_SUBDIR: &str = "foodcam";

/// Application directory name under the config directory
pub const APP_DIR: &str = "foodcam";

/// Configuration file name
pub const CONFIG_FILE: &str = "config.json";

/// Longest display-name stem kept in a saved file name
pub const MAX_FILE_STEM_LEN: usize = 48;
