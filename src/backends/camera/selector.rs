// SPDX-License-Identifier: GPL-3.0-only

//! Capture device selection policy

use super::types::{CameraDevice, CameraPosition, DeviceKind};
use crate::errors::CameraError;
use tracing::debug;

/// Picks the active device from an enumeration
///
/// Selection is pure: it only looks at the list it is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSelector {
    /// Only devices of this class are considered
    kind: DeviceKind,
    /// Positions in order of preference
    positions: Vec<CameraPosition>,
}

impl Default for DeviceSelector {
    /// Wide-angle only, rear camera first, front camera as fallback
    fn default() -> Self {
        Self {
            kind: DeviceKind::WideAngle,
            positions: vec![CameraPosition::Back, CameraPosition::Front],
        }
    }
}

impl DeviceSelector {
    /// Create a selector with a custom position preference
    pub fn with_preference(kind: DeviceKind, positions: Vec<CameraPosition>) -> Self {
        Self { kind, positions }
    }

    /// Select the device to bind
    ///
    /// Within one position the first enumerated device wins.
    ///
    /// # Returns
    /// * `Ok(CameraDevice)` - The preferred matching device
    /// * `Err(CameraError::NoDeviceAvailable)` - Nothing matched the policy
    pub fn select(&self, devices: &[CameraDevice]) -> Result<CameraDevice, CameraError> {
        let selected = self.positions.iter().find_map(|position| {
            devices
                .iter()
                .find(|d| d.kind == self.kind && d.position == *position)
        });

        match selected {
            Some(device) => {
                debug!(device = %device, candidates = devices.len(), "Selected capture device");
                Ok(device.clone())
            }
            None => {
                debug!(candidates = devices.len(), kind = %self.kind, "No matching capture device");
                Err(CameraError::NoDeviceAvailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str, position: CameraPosition, kind: DeviceKind) -> CameraDevice {
        CameraDevice::new(id, id, position, kind)
    }

    #[test]
    fn test_prefers_rear_device() {
        let devices = vec![
            device("front", CameraPosition::Front, DeviceKind::WideAngle),
            device("back", CameraPosition::Back, DeviceKind::WideAngle),
        ];
        let selected = DeviceSelector::default().select(&devices).unwrap();
        assert_eq!(selected.id, "back");
    }

    #[test]
    fn test_falls_back_to_front_device() {
        let devices = vec![device("front", CameraPosition::Front, DeviceKind::WideAngle)];
        let selected = DeviceSelector::default().select(&devices).unwrap();
        assert_eq!(selected.id, "front");
    }

    #[test]
    fn test_empty_enumeration_fails() {
        assert_eq!(
            DeviceSelector::default().select(&[]),
            Err(CameraError::NoDeviceAvailable)
        );
    }

    #[test]
    fn test_ignores_other_device_classes() {
        let devices = vec![
            device("tele", CameraPosition::Back, DeviceKind::Telephoto),
            device("depth", CameraPosition::Back, DeviceKind::Depth),
            device("usb", CameraPosition::External, DeviceKind::WideAngle),
        ];
        assert_eq!(
            DeviceSelector::default().select(&devices),
            Err(CameraError::NoDeviceAvailable)
        );
    }

    #[test]
    fn test_first_enumerated_wins_within_position() {
        let devices = vec![
            device("back-a", CameraPosition::Back, DeviceKind::WideAngle),
            device("back-b", CameraPosition::Back, DeviceKind::WideAngle),
        ];
        let selector = DeviceSelector::default();
        assert_eq!(selector.select(&devices).unwrap().id, "back-a");
        assert_eq!(selector.select(&devices).unwrap().id, "back-a");
    }

    #[test]
    fn test_custom_preference() {
        let devices = vec![
            device("back", CameraPosition::Back, DeviceKind::WideAngle),
            device("front", CameraPosition::Front, DeviceKind::WideAngle),
        ];
        let selector = DeviceSelector::with_preference(
            DeviceKind::WideAngle,
            vec![CameraPosition::Front, CameraPosition::Back],
        );
        assert_eq!(selector.select(&devices).unwrap().id, "front");
    }
}
