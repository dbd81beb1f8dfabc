//! Snapshot-based device catalog and capability resolution.
//!
//! The device manager itself lives outside this crate; it hands over a flat
//! list of [`DeviceInfo`] and the catalog classifies what an insert can bind
//! to. Resolution is a pure lookup so it stays testable without any live
//! audio subsystem.

use tracing::debug;

/// What kind of signal a resolved device carries. Computed at enumeration
/// time and carried as plain data so the render path never inspects device
/// objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DeviceCapability {
    #[default]
    None = 0,
    Audio = 1,
    Midi = 2,
}

impl DeviceCapability {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Audio,
            2 => Self::Midi,
            _ => Self::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceDirection {
    Input,
    Output,
}

/// One device as reported by the device manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub alias: String,
    pub enabled: bool,
    pub is_midi: bool,
    /// Only meaningful for MIDI outputs: a device driving an external
    /// hardware controller cannot also be a send target.
    pub routed_to_external_controller: bool,
}

impl DeviceInfo {
    pub fn audio(name: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: name.to_string(),
            enabled: true,
            is_midi: false,
            routed_to_external_controller: false,
        }
    }

    pub fn midi(name: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: name.to_string(),
            enabled: true,
            is_midi: true,
            routed_to_external_controller: false,
        }
    }
}

/// An enabled device with its classification, positional within the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub name: String,
    pub alias: String,
    pub capability: DeviceCapability,
}

/// Ordered snapshot of the devices an insert may bind to in one direction.
///
/// Rebuilt on every enumeration; order is whatever the device manager
/// reported, so positions are stable only for a fixed device-manager state.
#[derive(Debug, Clone, Default)]
pub struct DeviceCatalog {
    devices: Vec<DeviceDescriptor>,
}

impl DeviceCatalog {
    pub fn enumerate(direction: DeviceDirection, infos: &[DeviceInfo]) -> Self {
        let mut devices = vec![];
        for info in infos {
            if !info.enabled {
                continue;
            }
            let capability = if info.is_midi {
                if direction == DeviceDirection::Output && info.routed_to_external_controller {
                    continue;
                }
                DeviceCapability::Midi
            } else {
                DeviceCapability::Audio
            };
            devices.push(DeviceDescriptor {
                name: info.name.clone(),
                alias: info.alias.clone(),
                capability,
            });
        }
        Self { devices }
    }

    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    pub fn names(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.name.clone()).collect()
    }

    /// Maps a configured device name to its capability. An absent, empty or
    /// stale name resolves to `None`; that is a valid terminal state, not an
    /// error.
    pub fn resolve(&self, name: &str) -> DeviceCapability {
        let capability = self
            .devices
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.capability)
            .unwrap_or(DeviceCapability::None);
        debug!("resolved device '{name}' to {capability:?}");
        capability
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_set() -> Vec<DeviceInfo> {
        vec![
            DeviceInfo::audio("Analog 1+2"),
            DeviceInfo {
                enabled: false,
                ..DeviceInfo::audio("Analog 3+4")
            },
            DeviceInfo::midi("MIDI A"),
            DeviceInfo {
                routed_to_external_controller: true,
                ..DeviceInfo::midi("Control Surface")
            },
        ]
    }

    #[test]
    fn disabled_devices_do_not_occupy_a_slot() {
        let catalog = DeviceCatalog::enumerate(DeviceDirection::Input, &device_set());
        assert_eq!(
            catalog.names(),
            vec!["Analog 1+2", "MIDI A", "Control Surface"]
        );
    }

    #[test]
    fn controller_routed_midi_output_is_excluded() {
        let catalog = DeviceCatalog::enumerate(DeviceDirection::Output, &device_set());
        assert_eq!(catalog.names(), vec!["Analog 1+2", "MIDI A"]);
        assert_eq!(
            catalog.resolve("Control Surface"),
            DeviceCapability::None
        );
    }

    #[test]
    fn resolve_returns_positional_capability() {
        let catalog = DeviceCatalog::enumerate(DeviceDirection::Input, &device_set());
        assert_eq!(catalog.resolve("Analog 1+2"), DeviceCapability::Audio);
        assert_eq!(catalog.resolve("MIDI A"), DeviceCapability::Midi);
        assert_eq!(catalog.devices()[1].capability, DeviceCapability::Midi);
    }

    #[test]
    fn unknown_or_empty_name_resolves_to_none() {
        let catalog = DeviceCatalog::enumerate(DeviceDirection::Input, &device_set());
        assert_eq!(catalog.resolve(""), DeviceCapability::None);
        assert_eq!(catalog.resolve("Analog 3+4"), DeviceCapability::None);
        assert_eq!(catalog.resolve("gone"), DeviceCapability::None);
    }

    #[test]
    fn capability_round_trips_through_u8() {
        for capability in [
            DeviceCapability::None,
            DeviceCapability::Audio,
            DeviceCapability::Midi,
        ] {
            assert_eq!(DeviceCapability::from_u8(capability.as_u8()), capability);
        }
    }
}
