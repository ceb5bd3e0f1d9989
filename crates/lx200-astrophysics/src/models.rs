//! Astro-Physics controller definitions.
//!
//! Models are factory functions returning a populated [`ApModel`]:
//!
//! | Model          | Firmware | Baud | Max pulse |
//! |----------------|----------|------|-----------|
//! | GTOCP3         | pre-P02  | 9600 | 999 ms    |
//! | GTOCP4         | pre-P02  | 9600 | 999 ms    |
//! | GTOCP4 (P02)   | P02      | 9600 | 999 ms    |
//!
//! The pulse-guide command carries three digits, which caps a single pulse
//! at 999 ms on every generation.

use lx200_core::{MountDefinition, Vendor};

use crate::status::FirmwareGeneration;

/// Longest pulse the three-digit `:Mn###` field can express.
pub const MAX_PULSE_MS: u32 = 999;

/// Static definition of an Astro-Physics GTO controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApModel {
    /// Human-readable name (e.g. "GTOCP4").
    pub name: &'static str,
    /// Status-block and command table revision.
    pub firmware: FirmwareGeneration,
    /// Factory serial speed.
    pub default_baud_rate: u32,
    /// Pulse-guide duration cap in milliseconds.
    pub max_pulse_ms: u32,
}

impl From<&ApModel> for MountDefinition {
    fn from(model: &ApModel) -> Self {
        MountDefinition {
            vendor: Vendor::AstroPhysics,
            model_name: model.name,
            default_baud_rate: model.default_baud_rate,
            has_focuser: false,
        }
    }
}

/// GTOCP3 controller (Rev "T" and later).
pub fn gtocp3() -> ApModel {
    ApModel {
        name: "GTOCP3",
        firmware: FirmwareGeneration::PreP02,
        default_baud_rate: 9600,
        max_pulse_ms: MAX_PULSE_MS,
    }
}

/// GTOCP4 controller with VCP4-P01 firmware.
pub fn gtocp4() -> ApModel {
    ApModel {
        name: "GTOCP4",
        firmware: FirmwareGeneration::PreP02,
        default_baud_rate: 9600,
        max_pulse_ms: MAX_PULSE_MS,
    }
}

/// GTOCP4 controller with VCP4-P02-01 or later firmware.
pub fn gtocp4_p02() -> ApModel {
    ApModel {
        name: "GTOCP4 (P02)",
        firmware: FirmwareGeneration::P02,
        default_baud_rate: 9600,
        max_pulse_ms: MAX_PULSE_MS,
    }
}

/// Every supported controller.
pub fn all_models() -> Vec<ApModel> {
    vec![gtocp3(), gtocp4(), gtocp4_p02()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_p02_model_uses_new_tables() {
        assert_eq!(gtocp3().firmware, FirmwareGeneration::PreP02);
        assert_eq!(gtocp4().firmware, FirmwareGeneration::PreP02);
        assert_eq!(gtocp4_p02().firmware, FirmwareGeneration::P02);
    }

    #[test]
    fn all_models_share_serial_and_pulse_limits() {
        let models = all_models();
        assert_eq!(models.len(), 3);
        for model in models {
            assert_eq!(model.default_baud_rate, 9600, "{}", model.name);
            assert_eq!(model.max_pulse_ms, 999, "{}", model.name);
        }
    }
}
