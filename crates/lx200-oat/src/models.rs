//! OpenAstroTech model definitions.
//!
//! OpenAstroTech runs on several boards, but they all expose the same
//! Meade command relay, so a single model covers them.

use lx200_core::{MountDefinition, Vendor};

/// Static definition of an OpenAstroTech controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OatModel {
    /// Human-readable name.
    pub name: &'static str,
    /// Factory serial speed.
    pub default_baud_rate: u32,
    /// Pulse-guide duration cap (three-digit field).
    pub max_pulse_ms: u32,
    /// Default focuser travel `(min, max)` in ticks.
    pub focuser_limits: (u32, u32),
}

impl From<&OatModel> for MountDefinition {
    fn from(model: &OatModel) -> Self {
        MountDefinition {
            vendor: Vendor::OpenAstroTech,
            model_name: model.name,
            default_baud_rate: model.default_baud_rate,
            has_focuser: true,
        }
    }
}

/// OpenAstroTech tracker with its default focuser travel.
pub fn openastrotech() -> OatModel {
    OatModel {
        name: "LX200 OpenAstroTech",
        default_baud_rate: 19_200,
        max_pulse_ms: 999,
        focuser_limits: (0, 100_000),
    }
}
