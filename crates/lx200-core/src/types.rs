//! Core types used throughout lx200.
//!
//! These types are shared by every dialect backend. Anything that has a
//! fixed wire representation lives in the dialect crate that owns the
//! representation, not here.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Manufacturer or firmware family of a mount controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    /// Astro-Physics GTOCP3 / GTOCP4 controllers.
    AstroPhysics,
    /// OpenAstroTech firmware (Meade command relay with focuser extensions).
    OpenAstroTech,
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vendor::AstroPhysics => write!(f, "Astro-Physics"),
            Vendor::OpenAstroTech => write!(f, "OpenAstroTech"),
        }
    }
}

/// Static information about a connected mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInfo {
    pub vendor: Vendor,
    /// Human-readable model name (e.g. "GTOCP4").
    pub model_name: String,
    /// Device name used to tag log output for this mount.
    pub device_name: String,
}

/// A supported controller model, for listing in a UI picker without
/// pulling in dialect-specific types.
///
/// Obtained via `lx200::supported_mounts()` or by converting a backend
/// model type with its `From` implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountDefinition {
    pub vendor: Vendor,
    pub model_name: &'static str,
    pub default_baud_rate: u32,
    /// Whether the controller relays a focuser.
    pub has_focuser: bool,
}

/// Direction of a guide pulse or manual axis motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuideDirection {
    North,
    South,
    East,
    West,
}

impl fmt::Display for GuideDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuideDirection::North => write!(f, "N"),
            GuideDirection::South => write!(f, "S"),
            GuideDirection::East => write!(f, "E"),
            GuideDirection::West => write!(f, "W"),
        }
    }
}

impl FromStr for GuideDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "N" | "NORTH" => Ok(GuideDirection::North),
            "S" | "SOUTH" => Ok(GuideDirection::South),
            "E" | "EAST" => Ok(GuideDirection::East),
            "W" | "WEST" => Ok(GuideDirection::West),
            _ => Err(Error::InvalidParameter(format!(
                "unknown guide direction: {s}"
            ))),
        }
    }
}

/// A timed guide pulse.
///
/// The duration is capped at the controller's maximum pulse length when
/// the pulse is prepared for transmission; over-long requests are never
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseGuide {
    pub direction: GuideDirection,
    pub duration_ms: u32,
}

impl PulseGuide {
    pub fn new(direction: GuideDirection, duration_ms: u32) -> Self {
        PulseGuide {
            direction,
            duration_ms,
        }
    }

    /// Return the same pulse with its duration capped at `max_ms`.
    pub fn clamped(self, max_ms: u32) -> Self {
        PulseGuide {
            duration_ms: self.duration_ms.min(max_ms),
            ..self
        }
    }
}

/// Direction of focuser travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusDirection {
    /// Toward the telescope (negative step counts on the wire).
    Inward,
    /// Away from the telescope.
    Outward,
}

impl fmt::Display for FocusDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FocusDirection::Inward => write!(f, "inward"),
            FocusDirection::Outward => write!(f, "outward"),
        }
    }
}

impl FromStr for FocusDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "in" | "inward" => Ok(FocusDirection::Inward),
            "out" | "outward" => Ok(FocusDirection::Outward),
            _ => Err(Error::InvalidParameter(format!(
                "unknown focus direction: {s}"
            ))),
        }
    }
}

/// A focuser move request in device ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocuserMove {
    /// Move to an absolute position.
    Absolute(u32),
    /// Move by a number of ticks in one direction.
    Relative {
        direction: FocusDirection,
        ticks: u32,
    },
}

impl FocuserMove {
    /// Signed step count as seen by the controller (inward is negative).
    pub fn signed_delta(direction: FocusDirection, ticks: u32) -> i64 {
        match direction {
            FocusDirection::Inward => -i64::from(ticks),
            FocusDirection::Outward => i64::from(ticks),
        }
    }
}

/// Outcome of a motion request that completes asynchronously on the mount.
///
/// Completion is observed by polling; a successful request only means the
/// command went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveStatus {
    /// The command was sent; the device is moving.
    Busy,
    /// The request was rejected before any I/O (for example a focuser
    /// target outside the configured travel).
    Alert,
}

impl fmt::Display for MoveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveStatus::Busy => write!(f, "busy"),
            MoveStatus::Alert => write!(f, "alert"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_clamps_to_maximum() {
        let pulse = PulseGuide::new(GuideDirection::North, 5000).clamped(999);
        assert_eq!(pulse.duration_ms, 999);
        assert_eq!(pulse.direction, GuideDirection::North);
    }

    #[test]
    fn pulse_below_maximum_untouched() {
        let pulse = PulseGuide::new(GuideDirection::West, 250).clamped(999);
        assert_eq!(pulse.duration_ms, 250);
    }

    #[test]
    fn guide_direction_parse() {
        assert_eq!("n".parse::<GuideDirection>().unwrap(), GuideDirection::North);
        assert_eq!("West".parse::<GuideDirection>().unwrap(), GuideDirection::West);
        assert!("up".parse::<GuideDirection>().is_err());
    }

    #[test]
    fn focus_direction_parse() {
        assert_eq!("in".parse::<FocusDirection>().unwrap(), FocusDirection::Inward);
        assert_eq!(
            "OUTWARD".parse::<FocusDirection>().unwrap(),
            FocusDirection::Outward
        );
        assert!("sideways".parse::<FocusDirection>().is_err());
    }

    #[test]
    fn signed_delta_inward_is_negative() {
        assert_eq!(FocuserMove::signed_delta(FocusDirection::Inward, 150), -150);
        assert_eq!(FocuserMove::signed_delta(FocusDirection::Outward, 150), 150);
    }

    #[test]
    fn vendor_display() {
        assert_eq!(Vendor::AstroPhysics.to_string(), "Astro-Physics");
        assert_eq!(Vendor::OpenAstroTech.to_string(), "OpenAstroTech");
    }
}
