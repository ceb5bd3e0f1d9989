//! Decoder for the `#:GOS#` status block.
//!
//! The controller answers `#:GOS#` with a fixed-position string, one
//! character per field:
//!
//! ```text
//! offset  0 1 2 3 4 5 6 7 8 9 10 11 12 13
//!         A B C D E F G H I J K  L  M  N
//! ```
//!
//! Rev "S" firmware sent the first 11 characters, GTOCP3 Rev "T" through
//! GTOCP4 P01 send 13, and P02 added a 14th. P02 also redefined the
//! center-rate (H) and mount-status (K) codes, so those accessors need the
//! [`FirmwareGeneration`] the caller supplied at parse time.
//!
//! Parking and slewing are the only facts every caller needs; everything
//! else is decoded on demand and reports [`Error::Protocol`] when the block
//! is too short or the character is not defined for the generation.

use lx200_core::{Error, Result};

use crate::commands::{GuideRate, SlewRate};

/// Shortest block that carries both the park (0) and slew (3) flags.
pub const MIN_STATUS_LEN: usize = 4;

const PARK: usize = 0;
const RA_TRACKING: usize = 1;
const DEC_TRACKING: usize = 2;
const SLEWING: usize = 3;
const RA_MOTION: usize = 4;
const DEC_MOTION: usize = 5;
const GUIDE_RATE: usize = 6;
const CENTER_RATE: usize = 7;
const SLEW_RATE: usize = 8;
const PEM: usize = 9;
const MOUNT_STATUS: usize = 10;
const EW_REVERSAL: usize = 11;
const NS_REVERSAL: usize = 12;
const BUTTON_TABLE: usize = 13;

/// Controller firmware revision family, as far as the status block cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FirmwareGeneration {
    /// GTOCP3 and GTOCP4 up to VCP4-P01.
    #[default]
    PreP02,
    /// VCP4-P02-01 and later.
    P02,
}

/// Field A.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParkState {
    Parked,
    Unparked,
    AutoPark,
}

/// Field B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaTracking {
    Lunar,
    Solar,
    Sidereal,
    Stopped,
    Custom,
}

/// Field C.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecTracking {
    NoMotion,
    Custom,
}

/// Field E.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaMotion {
    East,
    West,
    Stopped,
}

/// Field F. North is counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecMotion {
    North,
    South,
    Stopped,
}

/// Field H. The P02 table adds the intermediate and guide-speed rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRate {
    X12,
    X64,
    X200,
    X400To600,
    X600,
    X600To1200,
    X1200,
    GuideQuarter,
    GuideHalf,
    GuideFull,
}

/// A rate field that can also hold a custom value (`C`).
///
/// The custom value itself has to be read with a separate command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSetting<T> {
    Preset(T),
    Custom,
}

/// Field J.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PemState {
    Off,
    Playback,
    Recording,
    Encoder,
}

/// Field K.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountCondition {
    Normal,
    Stalled,
    LowPower,
    ServoFault,
    /// Pre-P02 code `8`.
    Reserved,
    /// Counter-clockwise internal declination limit (P02).
    DecLimitCcw,
    /// Clockwise internal declination limit (P02).
    DecLimitCw,
    /// East internal RA limit (P02).
    RaLimitEast,
    /// West internal RA limit (P02).
    RaLimitWest,
    /// The kill function has been issued (P02).
    Killed,
}

/// Field N (P02 only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonRateTable {
    Normal,
    Reduced75,
    Reduced50,
    Mach2HighSpeed,
}

/// An immutable view of one `#:GOS#` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    raw: String,
    generation: FirmwareGeneration,
}

impl StatusSnapshot {
    /// Wrap a raw status response.
    ///
    /// A trailing terminator is ignored. Fewer than [`MIN_STATUS_LEN`]
    /// characters is a protocol error.
    pub fn parse(raw: &str, generation: FirmwareGeneration) -> Result<Self> {
        let body = raw.trim_end_matches('#');
        if body.len() < MIN_STATUS_LEN {
            return Err(Error::Protocol(format!(
                "status block too short ({} chars): {raw:?}",
                body.len()
            )));
        }
        Ok(StatusSnapshot {
            raw: body.to_string(),
            generation,
        })
    }

    /// The status block as received, without terminator.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn generation(&self) -> FirmwareGeneration {
        self.generation
    }

    /// Number of fields present.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Always false: construction rejects short blocks.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The raw character at `offset`, if the block is long enough.
    pub fn field(&self, offset: usize) -> Option<char> {
        self.raw.as_bytes().get(offset).map(|&b| char::from(b))
    }

    pub fn is_parked(&self) -> bool {
        self.field(PARK) == Some('P')
    }

    pub fn is_slewing(&self) -> bool {
        self.field(SLEWING) != Some('0')
    }

    pub fn park_state(&self) -> Result<ParkState> {
        match self.code(PARK, "park state")? {
            'P' => Ok(ParkState::Parked),
            '0' => Ok(ParkState::Unparked),
            '1' => Ok(ParkState::AutoPark),
            c => Err(self.unknown("park state", c)),
        }
    }

    pub fn ra_tracking(&self) -> Result<RaTracking> {
        match self.code(RA_TRACKING, "RA tracking")? {
            '0' => Ok(RaTracking::Lunar),
            '1' => Ok(RaTracking::Solar),
            '2' => Ok(RaTracking::Sidereal),
            '9' => Ok(RaTracking::Stopped),
            'C' => Ok(RaTracking::Custom),
            c => Err(self.unknown("RA tracking", c)),
        }
    }

    pub fn dec_tracking(&self) -> Result<DecTracking> {
        match self.code(DEC_TRACKING, "Dec tracking")? {
            '9' => Ok(DecTracking::NoMotion),
            'C' => Ok(DecTracking::Custom),
            c => Err(self.unknown("Dec tracking", c)),
        }
    }

    pub fn ra_motion(&self) -> Result<RaMotion> {
        match self.code(RA_MOTION, "RA motion")? {
            'E' => Ok(RaMotion::East),
            'W' => Ok(RaMotion::West),
            '0' => Ok(RaMotion::Stopped),
            c => Err(self.unknown("RA motion", c)),
        }
    }

    pub fn dec_motion(&self) -> Result<DecMotion> {
        match self.code(DEC_MOTION, "Dec motion")? {
            'N' => Ok(DecMotion::North),
            'S' => Ok(DecMotion::South),
            '0' => Ok(DecMotion::Stopped),
            c => Err(self.unknown("Dec motion", c)),
        }
    }

    pub fn guide_rate(&self) -> Result<GuideRate> {
        match self.code(GUIDE_RATE, "guide rate")? {
            '0' => Ok(GuideRate::Quarter),
            '1' => Ok(GuideRate::Half),
            '2' => Ok(GuideRate::Full),
            c => Err(self.unknown("guide rate", c)),
        }
    }

    /// Center/move rate. The meaning of `2` and `3` changed with P02.
    pub fn center_rate(&self) -> Result<RateSetting<MoveRate>> {
        let c = self.code(CENTER_RATE, "center rate")?;
        if c == 'C' {
            return Ok(RateSetting::Custom);
        }
        let rate = match (self.generation, c) {
            (_, '0') => MoveRate::X12,
            (_, '1') => MoveRate::X64,
            (FirmwareGeneration::PreP02, '2') => MoveRate::X600,
            (FirmwareGeneration::PreP02, '3') => MoveRate::X1200,
            (FirmwareGeneration::P02, '2') => MoveRate::X200,
            (FirmwareGeneration::P02, '3') => MoveRate::X400To600,
            (FirmwareGeneration::P02, '4') => MoveRate::X600To1200,
            (FirmwareGeneration::P02, '5') => MoveRate::GuideQuarter,
            (FirmwareGeneration::P02, '6') => MoveRate::GuideHalf,
            (FirmwareGeneration::P02, '7') => MoveRate::GuideFull,
            _ => return Err(self.unknown("center rate", c)),
        };
        Ok(RateSetting::Preset(rate))
    }

    pub fn slew_rate(&self) -> Result<RateSetting<SlewRate>> {
        match self.code(SLEW_RATE, "slew rate")? {
            '0' => Ok(RateSetting::Preset(SlewRate::X600)),
            '1' => Ok(RateSetting::Preset(SlewRate::X900)),
            '2' => Ok(RateSetting::Preset(SlewRate::X1200)),
            'C' => Ok(RateSetting::Custom),
            c => Err(self.unknown("slew rate", c)),
        }
    }

    /// PEM state. Note the letter `O`, not the digit.
    pub fn pem_state(&self) -> Result<PemState> {
        match self.code(PEM, "PEM")? {
            'O' => Ok(PemState::Off),
            'P' => Ok(PemState::Playback),
            'R' => Ok(PemState::Recording),
            'E' => Ok(PemState::Encoder),
            c => Err(self.unknown("PEM", c)),
        }
    }

    pub fn mount_condition(&self) -> Result<MountCondition> {
        let c = self.code(MOUNT_STATUS, "mount status")?;
        let condition = match (self.generation, c) {
            (_, '0') => MountCondition::Normal,
            (FirmwareGeneration::PreP02, '1') => MountCondition::Stalled,
            (FirmwareGeneration::PreP02, '2') => MountCondition::LowPower,
            (FirmwareGeneration::PreP02, '4') => MountCondition::ServoFault,
            (FirmwareGeneration::PreP02, '8') => MountCondition::Reserved,
            (FirmwareGeneration::P02, 'Z') => MountCondition::Stalled,
            (FirmwareGeneration::P02, 'Y') => MountCondition::LowPower,
            (FirmwareGeneration::P02, 'X') => MountCondition::ServoFault,
            (FirmwareGeneration::P02, 'N') => MountCondition::DecLimitCcw,
            (FirmwareGeneration::P02, 'S') => MountCondition::DecLimitCw,
            (FirmwareGeneration::P02, 'E') => MountCondition::RaLimitEast,
            (FirmwareGeneration::P02, 'W') => MountCondition::RaLimitWest,
            (FirmwareGeneration::P02, 'z') => MountCondition::Killed,
            _ => return Err(self.unknown("mount status", c)),
        };
        Ok(condition)
    }

    /// Whether the E/W hand-controller buttons are reversed.
    pub fn ew_buttons_reversed(&self) -> Result<bool> {
        self.flag(EW_REVERSAL, "E-W button reversal")
    }

    /// Whether the N/S hand-controller buttons are reversed.
    pub fn ns_buttons_reversed(&self) -> Result<bool> {
        self.flag(NS_REVERSAL, "N-S button reversal")
    }

    /// Button / slew-rate table. Only P02 firmware reports it.
    pub fn button_rate_table(&self) -> Result<ButtonRateTable> {
        if self.generation != FirmwareGeneration::P02 {
            return Err(Error::Unsupported(
                "button rate table requires P02 firmware".into(),
            ));
        }
        match self.code(BUTTON_TABLE, "button rate table")? {
            '0' => Ok(ButtonRateTable::Normal),
            '1' => Ok(ButtonRateTable::Reduced75),
            '2' => Ok(ButtonRateTable::Reduced50),
            '3' => Ok(ButtonRateTable::Mach2HighSpeed),
            c => Err(self.unknown("button rate table", c)),
        }
    }

    fn code(&self, offset: usize, what: &str) -> Result<char> {
        self.field(offset).ok_or_else(|| {
            Error::Protocol(format!(
                "status block {:?} has no {what} field (offset {offset})",
                self.raw
            ))
        })
    }

    fn flag(&self, offset: usize, what: &str) -> Result<bool> {
        match self.code(offset, what)? {
            '0' => Ok(false),
            '1' => Ok(true),
            c => Err(self.unknown(what, c)),
        }
    }

    fn unknown(&self, what: &str, c: char) -> Error {
        Error::Protocol(format!(
            "unknown {what} code {c:?} for {:?} firmware in {:?}",
            self.generation, self.raw
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pre(raw: &str) -> StatusSnapshot {
        StatusSnapshot::parse(raw, FirmwareGeneration::PreP02).unwrap()
    }

    fn p02(raw: &str) -> StatusSnapshot {
        StatusSnapshot::parse(raw, FirmwareGeneration::P02).unwrap()
    }

    // ---------------------------------------------------------------
    // Park / slew
    // ---------------------------------------------------------------

    #[test]
    fn parked_block_with_slew_flag() {
        let status = pre("P00S0000002000");
        assert!(status.is_parked());
        // Offset 3 carries 'S', which the controller uses for "slewing".
        assert!(status.is_slewing());
        assert_eq!(status.len(), 14);
    }

    #[test]
    fn parked_and_idle() {
        let status = pre("P0000000002000#");
        assert!(status.is_parked());
        assert!(!status.is_slewing());
        assert_eq!(status.raw(), "P0000000002000");
    }

    #[test]
    fn unparked_slewing() {
        let status = pre("029SE02120O000");
        assert!(!status.is_parked());
        assert!(status.is_slewing());
        assert_eq!(status.park_state().unwrap(), ParkState::Unparked);
    }

    #[test]
    fn short_blocks_are_rejected() {
        for raw in ["", "#", "P", "P0", "P00", "P00#"] {
            assert!(
                matches!(
                    StatusSnapshot::parse(raw, FirmwareGeneration::PreP02),
                    Err(Error::Protocol(_))
                ),
                "{raw:?}"
            );
        }
        let minimal = pre("P000");
        assert!(minimal.is_parked() && !minimal.is_slewing());
    }

    #[test]
    fn missing_fields_are_protocol_errors() {
        let status = pre("1290");
        assert_eq!(status.park_state().unwrap(), ParkState::AutoPark);
        assert_eq!(status.ra_tracking().unwrap(), RaTracking::Sidereal);
        assert_eq!(status.dec_tracking().unwrap(), DecTracking::NoMotion);
        assert!(matches!(status.ra_motion(), Err(Error::Protocol(_))));
        assert!(matches!(status.ew_buttons_reversed(), Err(Error::Protocol(_))));
        assert_eq!(status.field(4), None);
    }

    // ---------------------------------------------------------------
    // Field tables
    // ---------------------------------------------------------------

    /// Idle, unparked, sidereal block with selected fields replaced.
    fn block(len: usize, fields: &[(usize, char)]) -> String {
        let mut chars: Vec<char> = "029000000O0000".chars().take(len).collect();
        for &(offset, c) in fields {
            chars[offset] = c;
        }
        chars.into_iter().collect()
    }

    #[test]
    fn full_pre_p02_block() {
        let status = pre("0CC0WN212R411");
        assert_eq!(status.ra_tracking().unwrap(), RaTracking::Custom);
        assert_eq!(status.dec_tracking().unwrap(), DecTracking::Custom);
        assert_eq!(status.ra_motion().unwrap(), RaMotion::West);
        assert_eq!(status.dec_motion().unwrap(), DecMotion::North);
        assert_eq!(status.guide_rate().unwrap(), GuideRate::Full);
        assert_eq!(
            status.center_rate().unwrap(),
            RateSetting::Preset(MoveRate::X64)
        );
        assert_eq!(
            status.slew_rate().unwrap(),
            RateSetting::Preset(SlewRate::X1200)
        );
        assert_eq!(status.pem_state().unwrap(), PemState::Recording);
        assert_eq!(status.mount_condition().unwrap(), MountCondition::ServoFault);
        assert!(status.ew_buttons_reversed().unwrap());
        assert!(status.ns_buttons_reversed().unwrap());
    }

    #[test]
    fn default_block_decodes() {
        let status = pre(&block(13, &[]));
        assert_eq!(status.ra_tracking().unwrap(), RaTracking::Sidereal);
        assert_eq!(status.ra_motion().unwrap(), RaMotion::Stopped);
        assert_eq!(status.dec_motion().unwrap(), DecMotion::Stopped);
        assert_eq!(status.guide_rate().unwrap(), GuideRate::Quarter);
        assert_eq!(status.mount_condition().unwrap(), MountCondition::Normal);
        assert!(!status.ew_buttons_reversed().unwrap());
    }

    #[test]
    fn center_rate_depends_on_generation() {
        let raw = block(14, &[(7, '2')]);
        assert_eq!(
            pre(&raw).center_rate().unwrap(),
            RateSetting::Preset(MoveRate::X600)
        );
        assert_eq!(
            p02(&raw).center_rate().unwrap(),
            RateSetting::Preset(MoveRate::X200)
        );

        let raw = block(14, &[(7, '5')]);
        assert!(matches!(pre(&raw).center_rate(), Err(Error::Protocol(_))));
        assert_eq!(
            p02(&raw).center_rate().unwrap(),
            RateSetting::Preset(MoveRate::GuideQuarter)
        );

        let raw = block(13, &[(7, 'C')]);
        assert_eq!(pre(&raw).center_rate().unwrap(), RateSetting::Custom);
    }

    #[test]
    fn mount_condition_depends_on_generation() {
        let pre_block = |k: char| pre(&block(13, &[(10, k)]));
        let p02_block = |k: char| p02(&block(14, &[(10, k)]));

        assert_eq!(pre_block('1').mount_condition().unwrap(), MountCondition::Stalled);
        assert_eq!(pre_block('8').mount_condition().unwrap(), MountCondition::Reserved);
        assert!(pre_block('Z').mount_condition().is_err());

        assert_eq!(p02_block('Z').mount_condition().unwrap(), MountCondition::Stalled);
        assert_eq!(p02_block('W').mount_condition().unwrap(), MountCondition::RaLimitWest);
        assert_eq!(p02_block('z').mount_condition().unwrap(), MountCondition::Killed);
        assert_eq!(p02_block('0').mount_condition().unwrap(), MountCondition::Normal);
        assert!(p02_block('1').mount_condition().is_err());
    }

    #[test]
    fn pem_uses_letter_o() {
        assert_eq!(pre(&block(13, &[])).pem_state().unwrap(), PemState::Off);
        assert!(pre(&block(13, &[(9, '0')])).pem_state().is_err());
    }

    #[test]
    fn button_table_is_p02_only() {
        let raw = block(14, &[(13, '3')]);
        assert_eq!(
            p02(&raw).button_rate_table().unwrap(),
            ButtonRateTable::Mach2HighSpeed
        );
        assert!(matches!(
            pre(&raw).button_rate_table(),
            Err(Error::Unsupported(_))
        ));
        // 13-character block from P02 firmware: field N is missing.
        assert!(matches!(
            p02(&block(13, &[])).button_rate_table(),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn unknown_codes_are_rejected() {
        let status = pre("X?7?QQ9X9Z9xx");
        assert!(status.park_state().is_err());
        assert!(status.ra_tracking().is_err());
        assert!(status.dec_tracking().is_err());
        assert!(status.ra_motion().is_err());
        assert!(status.dec_motion().is_err());
        assert!(status.guide_rate().is_err());
        assert!(status.center_rate().is_err());
        assert!(status.slew_rate().is_err());
        assert!(status.pem_state().is_err());
        assert!(status.mount_condition().is_err());
        assert!(status.ew_buttons_reversed().is_err());
        assert!(status.ns_buttons_reversed().is_err());
    }
}
