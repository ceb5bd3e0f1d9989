//! Astro-Physics command builders.
//!
//! Every function here is pure: it returns a framed [`Command`] and performs
//! no I/O. The [`mount`](crate::mount) module hands the commands to a
//! [`CommandChannel`](lx200_protocol::CommandChannel).
//!
//! # Framing
//!
//! Most commands use the `#:VERB PARAMS#` form. Park and unpark are bare
//! (`#:KA`, `#:PO`). The RA/Dec custom track-rate commands and the pulse
//! guide commands use plain Meade framing, because that is what the GTOCP
//! firmware accepts for them.
//!
//! Selector enums map to one wire string each through an exhaustive
//! `match`; raw selector indices (as used by observatory front-ends) convert
//! through `TryFrom<u8>` and fail with [`Error::OutOfRange`].

use std::fmt;

use lx200_core::{Error, GuideDirection, PulseGuide, Result};
use lx200_protocol::codec;
use lx200_protocol::{Command, Expect};

// ---------------------------------------------------------------
// Selector enums
// ---------------------------------------------------------------

macro_rules! selector_try_from {
    ($name:ident, $what:literal, [$($index:literal => $variant:ident),+ $(,)?]) => {
        impl TryFrom<u8> for $name {
            type Error = Error;

            fn try_from(index: u8) -> Result<Self> {
                match index {
                    $($index => Ok($name::$variant),)+
                    other => Err(Error::OutOfRange(format!(
                        concat!("unknown ", $what, " selector {}"),
                        other
                    ))),
                }
            }
        }
    };
}

/// Sidereal-drive mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackingMode {
    Sidereal,
    Solar,
    Lunar,
    /// Custom rates are set with the RA/Dec track-rate commands; selecting
    /// this mode sends nothing.
    Custom,
    Off,
}

selector_try_from!(TrackingMode, "tracking mode", [
    0 => Sidereal,
    1 => Solar,
    2 => Lunar,
    3 => Custom,
    4 => Off,
]);

/// Rate used by the move-to (button) commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveToRate {
    X12,
    X64,
    X600,
    X1200,
}

selector_try_from!(MoveToRate, "move-to rate", [
    0 => X12,
    1 => X64,
    2 => X600,
    3 => X1200,
]);

/// Goto slew rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlewRate {
    X600,
    X900,
    X1200,
}

selector_try_from!(SlewRate, "slew rate", [
    0 => X600,
    1 => X900,
    2 => X1200,
]);

/// Guide rate as a fraction of sidereal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuideRate {
    Quarter,
    Half,
    Full,
}

selector_try_from!(GuideRate, "guide rate", [
    0 => Quarter,
    1 => Half,
    2 => Full,
]);

/// Centering rate. `Guide` switches the buttons to the guide rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CenterRate {
    Guide,
    X12,
    X64,
    X600,
    X1200,
}

selector_try_from!(CenterRate, "center rate", [
    0 => Guide,
    1 => X12,
    2 => X64,
    3 => X600,
    4 => X1200,
]);

/// Periodic error correction playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PecState {
    Off,
    On,
}

selector_try_from!(PecState, "PEC state", [
    0 => Off,
    1 => On,
]);

/// Hand-controller button pair to reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonSwap {
    NorthSouth,
    EastWest,
}

selector_try_from!(ButtonSwap, "button swap", [
    0 => NorthSouth,
    1 => EastWest,
]);

impl fmt::Display for TrackingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrackingMode::Sidereal => "sidereal",
            TrackingMode::Solar => "solar",
            TrackingMode::Lunar => "lunar",
            TrackingMode::Custom => "custom",
            TrackingMode::Off => "off",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------
// Query commands
// ---------------------------------------------------------------

/// Read the UTC offset (`#:GG#`). The reply uses the negative-offset quirk.
pub fn cmd_get_utc_offset() -> Command {
    Command::astro_physics("GG", "", Expect::Terminated)
}

/// Read the 13/14 character status block (`#:GOS#`).
pub fn cmd_get_status() -> Command {
    Command::astro_physics("GOS", "", Expect::Terminated)
}

/// Read the current right ascension (`#:GR#`).
pub fn cmd_get_ra() -> Command {
    Command::astro_physics("GR", "", Expect::Terminated)
}

/// Read the hour angle (`#:GH#`).
pub fn cmd_get_hour_angle() -> Command {
    Command::astro_physics("GH", "", Expect::Terminated)
}

// ---------------------------------------------------------------
// Target and site
// ---------------------------------------------------------------

/// `#:Sr HH:MM:SS#`
pub fn cmd_set_target_ra(hours: f64) -> Command {
    Command::astro_physics("Sr", &codec::encode_ra(hours), Expect::Ack)
}

/// `#:Sd sDD*MM:SS#`
pub fn cmd_set_target_dec(degrees: f64) -> Command {
    Command::astro_physics("Sd", &codec::encode_dec(degrees), Expect::Ack)
}

/// `#:Sz DDD*MM:SS#`
pub fn cmd_set_target_az(degrees: f64) -> Command {
    Command::astro_physics("Sz", &codec::encode_az(degrees), Expect::Ack)
}

/// `#:Sa sDD*MM:SS#`
pub fn cmd_set_target_alt(degrees: f64) -> Command {
    Command::astro_physics("Sa", &codec::encode_alt(degrees), Expect::Ack)
}

/// `#:Sg DDD*MM:SS#`
pub fn cmd_set_site_longitude(degrees: f64) -> Command {
    Command::astro_physics("Sg", &codec::encode_longitude(degrees), Expect::Ack)
}

/// `#:St sDD*MM:SS#`
pub fn cmd_set_site_latitude(degrees: f64) -> Command {
    Command::astro_physics("St", &codec::encode_latitude(degrees), Expect::Ack)
}

/// `#:SG sHH:MM:SS#`
///
/// Older firmware only accepted positive offsets; the sign is always sent.
pub fn cmd_set_utc_offset(hours: f64) -> Command {
    Command::astro_physics("SG", &codec::encode_utc_offset(hours), Expect::Ack)
}

// ---------------------------------------------------------------
// Sync
// ---------------------------------------------------------------

/// Sync on the current target (`#:CM#`). Replies with a description.
pub fn cmd_sync() -> Command {
    Command::astro_physics("CM", "", Expect::Terminated)
}

/// Recalibrate on the current target (`#:CMR#`).
pub fn cmd_sync_recalibrate() -> Command {
    Command::astro_physics("CMR", "", Expect::Terminated)
}

// ---------------------------------------------------------------
// Rate and mode selection (all blind)
// ---------------------------------------------------------------

/// `#:p#` or `#:pP#`
pub fn cmd_set_pec_state(state: PecState) -> Command {
    let verb = match state {
        PecState::Off => "p",
        PecState::On => "pP",
    };
    Command::astro_physics(verb, "", Expect::Nothing)
}

/// `#:RC0#` .. `#:RC3#`
pub fn cmd_set_move_to_rate(rate: MoveToRate) -> Command {
    let verb = match rate {
        MoveToRate::X12 => "RC0",
        MoveToRate::X64 => "RC1",
        MoveToRate::X600 => "RC2",
        MoveToRate::X1200 => "RC3",
    };
    Command::astro_physics(verb, "", Expect::Nothing)
}

/// `#:RS0#` .. `#:RS2#`
pub fn cmd_set_slew_rate(rate: SlewRate) -> Command {
    let verb = match rate {
        SlewRate::X600 => "RS0",
        SlewRate::X900 => "RS1",
        SlewRate::X1200 => "RS2",
    };
    Command::astro_physics(verb, "", Expect::Nothing)
}

/// Select the sidereal-drive mode.
///
/// Returns `None` for [`TrackingMode::Custom`]: the controller has no
/// command for it, the custom RA/Dec rates select it implicitly.
pub fn cmd_set_tracking_mode(mode: TrackingMode) -> Option<Command> {
    let verb = match mode {
        TrackingMode::Sidereal => "RT2",
        TrackingMode::Solar => "RT1",
        TrackingMode::Lunar => "RT0",
        TrackingMode::Off => "RT9",
        TrackingMode::Custom => return None,
    };
    Some(Command::astro_physics(verb, "", Expect::Nothing))
}

/// `#:RG0#` .. `#:RG2#`
pub fn cmd_set_guide_rate(rate: GuideRate) -> Command {
    let verb = match rate {
        GuideRate::Quarter => "RG0",
        GuideRate::Half => "RG1",
        GuideRate::Full => "RG2",
    };
    Command::astro_physics(verb, "", Expect::Nothing)
}

/// `#:RG#` switches the buttons to guide rate; the others share the
/// move-to rate commands.
pub fn cmd_set_center_rate(rate: CenterRate) -> Command {
    let verb = match rate {
        CenterRate::Guide => "RG",
        CenterRate::X12 => "RC0",
        CenterRate::X64 => "RC1",
        CenterRate::X600 => "RC2",
        CenterRate::X1200 => "RC3",
    };
    Command::astro_physics(verb, "", Expect::Nothing)
}

/// `#:NS#` or `#:EW#`
pub fn cmd_swap_buttons(swap: ButtonSwap) -> Command {
    let verb = match swap {
        ButtonSwap::NorthSouth => "NS",
        ButtonSwap::EastWest => "EW",
    };
    Command::astro_physics(verb, "", Expect::Nothing)
}

/// Custom RA tracking rate (`:RRs<rate>#`), in arcseconds per second
/// relative to sidereal.
///
/// The controller answers with one byte whose value carries no meaning.
pub fn cmd_set_ra_track_rate(rate: f64) -> Command {
    Command::meade(
        "RR",
        &codec::encode_signed_rate(rate, codec::RATE_PRECISION),
        Expect::Ack,
    )
}

/// Custom Dec tracking rate (`:RDs<rate>#`).
pub fn cmd_set_dec_track_rate(rate: f64) -> Command {
    Command::meade(
        "RD",
        &codec::encode_signed_rate(rate, codec::RATE_PRECISION),
        Expect::Ack,
    )
}

// ---------------------------------------------------------------
// Motion
// ---------------------------------------------------------------

/// Timed guide pulse (`:Mn050#`). The caller clamps the duration.
pub fn cmd_pulse_guide(pulse: PulseGuide) -> Command {
    let verb = match pulse.direction {
        GuideDirection::North => "Mn",
        GuideDirection::South => "Ms",
        GuideDirection::East => "Me",
        GuideDirection::West => "Mw",
    };
    Command::meade(verb, &format!("{:03}", pulse.duration_ms), Expect::Nothing)
}

/// Park (`#:KA`, unterminated).
pub fn cmd_park() -> Command {
    Command::astro_physics_bare("KA")
}

/// Unpark (`#:PO`, unterminated).
pub fn cmd_unpark() -> Command {
    Command::astro_physics_bare("PO")
}

/// Stop all slews (`#:Q#`).
pub fn cmd_abort() -> Command {
    Command::astro_physics("Q", "", Expect::Nothing)
}

// ---------------------------------------------------------------
// Response parsers
// ---------------------------------------------------------------

/// Interpret a `#:GR#` reply: a zero RA in either precision means the
/// controller has not been initialized since power-up.
pub fn parse_initialized(ra_response: &str) -> bool {
    !matches!(ra_response, "00:00.0" | "00:00:00.0")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(cmd: Command) -> String {
        cmd.to_string()
    }

    // ---------------------------------------------------------------
    // Target and site
    // ---------------------------------------------------------------

    #[test]
    fn target_commands() {
        assert_eq!(wire(cmd_set_target_ra(12.5)), "#:Sr 12:30:00#");
        assert_eq!(wire(cmd_set_target_ra(-0.5)), "#:Sr 23:30:00#");
        assert_eq!(wire(cmd_set_target_dec(-12.25)), "#:Sd -12*15:00#");
        assert_eq!(wire(cmd_set_target_az(370.0)), "#:Sz 010*00:00#");
        assert_eq!(wire(cmd_set_target_alt(45.5)), "#:Sa +45*30:00#");
    }

    #[test]
    fn site_and_time_commands() {
        assert_eq!(wire(cmd_set_site_longitude(-71.5)), "#:Sg 288*30:00#");
        assert_eq!(wire(cmd_set_site_latitude(42.25)), "#:St +42*15:00#");
        assert_eq!(wire(cmd_set_utc_offset(-5.0)), "#:SG -05:00:00#");
        assert_eq!(wire(cmd_set_utc_offset(5.5)), "#:SG +05:30:00#");
    }

    #[test]
    fn set_commands_expect_ack() {
        for cmd in [
            cmd_set_target_ra(1.0),
            cmd_set_target_dec(1.0),
            cmd_set_target_az(1.0),
            cmd_set_target_alt(1.0),
            cmd_set_site_longitude(1.0),
            cmd_set_site_latitude(1.0),
            cmd_set_utc_offset(1.0),
        ] {
            assert_eq!(cmd.expect(), Expect::Ack, "{cmd}");
        }
    }

    #[test]
    fn query_commands() {
        assert_eq!(wire(cmd_get_utc_offset()), "#:GG#");
        assert_eq!(wire(cmd_get_status()), "#:GOS#");
        assert_eq!(wire(cmd_get_ra()), "#:GR#");
        assert_eq!(wire(cmd_get_hour_angle()), "#:GH#");
        assert_eq!(wire(cmd_sync()), "#:CM#");
        assert_eq!(wire(cmd_sync_recalibrate()), "#:CMR#");
        assert_eq!(cmd_sync().expect(), Expect::Terminated);
    }

    // ---------------------------------------------------------------
    // Selectors
    // ---------------------------------------------------------------

    #[test]
    fn tracking_modes() {
        let cases = [
            (TrackingMode::Sidereal, Some("#:RT2#")),
            (TrackingMode::Solar, Some("#:RT1#")),
            (TrackingMode::Lunar, Some("#:RT0#")),
            (TrackingMode::Off, Some("#:RT9#")),
            (TrackingMode::Custom, None),
        ];
        for (mode, expected) in cases {
            let cmd = cmd_set_tracking_mode(mode);
            assert_eq!(cmd.map(wire).as_deref(), expected, "{mode}");
        }
    }

    #[test]
    fn rate_selectors() {
        assert_eq!(wire(cmd_set_move_to_rate(MoveToRate::X12)), "#:RC0#");
        assert_eq!(wire(cmd_set_move_to_rate(MoveToRate::X1200)), "#:RC3#");
        assert_eq!(wire(cmd_set_slew_rate(SlewRate::X900)), "#:RS1#");
        assert_eq!(wire(cmd_set_guide_rate(GuideRate::Quarter)), "#:RG0#");
        assert_eq!(wire(cmd_set_guide_rate(GuideRate::Full)), "#:RG2#");
        assert_eq!(wire(cmd_set_center_rate(CenterRate::Guide)), "#:RG#");
        assert_eq!(wire(cmd_set_center_rate(CenterRate::X600)), "#:RC2#");
        assert_eq!(wire(cmd_set_pec_state(PecState::Off)), "#:p#");
        assert_eq!(wire(cmd_set_pec_state(PecState::On)), "#:pP#");
        assert_eq!(wire(cmd_swap_buttons(ButtonSwap::NorthSouth)), "#:NS#");
        assert_eq!(wire(cmd_swap_buttons(ButtonSwap::EastWest)), "#:EW#");
        assert!(cmd_set_slew_rate(SlewRate::X600).is_blind());
    }

    #[test]
    fn selector_indices() {
        assert_eq!(TrackingMode::try_from(4).unwrap(), TrackingMode::Off);
        assert_eq!(CenterRate::try_from(0).unwrap(), CenterRate::Guide);
        assert_eq!(SlewRate::try_from(2).unwrap(), SlewRate::X1200);
        assert!(matches!(SlewRate::try_from(3), Err(Error::OutOfRange(_))));
        assert!(matches!(MoveToRate::try_from(4), Err(Error::OutOfRange(_))));
        assert!(matches!(GuideRate::try_from(9), Err(Error::OutOfRange(_))));
        assert!(matches!(TrackingMode::try_from(5), Err(Error::OutOfRange(_))));
        assert!(matches!(PecState::try_from(2), Err(Error::OutOfRange(_))));
        assert!(ButtonSwap::try_from(2).is_err());
    }

    // ---------------------------------------------------------------
    // Meade-framed commands
    // ---------------------------------------------------------------

    #[test]
    fn track_rates_use_meade_framing() {
        assert_eq!(wire(cmd_set_ra_track_rate(0.5)), ":RR+0.5000#");
        assert_eq!(wire(cmd_set_dec_track_rate(-1.25)), ":RD-1.2500#");
        assert_eq!(cmd_set_ra_track_rate(0.0).expect(), Expect::Ack);
    }

    #[test]
    fn pulse_guide_commands() {
        let pulse = |direction, ms| cmd_pulse_guide(PulseGuide::new(direction, ms));
        assert_eq!(wire(pulse(GuideDirection::North, 50)), ":Mn050#");
        assert_eq!(wire(pulse(GuideDirection::South, 999)), ":Ms999#");
        assert_eq!(wire(pulse(GuideDirection::East, 5)), ":Me005#");
        assert_eq!(wire(pulse(GuideDirection::West, 120)), ":Mw120#");
        assert!(pulse(GuideDirection::North, 1).is_blind());
    }

    #[test]
    fn park_commands_are_unterminated() {
        assert_eq!(cmd_park().encode(), b"#:KA");
        assert_eq!(cmd_unpark().encode(), b"#:PO");
        assert_eq!(wire(cmd_abort()), "#:Q#");
        assert!(cmd_park().is_blind() && cmd_abort().is_blind());
    }

    #[test]
    fn initialized_detection() {
        assert!(!parse_initialized("00:00.0"));
        assert!(!parse_initialized("00:00:00.0"));
        assert!(parse_initialized("00:00:01.0"));
        assert!(parse_initialized("12:34.5"));
    }
}
