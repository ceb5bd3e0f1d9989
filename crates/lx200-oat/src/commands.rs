//! OpenAstroTech command builders and response parsers.
//!
//! OpenAstroTech firmware speaks plain Meade framing (`:VERBPARAMS#`) and
//! relays the focuser through the `F` command family. All focuser motion
//! commands are blind; only the position probe `:Fp#` answers.
//!
//! All functions are pure.

use lx200_core::{Error, FocusDirection, FocuserMove, GuideDirection, PulseGuide, Result};
use lx200_protocol::codec;
use lx200_protocol::{Command, Expect};

// ---------------------------------------------------------------
// Target and site
// ---------------------------------------------------------------

/// `:SrHH:MM:SS#`
pub fn cmd_set_target_ra(hours: f64) -> Command {
    Command::meade("Sr", &codec::encode_ra(hours), Expect::Ack)
}

/// `:SdsDD*MM:SS#`
pub fn cmd_set_target_dec(degrees: f64) -> Command {
    Command::meade("Sd", &codec::encode_dec(degrees), Expect::Ack)
}

/// `:SzDDD*MM:SS#`
pub fn cmd_set_target_az(degrees: f64) -> Command {
    Command::meade("Sz", &codec::encode_az(degrees), Expect::Ack)
}

/// `:SasDD*MM:SS#`
pub fn cmd_set_target_alt(degrees: f64) -> Command {
    Command::meade("Sa", &codec::encode_alt(degrees), Expect::Ack)
}

/// `:SgDDD*MM:SS#`
pub fn cmd_set_site_longitude(degrees: f64) -> Command {
    Command::meade("Sg", &codec::encode_longitude(degrees), Expect::Ack)
}

/// `:StsDD*MM:SS#`
pub fn cmd_set_site_latitude(degrees: f64) -> Command {
    Command::meade("St", &codec::encode_latitude(degrees), Expect::Ack)
}

/// `:SGsHH:MM:SS#`
pub fn cmd_set_utc_offset(hours: f64) -> Command {
    Command::meade("SG", &codec::encode_utc_offset(hours), Expect::Ack)
}

/// `:GG#`. The reply is ordinary signed sexagesimal.
pub fn cmd_get_utc_offset() -> Command {
    Command::meade("GG", "", Expect::Terminated)
}

/// `:CM#`
pub fn cmd_sync() -> Command {
    Command::meade("CM", "", Expect::Terminated)
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

/// `:hP#`
pub fn cmd_park() -> Command {
    Command::meade("hP", "", Expect::Nothing)
}

/// `:hU#`
pub fn cmd_unpark() -> Command {
    Command::meade("hU", "", Expect::Nothing)
}

/// `:Q#`
pub fn cmd_abort() -> Command {
    Command::meade("Q", "", Expect::Nothing)
}

// ---------------------------------------------------------------
// Focuser
// ---------------------------------------------------------------

/// Absolute focuser target (`:FS000150#`), six zero-padded digits.
pub fn cmd_focuser_absolute(ticks: u32) -> Command {
    Command::meade("FS", &format!("{ticks:06}"), Expect::Nothing)
}

/// Relative focuser move (`:FM-150#`). Inward is negative.
pub fn cmd_focuser_relative(direction: FocusDirection, ticks: u32) -> Command {
    let delta = FocuserMove::signed_delta(direction, ticks);
    Command::meade("FM", &delta.to_string(), Expect::Nothing)
}

/// Timed focuser run (`:FM-250.000000#`). The firmware reads the duration
/// as a float with six decimals.
pub fn cmd_focuser_timed(direction: FocusDirection, duration_ms: u32) -> Command {
    let duration = f64::from(duration_ms);
    let signed = match direction {
        FocusDirection::Inward => -duration,
        FocusDirection::Outward => duration,
    };
    Command::meade("FM", &format!("{signed:.6}"), Expect::Nothing)
}

/// `:FQ#`
pub fn cmd_focuser_abort() -> Command {
    Command::meade("FQ", "", Expect::Nothing)
}

/// `:Fp#`, the only focuser command that answers.
pub fn cmd_focuser_position() -> Command {
    Command::meade("Fp", "", Expect::Terminated)
}

/// Parse the `:Fp#` reply (a signed integer).
pub fn parse_focuser_position(data: &str) -> Result<i64> {
    data.trim()
        .parse::<i64>()
        .map_err(|_| Error::Protocol(format!("invalid focuser position: {data:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(cmd: Command) -> String {
        cmd.to_string()
    }

    #[test]
    fn target_and_site_commands() {
        assert_eq!(wire(cmd_set_target_ra(12.5)), ":Sr12:30:00#");
        assert_eq!(wire(cmd_set_target_dec(-12.25)), ":Sd-12*15:00#");
        assert_eq!(wire(cmd_set_target_az(123.5)), ":Sz123*30:00#");
        assert_eq!(wire(cmd_set_target_alt(0.0)), ":Sa+00*00:00#");
        assert_eq!(wire(cmd_set_site_longitude(-71.5)), ":Sg288*30:00#");
        assert_eq!(wire(cmd_set_site_latitude(42.25)), ":St+42*15:00#");
        assert_eq!(wire(cmd_set_utc_offset(-7.0)), ":SG-07:00:00#");
        assert_eq!(cmd_set_target_ra(1.0).expect(), Expect::Ack);
    }

    #[test]
    fn queries_and_motion() {
        assert_eq!(wire(cmd_get_utc_offset()), ":GG#");
        assert_eq!(wire(cmd_sync()), ":CM#");
        assert_eq!(wire(cmd_park()), ":hP#");
        assert_eq!(wire(cmd_unpark()), ":hU#");
        assert_eq!(wire(cmd_abort()), ":Q#");
        let pulse = cmd_pulse_guide(PulseGuide::new(GuideDirection::North, 50));
        assert_eq!(wire(pulse), ":Mn050#");
    }

    #[test]
    fn focuser_commands() {
        assert_eq!(wire(cmd_focuser_absolute(150)), ":FS000150#");
        assert_eq!(wire(cmd_focuser_absolute(0)), ":FS000000#");
        assert_eq!(
            wire(cmd_focuser_relative(FocusDirection::Inward, 150)),
            ":FM-150#"
        );
        assert_eq!(
            wire(cmd_focuser_relative(FocusDirection::Outward, 42)),
            ":FM42#"
        );
        assert_eq!(
            wire(cmd_focuser_timed(FocusDirection::Inward, 250)),
            ":FM-250.000000#"
        );
        assert_eq!(
            wire(cmd_focuser_timed(FocusDirection::Outward, 1000)),
            ":FM1000.000000#"
        );
        assert_eq!(wire(cmd_focuser_abort()), ":FQ#");
        assert_eq!(wire(cmd_focuser_position()), ":Fp#");
    }

    #[test]
    fn focuser_blindness_matches_classification() {
        use lx200_protocol::{classify, Exchange};

        for cmd in [
            cmd_focuser_absolute(10),
            cmd_focuser_relative(FocusDirection::Inward, 10),
            cmd_focuser_timed(FocusDirection::Outward, 10),
            cmd_focuser_abort(),
        ] {
            assert!(cmd.is_blind());
            assert_eq!(classify(&cmd.to_string()), Exchange::Blind);
        }
        assert!(!cmd_focuser_position().is_blind());
        assert_eq!(classify(&wire(cmd_focuser_position())), Exchange::Blocking);
    }

    #[test]
    fn focuser_position_parsing() {
        assert_eq!(parse_focuser_position("12345").unwrap(), 12345);
        assert_eq!(parse_focuser_position(" -20 ").unwrap(), -20);
        assert!(matches!(
            parse_focuser_position("12a"),
            Err(Error::Protocol(_))
        ));
        assert!(parse_focuser_position("").is_err());
    }
}
