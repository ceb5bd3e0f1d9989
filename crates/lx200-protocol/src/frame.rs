//! LX200 command framing and blind/blocking classification.
//!
//! # Command format
//!
//! ```text
//! Meade / OpenAstroTech:   :<verb><params>#
//! Astro-Physics:           #:<verb>[ <params>]#
//! Astro-Physics (bare):    #:<verb>
//! ```
//!
//! The leading `#` of the Astro-Physics framing clears any half-received
//! command in the controller's input buffer. Park (`#:KA`) and unpark
//! (`#:PO`) are sent without a trailing terminator.
//!
//! # Responses
//!
//! A command either gets no reply at all (blind), a single unterminated
//! acknowledgement character (`0`/`1`), or text terminated by `#`.

use std::fmt;

use bytes::{BufMut, BytesMut};
use lx200_core::{Error, Result};

/// Response terminator and command delimiter.
pub const TERMINATOR: u8 = b'#';

/// Verb prefix byte.
pub const PREFIX: u8 = b':';

/// Command framing rule, selected per mount family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framing {
    /// `:VERBPARAMS#`
    Meade,
    /// `#:VERB PARAMS#` (the space only when parameters are present)
    AstroPhysics,
    /// `#:VERB` with no terminator
    AstroPhysicsBare,
}

/// What the controller sends back for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expect {
    /// Nothing; the command is fire-and-forget.
    Nothing,
    /// A single unterminated character.
    Ack,
    /// Text up to the `#` terminator.
    Terminated,
}

/// Execution style of a raw command string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exchange {
    /// Write and return without reading.
    Blind,
    /// Write and wait for a response.
    Blocking,
}

/// A framed LX200 command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    verb: String,
    params: String,
    framing: Framing,
    expect: Expect,
}

impl Command {
    /// Build a command with the given framing and reply expectation.
    pub fn new(framing: Framing, verb: &str, params: &str, expect: Expect) -> Self {
        Command {
            verb: verb.to_string(),
            params: params.to_string(),
            framing,
            expect,
        }
    }

    /// Meade framing (`:VERBPARAMS#`).
    pub fn meade(verb: &str, params: &str, expect: Expect) -> Self {
        Self::new(Framing::Meade, verb, params, expect)
    }

    /// Astro-Physics framing (`#:VERB PARAMS#`).
    pub fn astro_physics(verb: &str, params: &str, expect: Expect) -> Self {
        Self::new(Framing::AstroPhysics, verb, params, expect)
    }

    /// Unterminated Astro-Physics framing (`#:VERB`), always blind.
    pub fn astro_physics_bare(verb: &str) -> Self {
        Self::new(Framing::AstroPhysicsBare, verb, "", Expect::Nothing)
    }

    /// Parse a complete Meade command as typed by a user (`:GR#`).
    ///
    /// The reply expectation comes from [`classify`]. The text must be
    /// longer than two characters, start with `:` and end with `#`.
    pub fn parse_meade(raw: &str) -> Result<Self> {
        if raw.len() <= 2 || !raw.starts_with(':') || !raw.ends_with('#') {
            return Err(Error::InvalidParameter(format!(
                "not a Meade command (expected ':...#'): {raw:?}"
            )));
        }
        let expect = match classify(raw) {
            Exchange::Blind => Expect::Nothing,
            Exchange::Blocking => Expect::Terminated,
        };
        let command = Self::meade(&raw[1..raw.len() - 1], "", expect);
        command.validate()?;
        Ok(command)
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn params(&self) -> &str {
        &self.params
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn expect(&self) -> Expect {
        self.expect
    }

    /// Whether the command is fire-and-forget.
    pub fn is_blind(&self) -> bool {
        self.expect == Expect::Nothing
    }

    /// Check that the command can be framed unambiguously.
    ///
    /// The verb must be non-empty printable ASCII and neither the verb nor
    /// the parameters may contain the `#` delimiter.
    pub fn validate(&self) -> Result<()> {
        if self.verb.is_empty() {
            return Err(Error::InvalidParameter("empty command verb".into()));
        }
        for (what, text) in [("verb", &self.verb), ("parameters", &self.params)] {
            if text.bytes().any(|b| b == TERMINATOR) {
                return Err(Error::InvalidParameter(format!(
                    "delimiter '#' found in command {what}: {text:?}"
                )));
            }
            if !text.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
                return Err(Error::InvalidParameter(format!(
                    "command {what} must be printable ASCII: {text:?}"
                )));
            }
        }
        Ok(())
    }

    /// Encode the command into raw bytes ready for transmission.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.verb.len() + self.params.len() + 4);
        match self.framing {
            Framing::Meade => {
                buf.put_u8(PREFIX);
                buf.put_slice(self.verb.as_bytes());
                buf.put_slice(self.params.as_bytes());
                buf.put_u8(TERMINATOR);
            }
            Framing::AstroPhysics => {
                buf.put_u8(TERMINATOR);
                buf.put_u8(PREFIX);
                buf.put_slice(self.verb.as_bytes());
                if !self.params.is_empty() {
                    buf.put_u8(b' ');
                    buf.put_slice(self.params.as_bytes());
                }
                buf.put_u8(TERMINATOR);
            }
            Framing::AstroPhysicsBare => {
                buf.put_u8(TERMINATOR);
                buf.put_u8(PREFIX);
                buf.put_slice(self.verb.as_bytes());
            }
        }
        buf.to_vec()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.encode()))
    }
}

/// Classify a raw command string as blind or blocking.
///
/// Blind commands are the focuser family (`F...`) except the position
/// probe `Fp`, and the alignment triggers (`MA...`). Everything else waits
/// for a response. Framing characters (`#`, `:`) in front of the verb are
/// ignored.
///
/// ```
/// use lx200_protocol::frame::{classify, Exchange};
///
/// assert_eq!(classify(":FQ#"), Exchange::Blind);
/// assert_eq!(classify(":Fp#"), Exchange::Blocking);
/// assert_eq!(classify(":MAS#"), Exchange::Blind);
/// assert_eq!(classify(":GR#"), Exchange::Blocking);
/// ```
pub fn classify(raw: &str) -> Exchange {
    let verb = raw.trim_start_matches('#').trim_start_matches(':');
    if (verb.starts_with('F') && !verb.starts_with("Fp")) || verb.starts_with("MA") {
        Exchange::Blind
    } else {
        Exchange::Blocking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meade_framing() {
        let cmd = Command::meade("Sr", "12:30:00", Expect::Ack);
        assert_eq!(cmd.encode(), b":Sr12:30:00#");
        assert_eq!(Command::meade("GG", "", Expect::Terminated).encode(), b":GG#");
    }

    #[test]
    fn astro_physics_framing() {
        let cmd = Command::astro_physics("Sr", "12:30:00", Expect::Ack);
        assert_eq!(cmd.encode(), b"#:Sr 12:30:00#");
        assert_eq!(
            Command::astro_physics("GOS", "", Expect::Terminated).encode(),
            b"#:GOS#"
        );
    }

    #[test]
    fn astro_physics_bare_framing_has_no_terminator() {
        let cmd = Command::astro_physics_bare("KA");
        assert_eq!(cmd.encode(), b"#:KA");
        assert!(cmd.is_blind());
    }

    #[test]
    fn display_matches_wire_form() {
        let cmd = Command::astro_physics("Sd", "+45*00:00", Expect::Ack);
        assert_eq!(cmd.to_string(), "#:Sd +45*00:00#");
    }

    #[test]
    fn validate_rejects_embedded_terminator() {
        let cmd = Command::meade("Sr", "12#00", Expect::Ack);
        assert!(matches!(cmd.validate(), Err(Error::InvalidParameter(_))));
        let cmd = Command::meade("G#", "", Expect::Terminated);
        assert!(matches!(cmd.validate(), Err(Error::InvalidParameter(_))));
        let cmd = Command::meade("", "", Expect::Terminated);
        assert!(cmd.validate().is_err());
        let cmd = Command::meade("GR\n", "", Expect::Terminated);
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn classify_focuser_family() {
        for blind in [":FS000100#", ":FM-50#", ":FQ#", ":F+#", ":FB1#", ":FMAS#"] {
            assert_eq!(classify(blind), Exchange::Blind, "{blind}");
        }
        assert_eq!(classify(":Fp#"), Exchange::Blocking);
    }

    #[test]
    fn classify_alignment_triggers() {
        assert_eq!(classify(":MAS#"), Exchange::Blind);
        assert_eq!(classify(":MAZ+10#"), Exchange::Blind);
        // Other motion verbs wait for an answer.
        assert_eq!(classify(":MS#"), Exchange::Blocking);
        assert_eq!(classify(":Mn#"), Exchange::Blocking);
    }

    #[test]
    fn classify_ignores_framing_prefix() {
        assert_eq!(classify("#:FQ#"), Exchange::Blind);
        assert_eq!(classify("FQ#"), Exchange::Blind);
        assert_eq!(classify("#:GOS#"), Exchange::Blocking);
    }

    #[test]
    fn parse_meade_uses_classification() {
        let cmd = Command::parse_meade(":FQ#").unwrap();
        assert_eq!(cmd.expect(), Expect::Nothing);
        assert_eq!(cmd.encode(), b":FQ#");

        let cmd = Command::parse_meade(":GVP#").unwrap();
        assert_eq!(cmd.expect(), Expect::Terminated);
        assert_eq!(cmd.verb(), "GVP");
    }

    #[test]
    fn parse_meade_rejects_malformed_text() {
        for bad in ["", ":#", "GR#", ":GR", "#:GR#", ":G#R#"] {
            assert!(
                matches!(Command::parse_meade(bad), Err(Error::InvalidParameter(_))),
                "{bad:?}"
            );
        }
    }
}
