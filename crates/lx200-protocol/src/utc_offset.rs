//! Astro-Physics UTC-offset quirk decoding.
//!
//! Astro-Physics controllers cannot send a leading `-` in the `:GG#`
//! response. A negative offset is instead announced by a marker in the
//! first two characters, which also encode the magnitude:
//!
//! ```text
//! A5 A4 A3 A2 A1 00 @9 @8 @7 @6 @5 @4
//! -1 -2 -3 -4 -5 -6 -7 -8 -9 -10 -11 -12
//! ```
//!
//! Decoding replaces the two marker characters with `-HH` and parses the
//! rest of the field as ordinary sexagesimal, so `A5:30:00` is -1.5 hours.
//! A marker followed by a character missing from [`QUIRK_TABLE`] is a
//! protocol error; the decoder never guesses.

use lx200_core::{Error, Result};
use tracing::warn;

use crate::codec::parse_sexagesimal;

/// One row of the negative UTC-offset substitution table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuirkEntry {
    /// The two leading characters sent by the controller.
    pub prefix: &'static str,
    /// Magnitude of the negative offset in whole hours.
    pub hours: u8,
    /// Whether the row has been confirmed against real hardware.
    pub verified: bool,
}

const fn row(prefix: &'static str, hours: u8, verified: bool) -> QuirkEntry {
    QuirkEntry {
        prefix,
        hours,
        verified,
    }
}

/// Negative UTC-offset substitution table.
///
/// `@4` (-12 h) comes from the controller documentation only and has not
/// been seen on hardware. Decoding through it logs a warning.
pub const QUIRK_TABLE: [QuirkEntry; 12] = [
    row("A5", 1, true),
    row("A4", 2, true),
    row("A3", 3, true),
    row("A2", 4, true),
    row("A1", 5, true),
    row("00", 6, true),
    row("@9", 7, true),
    row("@8", 8, true),
    row("@7", 9, true),
    row("@6", 10, true),
    row("@5", 11, true),
    row("@4", 12, false),
];

/// Whether a response starts with one of the negative-offset markers.
fn has_marker(body: &str) -> bool {
    body.starts_with('A') || body.starts_with('@') || body.starts_with("00")
}

/// Look up the table row for a two-character prefix.
pub fn lookup(prefix: &str) -> Option<&'static QuirkEntry> {
    QUIRK_TABLE.iter().find(|entry| entry.prefix == prefix)
}

/// Decode a `:GG#` response into signed hours.
///
/// Responses without a marker are parsed as plain sexagesimal.
///
/// ```
/// use lx200_protocol::utc_offset::decode_utc_offset;
///
/// assert_eq!(decode_utc_offset("A5:00:00#").unwrap(), -1.0);
/// assert_eq!(decode_utc_offset("@8:30:00").unwrap(), -8.5);
/// assert_eq!(decode_utc_offset("05:00:00#").unwrap(), 5.0);
/// assert!(decode_utc_offset("A7:00:00").is_err());
/// ```
pub fn decode_utc_offset(raw: &str) -> Result<f64> {
    let body = raw.trim().trim_end_matches('#');
    if body.is_empty() {
        return Err(Error::Protocol("empty UTC offset response".into()));
    }

    if !has_marker(body) {
        return parse_sexagesimal(body);
    }

    let prefix = body
        .get(..2)
        .ok_or_else(|| Error::Protocol(format!("truncated UTC offset marker: {raw:?}")))?;
    let entry = lookup(prefix).ok_or_else(|| {
        Error::Protocol(format!("unrecognized UTC offset marker {prefix:?} in {raw:?}"))
    })?;

    if !entry.verified {
        warn!(
            marker = entry.prefix,
            hours = -i32::from(entry.hours),
            "decoding UTC offset through an unverified quirk table entry"
        );
    }

    parse_sexagesimal(&format!("-{:02}{}", entry.hours, &body[2..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_row_decodes_to_its_negative_hours() {
        let expected = [
            ("A5", -1.0),
            ("A4", -2.0),
            ("A3", -3.0),
            ("A2", -4.0),
            ("A1", -5.0),
            ("00", -6.0),
            ("@9", -7.0),
            ("@8", -8.0),
            ("@7", -9.0),
            ("@6", -10.0),
            ("@5", -11.0),
            ("@4", -12.0),
        ];
        assert_eq!(expected.len(), QUIRK_TABLE.len());
        for (prefix, hours) in expected {
            let raw = format!("{prefix}:00:00#");
            assert_eq!(decode_utc_offset(&raw).unwrap(), hours, "{raw}");
            // Bare marker without minutes or seconds.
            assert_eq!(decode_utc_offset(prefix).unwrap(), hours, "{prefix}");
        }
    }

    #[test]
    fn minutes_and_seconds_follow_the_marker() {
        assert_eq!(decode_utc_offset("A5:30:00#").unwrap(), -1.5);
        assert_eq!(decode_utc_offset("@6:45:00#").unwrap(), -10.75);
        assert_eq!(decode_utc_offset("00:30:00").unwrap(), -6.5);
    }

    #[test]
    fn unlisted_marker_combinations_are_protocol_errors() {
        let mut unlisted = Vec::new();
        for marker in ['A', '@'] {
            for c in ('0'..='9').chain(['A', 'Z', ':', '#']) {
                let prefix = format!("{marker}{c}");
                if lookup(&prefix).is_none() {
                    unlisted.push(prefix);
                }
            }
        }
        // A0, A6..A9, @0..@3 plus the non-digit followers.
        assert!(unlisted.contains(&"A6".to_string()));
        assert!(unlisted.contains(&"@3".to_string()));
        for prefix in unlisted {
            let raw = format!("{prefix}:00:00#");
            assert!(
                matches!(decode_utc_offset(&raw), Err(Error::Protocol(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn lone_marker_character_is_rejected() {
        assert!(matches!(decode_utc_offset("A"), Err(Error::Protocol(_))));
        assert!(matches!(decode_utc_offset("@#"), Err(Error::Protocol(_))));
    }

    #[test]
    fn responses_without_marker_parse_normally() {
        assert_eq!(decode_utc_offset("05:00:00#").unwrap(), 5.0);
        assert_eq!(decode_utc_offset("-04:00:00#").unwrap(), -4.0);
        assert_eq!(decode_utc_offset("01:30").unwrap(), 1.5);
        assert_eq!(decode_utc_offset("0").unwrap(), 0.0);
    }

    #[test]
    fn empty_response_is_rejected() {
        assert!(matches!(decode_utc_offset("#"), Err(Error::Protocol(_))));
        assert!(matches!(decode_utc_offset(""), Err(Error::Protocol(_))));
    }

    #[test]
    fn only_the_documented_row_is_provisional() {
        let provisional: Vec<_> = QUIRK_TABLE
            .iter()
            .filter(|entry| !entry.verified)
            .map(|entry| entry.prefix)
            .collect();
        assert_eq!(provisional, vec!["@4"]);
    }
}
