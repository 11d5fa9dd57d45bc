/*!
 * Timecode conversion from SRT to ASS time grammar.
 *
 * SRT carries millisecond precision (`HH:MM:SS,mmm`) while ASS uses
 * hundredths (`H:MM:SS.hh`). Milliseconds are truncated, never rounded,
 * so `999` becomes `99`; existing renders depend on this.
 */

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::TimecodeError;

// @const: SRT timestamp grammar
static SRT_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d{2}):(\d{2}),(\d{3})$").unwrap()
});

/// A normalized timestamp at hundredth-of-a-second granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timecode {
    pub hours: u32,
    pub minutes: u8,
    pub seconds: u8,
    pub hundredths: u8,
}

impl Timecode {
    /// Parse an SRT timestamp such as `01:02:03,007`
    pub fn parse_srt(raw: &str) -> Result<Self, TimecodeError> {
        let malformed = || TimecodeError::MalformedTimestamp(raw.to_string());

        let caps = SRT_TIMESTAMP_REGEX.captures(raw).ok_or_else(malformed)?;

        let hours: u32 = caps[1].parse().map_err(|_| malformed())?;
        let minutes: u8 = caps[2].parse().map_err(|_| malformed())?;
        let seconds: u8 = caps[3].parse().map_err(|_| malformed())?;
        let millis: u16 = caps[4].parse().map_err(|_| malformed())?;

        if minutes >= 60 || seconds >= 60 {
            return Err(malformed());
        }

        Ok(Self {
            hours,
            minutes,
            seconds,
            hundredths: (millis / 10) as u8,
        })
    }

    /// Total length in hundredths of a second
    pub fn total_hundredths(&self) -> u64 {
        ((self.hours as u64 * 60 + self.minutes as u64) * 60 + self.seconds as u64) * 100
            + self.hundredths as u64
    }
}

impl FromStr for Timecode {
    type Err = TimecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_srt(s)
    }
}

/// Formats in ASS grammar, hours unpadded
impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{:02}:{:02}.{:02}",
            self.hours, self.minutes, self.seconds, self.hundredths
        )
    }
}

/// Convert a single SRT timestamp into its ASS representation
pub fn convert(raw: &str) -> Result<String, TimecodeError> {
    Timecode::parse_srt(raw).map(|tc| tc.to_string())
}
