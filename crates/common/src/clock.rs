//! Wall-clock access.
//!
//! Export filenames and saved-meme timestamps are derived from the
//! current local time. Routing every read through [`Clock`] lets tests
//! pin the time and assert exact filenames.

use chrono::{DateTime, FixedOffset, Local, Utc};

/// A source of the current local time.
pub trait Clock: Send + Sync {
    /// Current time with the local UTC offset attached.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current time in UTC.
    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl FixedClock {
    /// Parse an RFC 3339 timestamp such as `2024-03-09T14:05:07+02:00`.
    pub fn parse(rfc3339: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(rfc3339).map(Self)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// UTC offset of a timestamp in hours, signed: `+2`, `-8`, `+5.5`.
pub fn utc_offset_label(time: &DateTime<FixedOffset>) -> String {
    let secs = time.offset().local_minus_utc();
    let sign = if secs >= 0 { "+" } else { "-" };
    let secs = secs.abs();
    if secs % 3600 == 0 {
        format!("{sign}{}", secs / 3600)
    } else {
        format!("{sign}{}", secs as f64 / 3600.0)
    }
}
