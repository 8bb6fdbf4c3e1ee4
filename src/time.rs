//! Local dates, local times, and date-times with and without a UTC offset.
//!
//! Each type validates calendar and range rules on construction: months
//! `1..=12`, days against the month (February 29 only in leap years), hours
//! `0..=23`, minutes and seconds `0..=59`. Fractional seconds are kept to
//! millisecond precision; further digits are truncated.

#[cfg(test)]
#[path = "./time_tests.rs"]
mod tests;

use crate::{Error, ErrorKind, Span};
use std::fmt;
use std::str::FromStr;

/// A calendar date without time or offset, e.g. `1979-05-27`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

/// A wall-clock time without date or offset, e.g. `07:32:00.999`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Sub-second part truncated to three digits.
    pub millisecond: u16,
}

/// A date and time without offset, e.g. `1979-05-27T07:32:00`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalDateTime {
    pub date: LocalDate,
    pub time: LocalTime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimeOffset {
    /// A suffix which, when applied to a time, denotes a UTC offset of 00:00;
    /// often spoken “Zulu” from the ICAO phonetic alphabet representation of the letter “Z”.
    /// RFC 3339 section 2
    Z,
    /// Offset between local time and UTC
    Custom { minutes: i16 },
}

impl TimeOffset {
    /// Offset from UTC in minutes.
    pub fn minutes(self) -> i16 {
        match self {
            TimeOffset::Z => 0,
            TimeOffset::Custom { minutes } => minutes,
        }
    }
}

/// A date-time pinned to UTC by an offset, e.g. `1979-05-27T00:32:00-07:00`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OffsetDateTime {
    pub date: LocalDate,
    pub time: LocalTime,
    pub offset: TimeOffset,
}

fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: u16, month: u8) -> u8 {
    const DAYS: [u8; 13] = [0, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    if month == 2 && is_leap_year(year) {
        29
    } else {
        DAYS[month as usize]
    }
}

/// Reads exactly `n` ASCII digits starting at `at`.
fn digits(bytes: &[u8], at: usize, n: usize) -> Option<u32> {
    let slice = bytes.get(at..at + n)?;
    let mut value = 0u32;
    for &b in slice {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value * 10 + (b - b'0') as u32;
    }
    Some(value)
}

fn invalid(message: String) -> ErrorKind {
    ErrorKind::InvalidDateTime(message)
}

impl LocalDate {
    /// Validates and builds a date.
    pub fn new(year: u16, month: u8, day: u8) -> Result<Self, ErrorKind> {
        if year > 9999 || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(invalid(format!(
                "invalid local date: {year:04}-{month:02}-{day:02} is out of range"
            )));
        }
        if day > days_in_month(year, month) {
            if month == 2 {
                return Err(invalid("invalid local date: days of February".to_owned()));
            }
            return Err(invalid(format!(
                "invalid local date: month {month} has no day {day}"
            )));
        }
        Ok(LocalDate { year, month, day })
    }

    /// Parses `YYYY-MM-DD`.
    pub(crate) fn parse(text: &str) -> Result<Self, ErrorKind> {
        let b = text.as_bytes();
        let fields = match b {
            [_, _, _, _, b'-', _, _, b'-', _, _] => {
                (digits(b, 0, 4), digits(b, 5, 2), digits(b, 8, 2))
            }
            _ => (None, None, None),
        };
        let (Some(year), Some(month), Some(day)) = fields else {
            return Err(invalid(format!("invalid local date format \"{text}\"")));
        };
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(invalid(format!("invalid local date format \"{text}\"")));
        }
        LocalDate::new(year as u16, month as u8, day as u8)
    }

    /// Days since 1970-01-01 in the proleptic Gregorian calendar.
    pub fn days_since_epoch(&self) -> i64 {
        // Howard Hinnant's days_from_civil
        let m = self.month as i64;
        let y = self.year as i64 - if m <= 2 { 1 } else { 0 };
        let era = y.div_euclid(400);
        let yoe = y - era * 400;
        let mp = (m + 9) % 12;
        let doy = (153 * mp + 2) / 5 + self.day as i64 - 1;
        let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
        era * 146_097 + doe - 719_468
    }
}

impl LocalTime {
    /// Validates and builds a time.
    pub fn new(hour: u8, minute: u8, second: u8, millisecond: u16) -> Result<Self, ErrorKind> {
        if hour > 23 || minute > 59 || second > 59 || millisecond > 999 {
            return Err(invalid(format!(
                "invalid local time: {hour:02}:{minute:02}:{second:02} is out of range"
            )));
        }
        Ok(LocalTime {
            hour,
            minute,
            second,
            millisecond,
        })
    }

    /// Parses `HH:MM:SS` with an optional `.fraction`.
    pub(crate) fn parse(text: &str) -> Result<Self, ErrorKind> {
        let b = text.as_bytes();
        let bad_format = || invalid(format!("invalid local time format \"{text}\""));
        if b.len() < 8 || b[2] != b':' || b[5] != b':' {
            return Err(bad_format());
        }
        let (Some(hour), Some(minute), Some(second)) =
            (digits(b, 0, 2), digits(b, 3, 2), digits(b, 6, 2))
        else {
            return Err(bad_format());
        };
        let mut millisecond = 0u16;
        match &b[8..] {
            [] => {}
            [b'.', frac @ ..] if !frac.is_empty() && frac.iter().all(u8::is_ascii_digit) => {
                for i in 0..3 {
                    let digit = frac.get(i).map_or(0, |d| (d - b'0') as u16);
                    millisecond = millisecond * 10 + digit;
                }
            }
            _ => return Err(bad_format()),
        }
        if hour > 23 || minute > 59 || second > 59 {
            return Err(bad_format());
        }
        LocalTime::new(hour as u8, minute as u8, second as u8, millisecond)
    }

    /// Milliseconds since midnight.
    pub fn millis_of_day(&self) -> i64 {
        ((self.hour as i64 * 60 + self.minute as i64) * 60 + self.second as i64) * 1000
            + self.millisecond as i64
    }
}

impl LocalDateTime {
    /// Parses a date and a time joined by `T`, `t` or a single space.
    pub(crate) fn parse(text: &str) -> Result<Self, ErrorKind> {
        let mut parts = text.split(['T', 't', ' ']);
        let (Some(date), Some(time), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid(format!("invalid local date-time format \"{text}\"")));
        };
        Ok(LocalDateTime {
            date: LocalDate::parse(date)?,
            time: LocalTime::parse(time)?,
        })
    }
}

impl OffsetDateTime {
    /// Parses a local date-time followed by `Z` or `±HH:MM`.
    pub(crate) fn parse(text: &str) -> Result<Self, ErrorKind> {
        let bad_format = || invalid(format!("invalid offset date-time format \"{text}\""));
        let (local, offset) = if let Some(local) = text.strip_suffix(['Z', 'z']) {
            (local, TimeOffset::Z)
        } else {
            // The sign sits after the time part; dashes before index 10 are
            // part of the date.
            let Some(sign_at) = text
                .char_indices()
                .skip(10)
                .filter(|&(_, c)| c == '+' || c == '-')
                .map(|(i, _)| i)
                .last()
            else {
                return Err(bad_format());
            };
            let b = &text.as_bytes()[sign_at..];
            let (Some(hours), Some(minutes)) = (digits(b, 1, 2), digits(b, 4, 2)) else {
                return Err(bad_format());
            };
            if b.len() != 6 || b[3] != b':' || hours > 23 || minutes > 59 {
                return Err(bad_format());
            }
            let magnitude = (hours * 60 + minutes) as i16;
            let minutes = if b[0] == b'-' { -magnitude } else { magnitude };
            (&text[..sign_at], TimeOffset::Custom { minutes })
        };
        let LocalDateTime { date, time } = LocalDateTime::parse(local)?;
        Ok(OffsetDateTime { date, time, offset })
    }

    /// The instant this value denotes, in milliseconds since the Unix epoch.
    pub fn unix_timestamp_millis(&self) -> i64 {
        self.date.days_since_epoch() * 86_400_000 + self.time.millis_of_day()
            - self.offset.minutes() as i64 * 60_000
    }

    /// The date and time as written, without the offset.
    pub fn local(&self) -> LocalDateTime {
        LocalDateTime {
            date: self.date,
            time: self.time,
        }
    }
}

impl fmt::Display for LocalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl fmt::Display for LocalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)?;
        if self.millisecond != 0 {
            write!(f, ".{:03}", self.millisecond)?;
        }
        Ok(())
    }
}

impl fmt::Display for LocalDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{}", self.date, self.time)
    }
}

impl fmt::Display for TimeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TimeOffset::Z => f.write_str("Z"),
            TimeOffset::Custom { minutes } => {
                let sign = if minutes < 0 { '-' } else { '+' };
                let abs = minutes.unsigned_abs();
                write!(f, "{sign}{:02}:{:02}", abs / 60, abs % 60)
            }
        }
    }
}

impl fmt::Display for OffsetDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{}{}", self.date, self.time, self.offset)
    }
}

macro_rules! impl_from_str {
    ($($ty:ty),*) => {$(
        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::parse(s).map_err(|kind| Error::from((kind, Span::from_offsets(0, s.len()))))
            }
        }
    )*};
}

impl_from_str!(LocalDate, LocalTime, LocalDateTime, OffsetDateTime);
