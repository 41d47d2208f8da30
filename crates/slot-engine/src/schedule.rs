//! Weekly availability templates.
//!
//! A [`TimeRange`] is a wall-clock window ("HH:MM" to "HH:MM") that never wraps
//! midnight. A [`WeeklyAvailability`] holds an ordered list of ranges per weekday;
//! ranges on the same day may overlap.

use std::fmt;

use chrono::{NaiveTime, TimeDelta, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};

const HHMM: &str = "%H:%M";

/// A wall-clock window within a single day. `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange", into = "RawTimeRange")]
pub struct TimeRange {
    start: NaiveTime,
    end: NaiveTime,
}

#[derive(Serialize, Deserialize)]
struct RawTimeRange {
    start: String,
    end: String,
}

impl TimeRange {
    /// Build a range from two times, rejecting empty or inverted windows.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if start >= end {
            return Err(SlotError::InvalidTimeRange(format!(
                "{} must be before {}",
                start.format(HHMM),
                end.format(HHMM)
            )));
        }
        Ok(Self { start, end })
    }

    /// "00:00"-"23:59".
    pub fn all_day() -> Self {
        Self {
            start: NaiveTime::MIN,
            end: NaiveTime::MIN + TimeDelta::minutes(23 * 60 + 59),
        }
    }

    /// Parse a range from two "HH:MM" strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_hhmm(start)?, parse_hhmm(end)?)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Minutes since midnight of the window start.
    pub fn start_minute(&self) -> u32 {
        self.start.hour() * 60 + self.start.minute()
    }

    /// Minutes since midnight of the window end.
    pub fn end_minute(&self) -> u32 {
        self.end.hour() * 60 + self.end.minute()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format(HHMM), self.end.format(HHMM))
    }
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = SlotError;

    fn try_from(raw: RawTimeRange) -> Result<Self> {
        TimeRange::parse(&raw.start, &raw.end)
    }
}

impl From<TimeRange> for RawTimeRange {
    fn from(range: TimeRange) -> Self {
        RawTimeRange {
            start: range.start.format(HHMM).to_string(),
            end: range.end.format(HHMM).to_string(),
        }
    }
}

/// Parse a 24h "HH:MM" wall-clock time.
pub fn parse_hhmm(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), HHMM).map_err(|_| SlotError::InvalidTime(s.to_string()))
}

/// Per-weekday availability windows.
///
/// An instance where every day is empty is the "no explicit schedule" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyAvailability {
    pub monday: Vec<TimeRange>,
    pub tuesday: Vec<TimeRange>,
    pub wednesday: Vec<TimeRange>,
    pub thursday: Vec<TimeRange>,
    pub friday: Vec<TimeRange>,
    pub saturday: Vec<TimeRange>,
    pub sunday: Vec<TimeRange>,
}

impl WeeklyAvailability {
    /// The same set of windows on every day of the week.
    pub fn every_day(ranges: Vec<TimeRange>) -> Self {
        Self {
            monday: ranges.clone(),
            tuesday: ranges.clone(),
            wednesday: ranges.clone(),
            thursday: ranges.clone(),
            friday: ranges.clone(),
            saturday: ranges.clone(),
            sunday: ranges,
        }
    }

    /// Builder-style setter for a single weekday.
    pub fn with_day(mut self, weekday: Weekday, ranges: Vec<TimeRange>) -> Self {
        *self.day_mut(weekday) = ranges;
        self
    }

    /// The windows configured for `weekday`, in template order.
    pub fn day(&self, weekday: Weekday) -> &[TimeRange] {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    pub fn day_mut(&mut self, weekday: Weekday) -> &mut Vec<TimeRange> {
        match weekday {
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
            Weekday::Sun => &mut self.sunday,
        }
    }

    /// True when no weekday has a single window.
    pub fn is_empty(&self) -> bool {
        [
            &self.monday,
            &self.tuesday,
            &self.wednesday,
            &self.thursday,
            &self.friday,
            &self.saturday,
            &self.sunday,
        ]
        .iter()
        .all(|ranges| ranges.is_empty())
    }
}

