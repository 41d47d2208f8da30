//! Recurrence cadences and the "next occurrence" rule for each.
//!
//! Stepping happens on local wall-clock datetimes in the resource timezone, so a
//! weekly 10:00 booking stays at 10:00 across DST changes. The same stepping code
//! drives both the recurrence counter and the series materializer.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, TimeDelta, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::{self, DstPolicy};
use crate::error::{Result, SlotError};

/// How a recurring booking steps forward in time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Cadence {
    /// A single occurrence, never repeats.
    #[default]
    None,
    /// Every 7 calendar days.
    Weekly,
    /// Same day-of-month every month (clamped at month end, e.g. Jan 31 -> Feb 28).
    MonthlyDate,
    /// Same "Nth weekday" every month (e.g. 2nd Thursday).
    MonthlyDay,
    /// Same month and day every year.
    Yearly,
}

impl Cadence {
    pub const ALL: [Cadence; 5] = [
        Cadence::None,
        Cadence::Weekly,
        Cadence::MonthlyDate,
        Cadence::MonthlyDay,
        Cadence::Yearly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Cadence::None => "none",
            Cadence::Weekly => "weekly",
            Cadence::MonthlyDate => "monthly-date",
            Cadence::MonthlyDay => "monthly-day",
            Cadence::Yearly => "yearly",
        }
    }

    /// Wall-clock start of the occurrence after `start`.
    ///
    /// Returns `None` for [`Cadence::None`] and when the result would leave
    /// chrono's representable range.
    pub fn step(self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Cadence::None => None,
            Cadence::Weekly => start.checked_add_days(Days::new(7)),
            Cadence::MonthlyDate => start.checked_add_months(Months::new(1)),
            Cadence::Yearly => start.checked_add_months(Months::new(12)),
            Cadence::MonthlyDay => {
                same_weekday_next_month(start.date()).map(|date| date.and_time(start.time()))
            }
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cadence {
    type Err = SlotError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let name = s.trim();
        Cadence::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| SlotError::UnknownCadence(s.to_string()))
    }
}

/// Which occurrence of its weekday `date` is within its month (1-based).
///
/// The 1st-7th are occurrence 1, the 8th-14th occurrence 2, and so on.
pub fn weekday_occurrence(date: NaiveDate) -> u32 {
    (date.day() - 1) / 7 + 1
}

/// The date in the following month that is the same "Nth weekday" as `date`.
///
/// When the target month has no Nth occurrence (a 5th Friday, say), falls back
/// one week to the last occurrence in that month.
pub fn same_weekday_next_month(date: NaiveDate) -> Option<NaiveDate> {
    let occurrence = weekday_occurrence(date);
    let first = date.with_day(1)?.checked_add_months(Months::new(1))?;

    let wanted = date.weekday().num_days_from_monday();
    let have = first.weekday().num_days_from_monday();
    let offset = (7 + wanted - have) % 7;

    let candidate = first.checked_add_days(Days::new(u64::from(offset + (occurrence - 1) * 7)))?;
    if candidate.month() == first.month() {
        Some(candidate)
    } else {
        candidate.checked_sub_days(Days::new(7))
    }
}

/// One concrete instance of a recurring booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Iterator over the occurrences of a booking, starting with the booking itself.
///
/// Every occurrence keeps the first one's duration. Occurrences whose wall-clock
/// start falls in a DST gap are shifted forward rather than dropped.
#[derive(Debug, Clone)]
pub struct Occurrences {
    tz: Tz,
    cadence: Cadence,
    duration: TimeDelta,
    pending: Option<(NaiveDateTime, DateTime<Utc>)>,
}

impl Iterator for Occurrences {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        let (local, start) = self.pending.take()?;
        let end = start.checked_add_signed(self.duration)?;
        self.pending = self.cadence.step(local).and_then(|next_local| {
            dst::localize(&self.tz, next_local, DstPolicy::ShiftForward)
                .map(|next_start| (next_local, next_start))
        });
        Some(Occurrence { start, end })
    }
}

/// Walk `cadence` forward from the booking `[start, end)` in timezone `tz`.
///
/// For [`Cadence::None`] the iterator yields only the booking itself.
pub fn occurrences(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    cadence: Cadence,
    tz: Tz,
) -> Occurrences {
    let local = start.with_timezone(&tz).naive_local();
    Occurrences {
        tz,
        cadence,
        duration: end - start,
        pending: Some((local, start)),
    }
}

/// Like [`occurrences`], for a booking given as a local wall-clock start in `tz`.
///
/// # Errors
/// `InvalidTime` when `start` does not exist in `tz` (it falls in a DST gap).
pub fn occurrences_from_local(
    start: NaiveDateTime,
    duration_minutes: u32,
    cadence: Cadence,
    tz: Tz,
) -> Result<Occurrences> {
    let first = dst::localize(&tz, start, DstPolicy::Skip).ok_or_else(|| {
        SlotError::InvalidTime(format!("{} does not exist in {}", start, tz.name()))
    })?;
    let end = first
        .checked_add_signed(TimeDelta::minutes(i64::from(duration_minutes)))
        .ok_or_else(|| SlotError::InvalidDuration(duration_minutes))?;
    Ok(occurrences(first, end, cadence, tz))
}
