//! Read-only configuration driving slot generation and recurrence.
//!
//! Every field has a serde default, so a policy can be loaded from a partial JSON
//! document. Call [`SlotPolicy::validate`] before use.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::cadence::Cadence;
use crate::dst;
use crate::error::{Result, SlotError};
use crate::schedule::WeeklyAvailability;

/// An inclusive range of calendar dates on which nothing may be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl BlockedRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Which cadences a booking may repeat with, and how long a series may get.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrencePolicy {
    /// Allowed cadences. Empty disables recurrence counting.
    pub cadences: Vec<Cadence>,
    /// Cap on the number of occurrences in one series.
    pub max_series: u32,
    /// How many days past the visible range the counter looks for conflicts.
    pub horizon_days: u32,
}

impl Default for RecurrencePolicy {
    fn default() -> Self {
        Self {
            cadences: Vec::new(),
            max_series: 1,
            horizon_days: 365,
        }
    }
}

impl RecurrencePolicy {
    /// Whether the recurrence counter runs at all.
    pub fn is_enabled(&self) -> bool {
        !self.cadences.is_empty() && self.max_series > 0
    }

    /// A single non-repeating booking is always allowed.
    pub fn allows(&self, cadence: Cadence) -> bool {
        cadence == Cadence::None || self.cadences.contains(&cadence)
    }

    /// Human-readable list of allowed cadences, e.g. "weekly, monthly-day".
    pub fn label(&self) -> String {
        if self.cadences.is_empty() {
            return Cadence::None.to_string();
        }
        self.cadences
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Slot generation settings for one bookable template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotPolicy {
    pub slot_duration_minutes: u32,
    /// Gap enforced after every slot and around every existing booking.
    pub buffer_minutes: u32,
    /// How many days ahead of "now" a slot may start.
    pub advance_booking_days: u32,
    /// How many hours after "now" the earliest slot may start.
    pub min_notice_hours: u32,
    /// Minute-of-hour grid for slot starts. Empty means back-to-back tiling.
    pub allowed_start_minutes: BTreeSet<u32>,
    pub blocked: Vec<BlockedRange>,
    /// IANA timezone of the resource. Unknown names fall back to UTC.
    pub timezone: String,
    /// The template's own weekly schedule; may be empty.
    pub availability: WeeklyAvailability,
    pub recurrence: RecurrencePolicy,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self {
            slot_duration_minutes: 30,
            buffer_minutes: 0,
            advance_booking_days: 90,
            min_notice_hours: 0,
            allowed_start_minutes: BTreeSet::new(),
            blocked: Vec::new(),
            timezone: "UTC".to_string(),
            availability: WeeklyAvailability::default(),
            recurrence: RecurrencePolicy::default(),
        }
    }
}

impl SlotPolicy {
    /// Reject configurations the generator cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.slot_duration_minutes == 0 {
            return Err(SlotError::InvalidDuration(self.slot_duration_minutes));
        }
        if let Some(minute) = self.allowed_start_minutes.iter().find(|m| **m >= 60) {
            return Err(SlotError::InvalidTime(format!(
                "allowed start minute {} is not within an hour",
                minute
            )));
        }
        if let Some(range) = self.blocked.iter().find(|r| r.from > r.to) {
            return Err(SlotError::InvalidDateRange(format!(
                "blocked range {} ends before it starts ({})",
                range.from, range.to
            )));
        }
        Ok(())
    }

    pub fn duration(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.slot_duration_minutes))
    }

    pub fn buffer(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.buffer_minutes))
    }

    /// The resource timezone, or UTC when the name is not recognized.
    pub fn tz(&self) -> Tz {
        dst::timezone_or_utc(&self.timezone)
    }

    /// `now + min_notice <= start <= now + advance_booking`.
    ///
    /// A notice that overflows the calendar admits nothing; an advance limit that
    /// overflows it admits everything.
    pub fn within_booking_window(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let notice = TimeDelta::hours(i64::from(self.min_notice_hours));
        let Some(earliest) = now.checked_add_signed(notice) else {
            return false;
        };
        let advance = TimeDelta::days(i64::from(self.advance_booking_days));
        let before_latest = now
            .checked_add_signed(advance)
            .map_or(true, |latest| start <= latest);
        earliest <= start && before_latest
    }

    pub fn is_blocked(&self, date: NaiveDate) -> bool {
        self.blocked.iter().any(|range| range.contains(date))
    }

    /// Guard used by callers that name a cadence explicitly.
    pub fn require_cadence(&self, cadence: Cadence) -> Result<()> {
        if self.recurrence.allows(cadence) {
            Ok(())
        } else {
            Err(SlotError::CadenceNotAllowed(cadence))
        }
    }
}
