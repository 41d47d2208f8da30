//! Count how many consecutive occurrences of each slot can still be booked.
//!
//! Occurrences are walked with the same stepping used by the series
//! materializer. Counting stops at the first conflicting occurrence; anything
//! after it is never counted, even when it would be free on its own. Counting
//! also stops once an occurrence starts after the horizon date, which may lie
//! well past the range the caller is displaying.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;

use crate::cadence::{occurrences, Cadence};
use crate::conflict::{conflicts_with_any, OccupiedInterval};
use crate::policy::RecurrencePolicy;
use crate::slots::CandidateSlot;

/// Everything a recurrence scan needs besides the slot itself.
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceScan<'a> {
    pub occupied: &'a [OccupiedInterval],
    pub buffer: TimeDelta,
    pub tz: Tz,
    /// Last local date an occurrence may start on.
    pub horizon_end: NaiveDate,
    pub max_series: u32,
}

impl RecurrenceScan<'_> {
    /// Conflict-free consecutive occurrences of `[start, end)` under `cadence`,
    /// including the first one, capped at `max_series`.
    pub fn count(&self, start: DateTime<Utc>, end: DateTime<Utc>, cadence: Cadence) -> u32 {
        if cadence == Cadence::None {
            return 1;
        }

        let mut count = 0;
        for occurrence in occurrences(start, end, cadence, self.tz).take(self.max_series as usize) {
            if occurrence.start.with_timezone(&self.tz).date_naive() > self.horizon_end {
                break;
            }
            if conflicts_with_any(occurrence.start, occurrence.end, self.occupied, self.buffer) {
                break;
            }
            count += 1;
        }
        count
    }

    /// Best count across all `cadences`.
    pub fn best(&self, start: DateTime<Utc>, end: DateTime<Utc>, cadences: &[Cadence]) -> u32 {
        cadences
            .iter()
            .map(|cadence| self.count(start, end, *cadence))
            .max()
            .unwrap_or(0)
    }
}

/// Fill in `available_recurrences` on every slot.
///
/// Leaves slots untouched when the policy allows no cadence or caps series at 0.
pub fn count_recurrences(
    slots: &mut [CandidateSlot],
    recurrence: &RecurrencePolicy,
    scan: &RecurrenceScan<'_>,
) {
    if !recurrence.is_enabled() {
        return;
    }
    for slot in slots.iter_mut() {
        slot.available_recurrences = Some(scan.best(slot.start, slot.end, &recurrence.cadences));
    }
    tracing::debug!(
        slots = slots.len(),
        cadences = %recurrence.label(),
        horizon_end = %scan.horizon_end,
        "counted available recurrences"
    );
}
