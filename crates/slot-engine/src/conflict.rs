//! Overlap testing against already-occupied intervals.
//!
//! Both the candidate and the existing booking are padded by the buffer, so a
//! slot must start at least `buffer` after an interval ends, or end at least
//! `buffer` before it starts. Touching intervals with a zero buffer are NOT
//! conflicts.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::slots::CandidateSlot;

/// An existing committed booking. Only its bounds are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupiedInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl OccupiedInterval {
    /// Whether the interval overlaps or touches the instants `[from, to]`.
    pub fn touches(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.start <= to && self.end >= from
    }
}

/// `[start - buffer, end + buffer]`, saturating at the representable range.
pub fn padded_span(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    buffer: TimeDelta,
) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        start
            .checked_sub_signed(buffer)
            .unwrap_or(DateTime::<Utc>::MIN_UTC),
        end.checked_add_signed(buffer)
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
    )
}

/// Whether `[start, end)` collides with `interval` once padded by `buffer`.
///
/// The span is clear iff `start - buffer >= interval.end` or
/// `end + buffer <= interval.start`.
pub fn conflicts_with(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    interval: &OccupiedInterval,
    buffer: TimeDelta,
) -> bool {
    let (padded_start, padded_end) = padded_span(start, end, buffer);
    !(padded_start >= interval.end || padded_end <= interval.start)
}

/// Whether `[start, end)` collides with any interval in the snapshot.
pub fn conflicts_with_any(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    occupied: &[OccupiedInterval],
    buffer: TimeDelta,
) -> bool {
    occupied
        .iter()
        .any(|interval| conflicts_with(start, end, interval, buffer))
}

/// Drop every candidate that collides with an occupied interval.
///
/// Order of the surviving slots is preserved.
pub fn filter_conflicts(
    slots: Vec<CandidateSlot>,
    occupied: &[OccupiedInterval],
    buffer: TimeDelta,
) -> Vec<CandidateSlot> {
    slots
        .into_iter()
        .filter(|slot| !conflicts_with_any(slot.start, slot.end, occupied, buffer))
        .collect()
}
