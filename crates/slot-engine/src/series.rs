//! Materialize a recurring booking into concrete occupied intervals.
//!
//! Occurrences are walked with the same cadence stepping as the recurrence
//! counter and checked against one snapshot of occupied intervals:
//!
//! - a conflict on the first occurrence fails the whole request and nothing is
//!   written, not even the series header;
//! - a conflict on a later occurrence ends the series there. What was created up
//!   to that point is returned as a successful, shorter series.
//!
//! Writes are not transactional. A store failure part-way through is propagated
//! and leaves the already-written intervals in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cadence::{occurrences, Cadence, Occurrence};
use crate::conflict::{conflicts_with_any, padded_span, OccupiedInterval};
use crate::error::{Result, SlotError};
use crate::policy::SlotPolicy;
use crate::store::{
    IntervalId, NewInterval, OccupancyReader, OccupancyWriter, ResourceRef, SeriesHeader,
    SeriesId,
};

/// A confirmed request to book a recurring series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRequest {
    pub resource: ResourceRef,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub cadence: Cadence,
    /// Occurrences wanted, clamped to the policy's series cap. Ignored for
    /// [`Cadence::None`], which always books exactly one.
    pub count: u32,
}

/// One interval written by the materializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedInterval {
    pub id: IntervalId,
    /// 1-based position within the series.
    pub position: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Outcome of a successful materialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializedSeries {
    pub series_id: SeriesId,
    /// Occurrences attempted after clamping.
    pub requested: u32,
    pub created: Vec<CreatedInterval>,
}

impl MaterializedSeries {
    /// True when a conflict cut the series short.
    pub fn is_truncated(&self) -> bool {
        (self.created.len() as u32) < self.requested
    }
}

/// The number of occurrences actually attempted for `request`.
///
/// A non-repeating booking is always a single occurrence; otherwise the count is
/// capped by the policy, and never drops below one.
pub fn clamp_count(request: &SeriesRequest, policy: &SlotPolicy) -> u32 {
    if request.cadence == Cadence::None {
        return 1;
    }
    request.count.min(policy.recurrence.max_series).max(1)
}

/// Book `request` occurrence by occurrence until the first conflict.
///
/// # Errors
/// - `InvalidDateRange` if `end <= start`.
/// - `InvalidCount` if zero occurrences of a repeating cadence are requested.
/// - `CadenceNotAllowed` if the policy does not list the cadence.
/// - `FirstOccurrenceConflict` if the very first occurrence is taken.
/// - `Store` for any read or write failure of the store.
pub fn materialize_series<S>(
    store: &mut S,
    request: &SeriesRequest,
    policy: &SlotPolicy,
) -> Result<MaterializedSeries>
where
    S: OccupancyReader + OccupancyWriter,
{
    if request.end <= request.start {
        return Err(SlotError::InvalidDateRange(format!(
            "booking end {} is not after start {}",
            request.end.to_rfc3339(),
            request.start.to_rfc3339()
        )));
    }
    if request.count == 0 && request.cadence != Cadence::None {
        return Err(SlotError::InvalidCount(request.count));
    }
    policy.require_cadence(request.cadence)?;

    let requested = clamp_count(request, policy);
    let tz = policy.tz();
    let planned: Vec<Occurrence> = occurrences(request.start, request.end, request.cadence, tz)
        .take(requested as usize)
        .collect();

    let Some((first, last)) = planned.first().zip(planned.last()) else {
        return Err(SlotError::InvalidCount(requested));
    };

    let buffer = policy.buffer();
    let (from, to) = padded_span(first.start, last.end, buffer);
    let mut occupied = store.fetch_occupied_intervals(&request.resource, from, to)?;

    if conflicts_with_any(first.start, first.end, &occupied, buffer) {
        return Err(SlotError::FirstOccurrenceConflict(first.start.to_rfc3339()));
    }

    let header = SeriesHeader {
        cadence: request.cadence,
        requested,
        start: request.start,
        end: request.end,
    };
    let series_id = store.create_series(&request.resource, &header)?;

    let mut created = Vec::with_capacity(planned.len());
    for (position, occurrence) in (1u32..).zip(planned.iter()) {
        if conflicts_with_any(occurrence.start, occurrence.end, &occupied, buffer) {
            tracing::debug!(
                series_id,
                position,
                start = %occurrence.start,
                "series truncated at conflicting occurrence"
            );
            break;
        }

        let interval = NewInterval {
            start: occurrence.start,
            end: occurrence.end,
            series_id,
            position,
        };
        let id = store.create_occupied_interval(&request.resource, &interval)?;
        occupied.push(OccupiedInterval {
            start: occurrence.start,
            end: occurrence.end,
        });
        created.push(CreatedInterval {
            id,
            position,
            start: occurrence.start,
            end: occurrence.end,
        });
    }

    Ok(MaterializedSeries {
        series_id,
        requested,
        created,
    })
}
