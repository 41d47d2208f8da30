//! The read path: availability → candidate slots → conflict filter → recurrence
//! counts, plus a per-day summary.
//!
//! The occupied-interval snapshot is fetched once per call, covering the visible
//! range and, when recurrence counting is enabled, the whole horizon. The current
//! time is injected, so identical inputs always give identical results.

use chrono::{DateTime, Days, NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::cadence::Cadence;
use crate::conflict::{filter_conflicts, padded_span};
use crate::dst;
use crate::error::{Result, SlotError};
use crate::policy::SlotPolicy;
use crate::recurrence::{count_recurrences, RecurrenceScan};
use crate::resolver::{resolve_availability, ResolvedAvailability};
use crate::slots::{generate_slots, CandidateSlot};
use crate::store::{OccupancyReader, ResourceRef};
use crate::summary::{summarize_days, DaySummary};

/// Which slots to compute, for whom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeSlotsQuery {
    pub resource: ResourceRef,
    /// First visible date (inclusive).
    pub from: NaiveDate,
    /// Last visible date (inclusive).
    pub to: NaiveDate,
    /// Overrides the policy timezone when set.
    #[serde(default)]
    pub timezone: Option<String>,
    /// Last date the recurrence counter scans. Defaults to
    /// `to + recurrence.horizon_days`; never earlier than `to`.
    #[serde(default)]
    pub horizon: Option<NaiveDate>,
}

/// Echo of the configuration the result was computed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    pub slot_duration_minutes: u32,
    pub buffer_minutes: u32,
    pub cadence: String,
    pub cadences: Vec<Cadence>,
    pub max_series: u32,
    pub timezone: String,
    pub availability: ResolvedAvailability,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeSlotsResult {
    pub slots: Vec<CandidateSlot>,
    pub days: Vec<DaySummary>,
    pub config: ResolvedConfig,
}

/// The last date the recurrence counter may look at for `query`.
pub fn horizon_end(query: &FreeSlotsQuery, policy: &SlotPolicy) -> NaiveDate {
    match query.horizon {
        Some(horizon) => horizon.max(query.to),
        None => query
            .to
            .checked_add_days(Days::new(u64::from(policy.recurrence.horizon_days)))
            .unwrap_or(NaiveDate::MAX),
    }
}

/// Instants whose occupied intervals can collide with a slot on the local dates
/// `[first_day, last_day]`: the whole days, widened by `buffer` on both sides.
pub fn fetch_window(
    tz: &Tz,
    first_day: NaiveDate,
    last_day: NaiveDate,
    buffer: TimeDelta,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = dst::day_start(tz, first_day).unwrap_or(DateTime::<Utc>::MIN_UTC);
    let end = last_day
        .succ_opt()
        .and_then(|next| dst::day_start(tz, next))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    padded_span(start, end, buffer)
}

/// Compute the bookable slots for `query` under `policy`.
///
/// # Errors
/// Returns `InvalidDuration`/`InvalidTime`/`InvalidDateRange` for a bad policy or
/// an inverted date range, and `Store` when a store lookup fails. Having no slot
/// at all is not an error.
pub fn compute_free_slots<R>(
    store: &R,
    query: &FreeSlotsQuery,
    policy: &SlotPolicy,
    now: DateTime<Utc>,
) -> Result<FreeSlotsResult>
where
    R: OccupancyReader + ?Sized,
{
    policy.validate()?;
    if query.to < query.from {
        return Err(SlotError::InvalidDateRange(format!(
            "{} is before {}",
            query.to, query.from
        )));
    }

    let tz = dst::timezone_or_utc(query.timezone.as_deref().unwrap_or(&policy.timezone));
    let availability = resolve_availability(&policy.availability, || {
        store.fetch_resource_default_availability(&query.resource)
    })?;
    tracing::debug!(
        resource = %query.resource.resource_id,
        source = ?availability.source,
        "resolved weekly availability"
    );

    let generated = generate_slots(&availability.weekly, policy, query.from, query.to, now, &tz);

    let horizon_end = horizon_end(query, policy);
    let last_day = if policy.recurrence.is_enabled() {
        horizon_end
    } else {
        query.to
    };
    let (fetch_from, fetch_to) = fetch_window(&tz, query.from, last_day, policy.buffer());
    let occupied = store.fetch_occupied_intervals(&query.resource, fetch_from, fetch_to)?;

    let mut slots = filter_conflicts(generated.clone(), &occupied, policy.buffer());
    tracing::debug!(
        generated = generated.len(),
        available = slots.len(),
        occupied = occupied.len(),
        "filtered conflicting slots"
    );

    let days = summarize_days(query.from, query.to, &generated, &slots);

    let scan = RecurrenceScan {
        occupied: &occupied,
        buffer: policy.buffer(),
        tz,
        horizon_end,
        max_series: policy.recurrence.max_series,
    };
    count_recurrences(&mut slots, &policy.recurrence, &scan);

    Ok(FreeSlotsResult {
        slots,
        days,
        config: ResolvedConfig {
            slot_duration_minutes: policy.slot_duration_minutes,
            buffer_minutes: policy.buffer_minutes,
            cadence: policy.recurrence.label(),
            cadences: policy.recurrence.cadences.clone(),
            max_series: policy.recurrence.max_series,
            timezone: tz.name().to_string(),
            availability,
        },
    })
}
