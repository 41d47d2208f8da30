//! Effective weekly availability from a three-tier fallback.
//!
//! 1. The template's own schedule, if any weekday has a window. It is used
//!    verbatim for the whole week and is never merged per-day with lower tiers.
//! 2. The owning resource's default schedule, if it has any window.
//! 3. An all-day default: "00:00"-"23:59" on every weekday.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schedule::{TimeRange, WeeklyAvailability};

/// Which tier produced the effective schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilitySource {
    Template,
    ResourceDefault,
    AllDay,
}

/// The schedule used for slot generation and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAvailability {
    pub source: AvailabilitySource,
    pub weekly: WeeklyAvailability,
}

/// "00:00"-"23:59" on all seven days.
pub fn all_day_default() -> WeeklyAvailability {
    WeeklyAvailability::every_day(vec![TimeRange::all_day()])
}

/// Pick the effective schedule.
///
/// `resource_default` is only invoked when the template schedule is empty, and
/// at most once. A lookup failure is propagated unchanged.
pub fn resolve_availability<F>(
    template: &WeeklyAvailability,
    resource_default: F,
) -> Result<ResolvedAvailability>
where
    F: FnOnce() -> Result<Option<WeeklyAvailability>>,
{
    if !template.is_empty() {
        return Ok(ResolvedAvailability {
            source: AvailabilitySource::Template,
            weekly: template.clone(),
        });
    }

    if let Some(weekly) = resource_default()?.filter(|w| !w.is_empty()) {
        return Ok(ResolvedAvailability {
            source: AvailabilitySource::ResourceDefault,
            weekly,
        });
    }

    Ok(ResolvedAvailability {
        source: AvailabilitySource::AllDay,
        weekly: all_day_default(),
    })
}
