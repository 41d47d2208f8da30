//! Mapping wall-clock times in a resource timezone onto absolute instants.

use chrono::{
    DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::error::{Result, SlotError};

/// How far back to look for the offset in effect before a DST gap.
const GAP_PROBE_HOURS: i64 = 3;

/// Policy for wall-clock times that fall during DST transitions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DstPolicy {
    /// Drop times that fall in the DST gap (e.g., 02:30 during spring forward)
    #[default]
    Skip,
    /// Move times in the gap forward by the length of the gap
    ShiftForward,
}

/// Parse an IANA timezone name, falling back to UTC for anything unrecognized.
pub fn timezone_or_utc(name: &str) -> Tz {
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            tracing::debug!(timezone = name, "unrecognized timezone, using UTC");
            Tz::UTC
        }
    }
}

/// Resolve a local wall-clock time in `tz` to UTC.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant. Times in a
/// DST gap are handled according to `policy`.
pub fn localize(tz: &Tz, local: NaiveDateTime, policy: DstPolicy) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => match policy {
            DstPolicy::Skip => None,
            DstPolicy::ShiftForward => {
                let probe = local.checked_sub_signed(TimeDelta::hours(GAP_PROBE_HOURS))?;
                let before = tz.from_local_datetime(&probe).earliest()?;
                let offset = before.offset().fix().local_minus_utc();
                let utc = local.checked_sub_signed(TimeDelta::seconds(i64::from(offset)))?;
                Some(Utc.from_utc_datetime(&utc))
            }
        },
    }
}

/// The first instant of the local calendar day `date` in `tz`.
///
/// A midnight that falls in a DST gap moves forward to the end of the gap.
pub fn day_start(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    localize(tz, date.and_time(NaiveTime::MIN), DstPolicy::ShiftForward)
}

/// Parse a local wall-clock datetime, "2026-03-12T10:00" or "2026-03-12T10:00:00".
pub fn parse_local(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map_err(|_| SlotError::InvalidTime(s.to_string()))
}
