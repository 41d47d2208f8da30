//! Per-day availability classification for calendar overviews.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::slots::CandidateSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    /// No slot left.
    None,
    /// Some slots left, but at most half of those generated.
    Partial,
    /// More than half of the generated slots are still free.
    Available,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub status: DayStatus,
    /// Slots that survived conflict filtering.
    pub available: u32,
    /// Slots generated before conflict filtering.
    pub total: u32,
}

pub fn classify(available: u32, total: u32) -> DayStatus {
    if available == 0 {
        DayStatus::None
    } else if available * 2 > total {
        DayStatus::Available
    } else {
        DayStatus::Partial
    }
}

/// Summarize every day in `[from, to]`, including days without any slot.
pub fn summarize_days(
    from: NaiveDate,
    to: NaiveDate,
    generated: &[CandidateSlot],
    available: &[CandidateSlot],
) -> Vec<DaySummary> {
    let totals = count_by_date(generated);
    let free = count_by_date(available);

    from.iter_days()
        .take_while(|d| *d <= to)
        .map(|date| {
            let total = totals.get(&date).copied().unwrap_or(0);
            let available = free.get(&date).copied().unwrap_or(0);
            DaySummary {
                date,
                status: classify(available, total),
                available,
                total,
            }
        })
        .collect()
}

fn count_by_date(slots: &[CandidateSlot]) -> BTreeMap<NaiveDate, u32> {
    let mut counts = BTreeMap::new();
    for slot in slots {
        *counts.entry(slot.date).or_insert(0) += 1;
    }
    counts
}
