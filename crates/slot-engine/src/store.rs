//! Collaborator interfaces for reading and writing occupied intervals.
//!
//! The engine never persists anything itself. Callers plug a real booking store
//! in through [`OccupancyReader`] and [`OccupancyWriter`]; [`InMemoryStore`] is a
//! plain in-process implementation for tests and the JSON front-ends.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cadence::Cadence;
use crate::conflict::OccupiedInterval;
use crate::error::Result;
use crate::schedule::WeeklyAvailability;

pub type SeriesId = u64;
pub type IntervalId = u64;

/// Identifies a bookable resource within a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub resource_id: String,
    pub tenant_id: String,
}

impl ResourceRef {
    pub fn new(resource_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            tenant_id: tenant_id.into(),
        }
    }
}

/// Header written once per materialized series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesHeader {
    pub cadence: Cadence,
    /// Occurrences asked for, after clamping to the policy cap.
    pub requested: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// An interval the materializer asks the store to commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub series_id: SeriesId,
    /// 1-based position within the series.
    pub position: u32,
}

/// Read side of the booking store.
pub trait OccupancyReader {
    /// Every occupied interval of `resource` that overlaps or touches the
    /// instants `[from, to]`. Callers pass bounds already padded by any buffer.
    fn fetch_occupied_intervals(
        &self,
        resource: &ResourceRef,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<OccupiedInterval>>;

    /// The resource's own weekly schedule, if it has one.
    fn fetch_resource_default_availability(
        &self,
        resource: &ResourceRef,
    ) -> Result<Option<WeeklyAvailability>>;
}

/// Write side of the booking store.
pub trait OccupancyWriter {
    fn create_series(&mut self, resource: &ResourceRef, header: &SeriesHeader) -> Result<SeriesId>;

    fn create_occupied_interval(
        &mut self,
        resource: &ResourceRef,
        interval: &NewInterval,
    ) -> Result<IntervalId>;
}

/// A stored interval together with its series bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredInterval {
    pub id: IntervalId,
    pub resource: ResourceRef,
    pub interval: OccupiedInterval,
    pub series_id: Option<SeriesId>,
    pub position: Option<u32>,
}

/// Store that keeps everything in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    intervals: Vec<StoredInterval>,
    defaults: HashMap<ResourceRef, WeeklyAvailability>,
    series: Vec<(SeriesId, ResourceRef, SeriesHeader)>,
    next_id: u64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an existing booking that is not part of any series.
    pub fn insert(&mut self, resource: &ResourceRef, interval: OccupiedInterval) -> IntervalId {
        let id = self.allocate_id();
        self.intervals.push(StoredInterval {
            id,
            resource: resource.clone(),
            interval,
            series_id: None,
            position: None,
        });
        id
    }

    pub fn set_default_availability(&mut self, resource: &ResourceRef, weekly: WeeklyAvailability) {
        self.defaults.insert(resource.clone(), weekly);
    }

    pub fn intervals(&self) -> &[StoredInterval] {
        &self.intervals
    }

    pub fn series_header(&self, id: SeriesId) -> Option<&SeriesHeader> {
        self.series
            .iter()
            .find(|(series_id, _, _)| *series_id == id)
            .map(|(_, _, header)| header)
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl OccupancyReader for InMemoryStore {
    fn fetch_occupied_intervals(
        &self,
        resource: &ResourceRef,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<OccupiedInterval>> {
        Ok(self
            .intervals
            .iter()
            .filter(|stored| &stored.resource == resource)
            .map(|stored| stored.interval)
            .filter(|interval| interval.touches(from, to))
            .collect())
    }

    fn fetch_resource_default_availability(
        &self,
        resource: &ResourceRef,
    ) -> Result<Option<WeeklyAvailability>> {
        Ok(self.defaults.get(resource).cloned())
    }
}

impl OccupancyWriter for InMemoryStore {
    fn create_series(&mut self, resource: &ResourceRef, header: &SeriesHeader) -> Result<SeriesId> {
        let id = self.allocate_id();
        self.series.push((id, resource.clone(), header.clone()));
        Ok(id)
    }

    fn create_occupied_interval(
        &mut self,
        resource: &ResourceRef,
        interval: &NewInterval,
    ) -> Result<IntervalId> {
        let id = self.allocate_id();
        self.intervals.push(StoredInterval {
            id,
            resource: resource.clone(),
            interval: OccupiedInterval {
                start: interval.start,
                end: interval.end,
            },
            series_id: Some(interval.series_id),
            position: Some(interval.position),
        });
        Ok(id)
    }
}
