//! Self-contained JSON requests.
//!
//! A request carries the policy, the occupied-interval snapshot and optionally
//! the current time, so it can be evaluated without a real booking store. The
//! CLI and the WASM bindings both go through these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::OccupiedInterval;
use crate::engine::{compute_free_slots, FreeSlotsQuery, FreeSlotsResult};
use crate::error::{Result, SlotError};
use crate::policy::SlotPolicy;
use crate::schedule::WeeklyAvailability;
use crate::series::{materialize_series, MaterializedSeries, SeriesRequest};
use crate::store::{InMemoryStore, ResourceRef};

/// Input for a free-slot computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreeSlotsRequest {
    #[serde(default)]
    pub policy: SlotPolicy,
    pub query: FreeSlotsQuery,
    /// Evaluation time. Falls back to the caller-supplied clock when absent.
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    #[serde(default)]
    pub occupied: Vec<OccupiedInterval>,
    /// The resource's own schedule, used when the policy has none.
    #[serde(default)]
    pub resource_availability: Option<WeeklyAvailability>,
}

impl FreeSlotsRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SlotError::InvalidRequest(e.to_string()))
    }

    /// Evaluate the request, using `clock` when the request carries no `now`.
    pub fn evaluate(&self, clock: DateTime<Utc>) -> Result<FreeSlotsResult> {
        let store = snapshot_store(
            &self.query.resource,
            &self.occupied,
            self.resource_availability.as_ref(),
        );
        compute_free_slots(&store, &self.query, &self.policy, self.now.unwrap_or(clock))
    }
}

/// Input for materializing a recurring series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializeRequest {
    #[serde(default)]
    pub policy: SlotPolicy,
    pub series: SeriesRequest,
    #[serde(default)]
    pub occupied: Vec<OccupiedInterval>,
}

impl MaterializeRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SlotError::InvalidRequest(e.to_string()))
    }

    pub fn evaluate(&self) -> Result<MaterializedSeries> {
        let mut store = snapshot_store(&self.series.resource, &self.occupied, None);
        materialize_series(&mut store, &self.series, &self.policy)
    }
}

fn snapshot_store(
    resource: &ResourceRef,
    occupied: &[OccupiedInterval],
    default: Option<&WeeklyAvailability>,
) -> InMemoryStore {
    let mut store = InMemoryStore::new();
    for interval in occupied {
        store.insert(resource, *interval);
    }
    if let Some(weekly) = default {
        store.set_default_availability(resource, weekly.clone());
    }
    store
}
