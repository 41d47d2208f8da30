//! # slot-engine
//!
//! Deterministic availability and recurrence computation for booking systems.
//!
//! Turns a weekly availability template, a snapshot of occupied intervals and a
//! slot policy into concrete bookable slots, tells how many future recurring
//! instances of each slot are still free, and materializes recurring series with
//! the same cadence math.
//!
//! ## Modules
//!
//! - [`schedule`] — Wall-clock time ranges and weekly availability templates
//! - [`resolver`] — Template → resource default → all-day fallback
//! - [`policy`] — Slot duration, buffers, booking window, blocked dates, recurrence
//! - [`cadence`] — Weekly / monthly / yearly stepping shared by reader and writer
//! - [`dst`] — Timezone lookup and DST gap handling
//! - [`slots`] — Tile availability windows into candidate slots
//! - [`conflict`] — Buffered overlap test against occupied intervals
//! - [`recurrence`] — Count conflict-free consecutive occurrences per slot
//! - [`series`] — Write recurring bookings up to the first conflict
//! - [`summary`] — Per-day availability classification
//! - [`store`] — Booking store interfaces and an in-memory store
//! - [`engine`] — The full free-slot pipeline
//! - [`request`] — Self-contained JSON requests
//! - [`error`] — Error types

pub mod cadence;
pub mod conflict;
pub mod dst;
pub mod engine;
pub mod error;
pub mod policy;
pub mod recurrence;
pub mod request;
pub mod resolver;
pub mod schedule;
pub mod series;
pub mod slots;
pub mod store;
pub mod summary;

pub use cadence::{occurrences, Cadence, Occurrence};
pub use conflict::OccupiedInterval;
pub use engine::{compute_free_slots, FreeSlotsQuery, FreeSlotsResult};
pub use error::SlotError;
pub use policy::{BlockedRange, RecurrencePolicy, SlotPolicy};
pub use request::{FreeSlotsRequest, MaterializeRequest};
pub use schedule::{TimeRange, WeeklyAvailability};
pub use series::{materialize_series, MaterializedSeries, SeriesRequest};
pub use slots::CandidateSlot;
pub use store::{InMemoryStore, OccupancyReader, OccupancyWriter, ResourceRef};
