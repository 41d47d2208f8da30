//! WASM bindings for slot-engine.
//!
//! Exposes free-slot computation, series materialization and cadence previews to
//! JavaScript via `wasm-bindgen`. Requests and results cross the boundary as JSON
//! strings, in the same shape the `slots` CLI reads and writes.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p slot-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir packages/slot-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/slot_engine_wasm.wasm
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use slot_engine::cadence::occurrences_from_local;
use slot_engine::dst;
use slot_engine::{Cadence, FreeSlotsRequest, MaterializeRequest, Occurrence};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct OccurrenceDto {
    start: String,
    end: String,
}

impl From<&Occurrence> for OccurrenceDto {
    fn from(o: &Occurrence) -> Self {
        Self {
            start: o.start.to_rfc3339(),
            end: o.end.to_rfc3339(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Compute bookable slots for a JSON free-slots request.
///
/// `now` is an optional RFC 3339 timestamp used when the request carries none;
/// it defaults to the host clock.
#[wasm_bindgen(js_name = "computeFreeSlots")]
pub fn compute_free_slots(request_json: &str, now: Option<String>) -> Result<String, JsValue> {
    let request = FreeSlotsRequest::from_json(request_json).map_err(js_error)?;
    let clock = match now {
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| JsValue::from_str(&format!("Invalid datetime '{}': {}", s, e)))?,
        None => Utc::now(),
    };
    let result = request.evaluate(clock).map_err(js_error)?;
    to_json(&result)
}

/// Materialize a recurring series for a JSON materialize request.
///
/// Throws when the very first occurrence conflicts; a shorter series is a
/// normal result.
#[wasm_bindgen(js_name = "materializeSeries")]
pub fn materialize_series(request_json: &str) -> Result<String, JsValue> {
    let request = MaterializeRequest::from_json(request_json).map_err(js_error)?;
    let series = request.evaluate().map_err(js_error)?;
    to_json(&series)
}

/// List the first `count` occurrences of a booking under `cadence`.
///
/// # Arguments
/// - `cadence` -- "none", "weekly", "monthly-date", "monthly-day" or "yearly"
/// - `start` -- Local datetime string (e.g., "2026-03-12T10:00")
/// - `duration_minutes` -- Duration of each occurrence in minutes
/// - `count` -- Number of occurrences
/// - `timezone` -- IANA timezone; unknown names fall back to UTC
#[wasm_bindgen(js_name = "nextOccurrences")]
pub fn next_occurrences(
    cadence: &str,
    start: &str,
    duration_minutes: u32,
    count: u32,
    timezone: &str,
) -> Result<String, JsValue> {
    let cadence: Cadence = cadence.parse().map_err(js_error)?;
    let tz = dst::timezone_or_utc(timezone);
    let local = dst::parse_local(start).map_err(js_error)?;

    let dtos: Vec<OccurrenceDto> = occurrences_from_local(local, duration_minutes, cadence, tz)
        .map_err(js_error)?
        .take(count as usize)
        .map(|o| OccurrenceDto::from(&o))
        .collect();
    to_json(&dtos)
}
