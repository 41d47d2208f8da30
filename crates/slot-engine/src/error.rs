//! Error types for slot-engine operations.

use thiserror::Error;

use crate::cadence::Cadence;

/// Boxed error coming back from a store collaborator.
pub type StoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Invalid slot duration: {0} minutes (must be positive)")]
    InvalidDuration(u32),

    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("Unknown cadence: {0}")]
    UnknownCadence(String),

    #[error("Cadence '{0}' is not allowed by this policy")]
    CadenceNotAllowed(Cadence),

    #[error("Invalid occurrence count: {0}")]
    InvalidCount(u32),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Store error: {0}")]
    Store(#[source] StoreError),

    #[error("First occurrence {0} conflicts with an existing booking")]
    FirstOccurrenceConflict(String),
}

impl SlotError {
    /// Wrap a store failure so it propagates unchanged as the error source.
    pub fn store<E>(err: E) -> Self
    where
        E: Into<StoreError>,
    {
        SlotError::Store(err.into())
    }
}

pub type Result<T> = std::result::Result<T, SlotError>;
