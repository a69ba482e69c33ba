//! crates/mood_journal_core/src/error.rs
//!
//! The error type surfaced by the journal's core operations.

use chrono::NaiveDate;

use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// A weather reading is missing a required field or carries an impossible value.
    #[error("Invalid weather observation: {0}")]
    InvalidObservation(String),

    /// User input failed validation while building an entry.
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    /// The weather provider could not deliver a reading.
    #[error("Weather data unavailable: {0}")]
    WeatherUnavailable(String),

    /// A pattern update kept losing the compare-and-swap race.
    #[error("Persistence conflict: {0}")]
    PersistenceConflict(String),

    /// An entry for this date already exists and the caller asked not to overwrite it.
    #[error("An entry for {0} already exists")]
    DuplicateEntry(NaiveDate),

    #[error("Storage error: {0}")]
    Port(PortError),
}

impl From<PortError> for JournalError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Conflict(msg) => JournalError::PersistenceConflict(msg),
            other => JournalError::Port(other),
        }
    }
}

/// A convenience type alias for `Result<T, JournalError>`.
pub type JournalResult<T> = Result<T, JournalError>;
