//! crates/mood_journal_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core depends on.
//! Storage and weather retrieval sit behind these traits so the core never
//! knows whether it is talking to Postgres, an in-memory map or a real API.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{DailyEntry, PatternKey, WeatherMoodPattern, WeatherReading};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A compare-and-swap write found a different value than expected.
    #[error("Write conflict: {0}")]
    Conflict(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Inserts the entry, replacing any existing entry for the same (user, date).
    async fn save_entry(&self, entry: &DailyEntry) -> PortResult<()>;

    /// Inserts the entry only if the (user, date) slot is empty, atomically.
    /// Returns `false`, writing nothing, when an entry already exists.
    async fn insert_entry(&self, entry: &DailyEntry) -> PortResult<bool>;

    async fn find_entry(&self, user_id: Uuid, date: NaiveDate) -> PortResult<Option<DailyEntry>>;

    /// All entries for a user, most recent date first.
    async fn load_entries(&self, user_id: Uuid) -> PortResult<Vec<DailyEntry>>;
}

#[async_trait]
pub trait PatternRepository: Send + Sync {
    async fn find_pattern(&self, key: &PatternKey) -> PortResult<Option<WeatherMoodPattern>>;

    /// Writes new bucket statistics with compare-and-swap semantics.
    ///
    /// `expected_count` is the sample count the caller read before computing
    /// `average`/`count`; `None` means the bucket must not exist yet. When the
    /// stored state differs, nothing is written and `PortError::Conflict` is returned.
    async fn upsert_pattern(
        &self,
        key: &PatternKey,
        average: f64,
        count: i64,
        expected_count: Option<i64>,
    ) -> PortResult<()>;

    /// All patterns for a user, highest sample count first.
    async fn load_patterns(&self, user_id: Uuid) -> PortResult<Vec<WeatherMoodPattern>>;
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetches the current conditions at the configured location.
    async fn fetch_current(&self) -> PortResult<WeatherReading>;
}
