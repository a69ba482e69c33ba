//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use mood_journal_core::journal::JournalService;
use mood_journal_core::ports::{EntryRepository, PatternRepository, WeatherSource};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub journal: JournalService,
}

impl AppState {
    pub fn new(
        entries: Arc<dyn EntryRepository>,
        patterns: Arc<dyn PatternRepository>,
        weather: Arc<dyn WeatherSource>,
    ) -> Self {
        Self {
            journal: JournalService::new(entries, patterns, weather),
        }
    }
}
