pub mod domain;
pub mod error;
pub mod journal;
pub mod memory;
pub mod patterns;
pub mod ports;
pub mod scoring;

pub use domain::{
    DailyEntry, EntryDraft, Habit, HabitFlags, HabitImpact, PatternKey, Prediction,
    Recommendation, ScoreResult, TrendSummary, WeatherMoodPattern, WeatherObservation,
    WeatherReading, WeatherSnapshot,
};
pub use error::{JournalError, JournalResult};
pub use journal::{JournalService, RecordOutcome, ResubmitPolicy, WeatherStatus};
pub use memory::InMemoryStore;
pub use patterns::PatternAggregator;
pub use ports::{EntryRepository, PatternRepository, PortError, PortResult, WeatherSource};
pub use scoring::{predict, score};
