//! crates/mood_journal_core/src/domain.rs
//!
//! Defines the pure, core data structures for the journal.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::JournalError;

//=========================================================================================
// Daily Entries
//=========================================================================================

/// The four yes/no habits a user answers every day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HabitFlags {
    pub had_exercise: bool,
    pub got_enough_sleep: bool,
    pub had_social_interaction: bool,
    pub ate_healthy: bool,
}

impl HabitFlags {
    pub fn get(&self, habit: Habit) -> bool {
        match habit {
            Habit::Exercise => self.had_exercise,
            Habit::Sleep => self.got_enough_sleep,
            Habit::Social => self.had_social_interaction,
            Habit::HealthyEating => self.ate_healthy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Habit {
    Exercise,
    Sleep,
    Social,
    HealthyEating,
}

impl Habit {
    pub const ALL: [Habit; 4] = [
        Habit::Exercise,
        Habit::Sleep,
        Habit::Social,
        Habit::HealthyEating,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Habit::Exercise => "exercise",
            Habit::Sleep => "sleep",
            Habit::Social => "social_interaction",
            Habit::HealthyEating => "healthy_eating",
        }
    }
}

/// A validated, not-yet-persisted daily entry.
///
/// This is the single place where raw user input becomes a typed entry; every
/// layer after it works with checked values.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub date: NaiveDate,
    pub mood_rating: i32,
    pub habits: HabitFlags,
    pub notes: Option<String>,
}

impl EntryDraft {
    pub const MIN_MOOD: i32 = 1;
    pub const MAX_MOOD: i32 = 5;

    pub fn new(
        date: NaiveDate,
        mood_rating: i32,
        habits: HabitFlags,
        notes: Option<String>,
    ) -> Result<Self, JournalError> {
        if !(Self::MIN_MOOD..=Self::MAX_MOOD).contains(&mood_rating) {
            return Err(JournalError::InvalidEntry(format!(
                "mood rating must be between {} and {}, got {}",
                Self::MIN_MOOD,
                Self::MAX_MOOD,
                mood_rating
            )));
        }

        // Blank notes are stored as "no notes".
        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(Self {
            date,
            mood_rating,
            habits,
            notes,
        })
    }
}

/// One user's self-report for one day. At most one exists per (user, date).
#[derive(Debug, Clone, PartialEq)]
pub struct DailyEntry {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub mood_rating: i32,
    pub habits: HabitFlags,
    pub notes: Option<String>,
    pub weather: Option<WeatherSnapshot>,
    pub created_at: DateTime<Utc>,
}

impl DailyEntry {
    pub fn from_draft(
        user_id: Uuid,
        draft: EntryDraft,
        weather: Option<WeatherSnapshot>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            date: draft.date,
            mood_rating: draft.mood_rating,
            habits: draft.habits,
            notes: draft.notes,
            weather,
            created_at,
        }
    }
}

//=========================================================================================
// Weather
//=========================================================================================

/// The condition label used when a provider does not report one.
pub const UNKNOWN_CONDITION: &str = "unknown";

/// A weather reading exactly as a provider handed it over. Every field may be
/// missing; `WeatherObservation::try_from` decides what is acceptable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherReading {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub condition: Option<String>,
    pub precipitation: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub wind_speed: Option<f64>,
    pub air_pressure: Option<f64>,
    pub uv_index: Option<f64>,
}

/// A validated weather snapshot. Temperature is in °C, humidity and cloud
/// cover are percentages, precipitation is in mm, wind in m/s, pressure in hPa.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherObservation {
    pub temperature: f64,
    pub humidity: f64,
    pub condition: String,
    pub precipitation: f64,
    pub cloud_cover: Option<f64>,
    pub wind_speed: Option<f64>,
    pub air_pressure: Option<f64>,
    pub uv_index: Option<f64>,
}

impl WeatherObservation {
    /// Builds an observation with only the required fields set.
    pub fn new(temperature: f64, humidity: f64, condition: impl Into<String>) -> Self {
        Self {
            temperature,
            humidity,
            condition: condition.into(),
            precipitation: 0.0,
            cloud_cover: None,
            wind_speed: None,
            air_pressure: None,
            uv_index: None,
        }
    }
}

impl TryFrom<WeatherReading> for WeatherObservation {
    type Error = JournalError;

    fn try_from(reading: WeatherReading) -> Result<Self, Self::Error> {
        let temperature = reading
            .temperature
            .ok_or_else(|| JournalError::InvalidObservation("temperature is missing".into()))?;
        if !temperature.is_finite() {
            return Err(JournalError::InvalidObservation(format!(
                "temperature is not a finite number: {}",
                temperature
            )));
        }

        let humidity = reading
            .humidity
            .ok_or_else(|| JournalError::InvalidObservation("humidity is missing".into()))?;
        if !(0.0..=100.0).contains(&humidity) {
            return Err(JournalError::InvalidObservation(format!(
                "humidity must be between 0 and 100, got {}",
                humidity
            )));
        }

        if let Some(cover) = reading.cloud_cover {
            if !(0.0..=100.0).contains(&cover) {
                return Err(JournalError::InvalidObservation(format!(
                    "cloud cover must be between 0 and 100, got {}",
                    cover
                )));
            }
        }

        let condition = reading
            .condition
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| UNKNOWN_CONDITION.to_string());

        Ok(Self {
            temperature,
            humidity,
            condition,
            precipitation: reading.precipitation.unwrap_or(0.0),
            cloud_cover: reading.cloud_cover,
            wind_speed: reading.wind_speed.filter(|w| w.is_finite()),
            air_pressure: reading.air_pressure.filter(|p| p.is_finite()),
            uv_index: reading.uv_index.filter(|u| u.is_finite()),
        })
    }
}

/// The outcome of scoring one observation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    /// Weather impact score in [0, 10], rounded to one decimal.
    pub mood_score: f64,
    /// One human-readable string per rule that fired, in evaluation order.
    pub factors: Vec<String>,
}

/// The weather attached to a stored entry, together with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub observation: WeatherObservation,
    pub mood_score: f64,
    pub impact_factors: Vec<String>,
}

//=========================================================================================
// Learned Patterns
//=========================================================================================

/// Identifies one aggregation bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternKey {
    pub user_id: Uuid,
    /// e.g. "20-25"
    pub temperature_bucket: String,
    /// e.g. "40-50"
    pub humidity_bucket: String,
    /// The raw condition label, case preserved.
    pub condition: String,
}

/// Running statistics for a single bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherMoodPattern {
    pub key: PatternKey,
    pub running_average_impact: f64,
    pub sample_count: i64,
    pub last_updated: DateTime<Utc>,
}

//=========================================================================================
// Predictions and Trends
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    StrongPositive,
    Positive,
    MildCaution,
    Negative,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::StrongPositive => "strong_positive",
            Recommendation::Positive => "positive",
            Recommendation::MildCaution => "mild_caution",
            Recommendation::Negative => "negative",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::StrongPositive => {
                "Perfect weather for outdoor activities! Consider exercising outside."
            }
            Recommendation::Positive => {
                "Good weather conditions. Great day for a walk or outdoor time."
            }
            Recommendation::MildCaution => {
                "Weather might affect your mood slightly. Consider indoor activities."
            }
            Recommendation::Negative => {
                "Weather conditions may negatively impact mood. Focus on indoor comfort and self-care."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub mood_score: f64,
    pub factors: Vec<String>,
    pub recommendation: Recommendation,
}

/// Average mood on days with and without one habit.
#[derive(Debug, Clone, PartialEq)]
pub struct HabitImpact {
    pub habit: Habit,
    pub days_with: usize,
    pub days_without: usize,
    pub average_mood_with: Option<f64>,
    pub average_mood_without: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendSummary {
    pub entry_count: usize,
    pub average_mood: Option<f64>,
    pub habit_impacts: Vec<HabitImpact>,
    pub average_weather_score: Option<f64>,
    pub top_patterns: Vec<WeatherMoodPattern>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> WeatherReading {
        WeatherReading {
            temperature: Some(21.0),
            humidity: Some(55.0),
            condition: Some("Clouds".into()),
            ..Default::default()
        }
    }

    #[test]
    fn observation_requires_temperature() {
        let err = WeatherObservation::try_from(WeatherReading {
            temperature: None,
            ..reading()
        })
        .unwrap_err();
        assert!(matches!(err, JournalError::InvalidObservation(ref m) if m.contains("temperature")));
    }

    #[test]
    fn observation_requires_humidity_in_range() {
        let missing = WeatherObservation::try_from(WeatherReading {
            humidity: None,
            ..reading()
        });
        assert!(matches!(missing, Err(JournalError::InvalidObservation(_))));

        let too_high = WeatherObservation::try_from(WeatherReading {
            humidity: Some(140.0),
            ..reading()
        });
        assert!(matches!(too_high, Err(JournalError::InvalidObservation(_))));
    }

    #[test]
    fn observation_defaults_optional_fields() {
        let obs = WeatherObservation::try_from(WeatherReading {
            condition: Some("   ".into()),
            ..reading()
        })
        .unwrap();
        assert_eq!(obs.condition, UNKNOWN_CONDITION);
        assert_eq!(obs.precipitation, 0.0);
        assert_eq!(obs.air_pressure, None);
    }

    #[test]
    fn observation_keeps_condition_case() {
        let obs = WeatherObservation::try_from(reading()).unwrap();
        assert_eq!(obs.condition, "Clouds");
    }

    #[test]
    fn draft_rejects_out_of_range_mood() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        for mood in [0, 6, -1] {
            let err = EntryDraft::new(date, mood, HabitFlags::default(), None).unwrap_err();
            assert!(matches!(err, JournalError::InvalidEntry(_)));
        }
        assert!(EntryDraft::new(date, 1, HabitFlags::default(), None).is_ok());
        assert!(EntryDraft::new(date, 5, HabitFlags::default(), None).is_ok());
    }

    #[test]
    fn draft_drops_blank_notes() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let draft = EntryDraft::new(date, 3, HabitFlags::default(), Some("  \n".into())).unwrap();
        assert_eq!(draft.notes, None);

        let draft =
            EntryDraft::new(date, 3, HabitFlags::default(), Some(" ran 5k ".into())).unwrap();
        assert_eq!(draft.notes.as_deref(), Some("ran 5k"));
    }
}
