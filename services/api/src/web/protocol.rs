//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between clients and the API server.
//! Field names follow the persisted column names so external tooling sees one schema.

use chrono::{DateTime, NaiveDate, Utc};
use mood_journal_core::domain::{
    DailyEntry, HabitFlags, HabitImpact, Prediction, ScoreResult, TrendSummary,
    WeatherMoodPattern, WeatherObservation, WeatherReading, WeatherSnapshot,
};
use mood_journal_core::journal::{RecordOutcome, WeatherStatus};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

//=========================================================================================
// Requests Sent FROM the Client
//=========================================================================================

/// A daily entry as submitted by the user.
#[derive(Deserialize, Debug, ToSchema)]
pub struct EntryRequest {
    /// Defaults to today (UTC) when omitted. Ignored on `PUT /entries/{date}`.
    pub date: Option<NaiveDate>,
    /// 1 (bad) to 5 (great).
    pub mood_rating: i32,
    pub had_exercise: bool,
    pub got_enough_sleep: bool,
    pub had_social_interaction: bool,
    pub ate_healthy: bool,
    pub notes: Option<String>,
}

impl EntryRequest {
    pub fn habits(&self) -> HabitFlags {
        HabitFlags {
            had_exercise: self.had_exercise,
            got_enough_sleep: self.got_enough_sleep,
            had_social_interaction: self.had_social_interaction,
            ate_healthy: self.ate_healthy,
        }
    }
}

/// Weather values in metric units. Temperature and humidity are required for scoring.
#[derive(Deserialize, Serialize, Debug, Clone, Default, ToSchema)]
pub struct WeatherPayload {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub condition: Option<String>,
    pub precipitation: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub wind_speed: Option<f64>,
    pub air_pressure: Option<f64>,
    pub uv_index: Option<f64>,
}

impl From<WeatherPayload> for WeatherReading {
    fn from(p: WeatherPayload) -> Self {
        WeatherReading {
            temperature: p.temperature,
            humidity: p.humidity,
            condition: p.condition,
            precipitation: p.precipitation,
            cloud_cover: p.cloud_cover,
            wind_speed: p.wind_speed,
            air_pressure: p.air_pressure,
            uv_index: p.uv_index,
        }
    }
}

impl From<&WeatherObservation> for WeatherPayload {
    fn from(o: &WeatherObservation) -> Self {
        WeatherPayload {
            temperature: Some(o.temperature),
            humidity: Some(o.humidity),
            condition: Some(o.condition.clone()),
            precipitation: Some(o.precipitation),
            cloud_cover: o.cloud_cover,
            wind_speed: o.wind_speed,
            air_pressure: o.air_pressure,
            uv_index: o.uv_index,
        }
    }
}

/// Feeds one observation into the user's weather/mood patterns.
#[derive(Deserialize, Debug, ToSchema)]
pub struct PatternObservationRequest {
    pub weather: WeatherPayload,
    /// Mood impact on the 0-10 scale.
    pub mood_impact: f64,
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PatternQuery {
    /// How many patterns to return (default 10).
    pub limit: Option<usize>,
}

//=========================================================================================
// Responses Sent FROM the Server
//=========================================================================================

#[derive(Serialize, Debug, ToSchema)]
pub struct WeatherSnapshotResponse {
    pub weather: WeatherPayload,
    pub weather_mood_score: f64,
    pub weather_impact_factors: Vec<String>,
}

impl From<&WeatherSnapshot> for WeatherSnapshotResponse {
    fn from(s: &WeatherSnapshot) -> Self {
        Self {
            weather: WeatherPayload::from(&s.observation),
            weather_mood_score: s.mood_score,
            weather_impact_factors: s.impact_factors.clone(),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct EntryResponse {
    pub log_date: NaiveDate,
    pub mood_rating: i32,
    pub had_exercise: bool,
    pub got_enough_sleep: bool,
    pub had_social_interaction: bool,
    pub ate_healthy: bool,
    pub notes: Option<String>,
    pub weather: Option<WeatherSnapshotResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<&DailyEntry> for EntryResponse {
    fn from(e: &DailyEntry) -> Self {
        Self {
            log_date: e.date,
            mood_rating: e.mood_rating,
            had_exercise: e.habits.had_exercise,
            got_enough_sleep: e.habits.got_enough_sleep,
            had_social_interaction: e.habits.had_social_interaction,
            ate_healthy: e.habits.ate_healthy,
            notes: e.notes.clone(),
            weather: e.weather.as_ref().map(WeatherSnapshotResponse::from),
            created_at: e.created_at,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct PatternResponse {
    pub temperature_range: String,
    pub humidity_range: String,
    pub weather_condition: String,
    pub avg_mood_impact: f64,
    pub sample_count: i64,
    pub last_updated: DateTime<Utc>,
}

impl From<&WeatherMoodPattern> for PatternResponse {
    fn from(p: &WeatherMoodPattern) -> Self {
        Self {
            temperature_range: p.key.temperature_bucket.clone(),
            humidity_range: p.key.humidity_bucket.clone(),
            weather_condition: p.key.condition.clone(),
            avg_mood_impact: p.running_average_impact,
            sample_count: p.sample_count,
            last_updated: p.last_updated,
        }
    }
}

/// The result of recording an entry.
#[derive(Serialize, Debug, ToSchema)]
pub struct RecordEntryResponse {
    pub entry: EntryResponse,
    /// One of `attached`, `unavailable`, `invalid`.
    pub weather_status: String,
    /// Why weather is missing, when it is.
    pub weather_message: Option<String>,
    pub pattern: Option<PatternResponse>,
}

impl From<&RecordOutcome> for RecordEntryResponse {
    fn from(o: &RecordOutcome) -> Self {
        let (weather_status, weather_message) = match &o.weather_status {
            WeatherStatus::Attached => ("attached", None),
            WeatherStatus::Unavailable(reason) => ("unavailable", Some(reason.clone())),
            WeatherStatus::Invalid(reason) => ("invalid", Some(reason.clone())),
        };
        Self {
            entry: EntryResponse::from(&o.entry),
            weather_status: weather_status.to_string(),
            weather_message,
            pattern: o.pattern.as_ref().map(PatternResponse::from),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ScoreResponse {
    pub mood_score: f64,
    pub impact_factors: Vec<String>,
}

impl From<ScoreResult> for ScoreResponse {
    fn from(s: ScoreResult) -> Self {
        Self {
            mood_score: s.mood_score,
            impact_factors: s.factors,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct PredictionResponse {
    pub mood_score: f64,
    pub impact_factors: Vec<String>,
    /// One of `strong_positive`, `positive`, `mild_caution`, `negative`.
    pub tier: String,
    pub recommendation: String,
}

impl From<Prediction> for PredictionResponse {
    fn from(p: Prediction) -> Self {
        Self {
            mood_score: p.mood_score,
            impact_factors: p.factors,
            tier: p.recommendation.as_str().to_string(),
            recommendation: p.recommendation.message().to_string(),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct HabitImpactResponse {
    pub habit: String,
    pub days_with: usize,
    pub days_without: usize,
    pub average_mood_with: Option<f64>,
    pub average_mood_without: Option<f64>,
}

impl From<&HabitImpact> for HabitImpactResponse {
    fn from(h: &HabitImpact) -> Self {
        Self {
            habit: h.habit.as_str().to_string(),
            days_with: h.days_with,
            days_without: h.days_without,
            average_mood_with: h.average_mood_with,
            average_mood_without: h.average_mood_without,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct InsightsResponse {
    pub entry_count: usize,
    pub average_mood: Option<f64>,
    pub habits: Vec<HabitImpactResponse>,
    pub average_weather_score: Option<f64>,
    pub top_patterns: Vec<PatternResponse>,
}

impl From<&TrendSummary> for InsightsResponse {
    fn from(t: &TrendSummary) -> Self {
        Self {
            entry_count: t.entry_count,
            average_mood: t.average_mood,
            habits: t.habit_impacts.iter().map(HabitImpactResponse::from).collect(),
            average_weather_score: t.average_weather_score,
            top_patterns: t.top_patterns.iter().map(PatternResponse::from).collect(),
        }
    }
}
