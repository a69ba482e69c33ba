//! crates/mood_journal_core/src/journal.rs
//!
//! Orchestrates entry capture: weather enrichment, scoring, persistence and
//! pattern learning. Collaborators are injected as trait objects.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    DailyEntry, EntryDraft, Habit, HabitImpact, Prediction, ScoreResult, TrendSummary,
    WeatherMoodPattern, WeatherObservation, WeatherReading, WeatherSnapshot,
};
use crate::error::{JournalError, JournalResult};
use crate::patterns::PatternAggregator;
use crate::ports::{EntryRepository, PatternRepository, WeatherSource};
use crate::scoring;

/// What to do when an entry for the same date already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResubmitPolicy {
    Overwrite,
    Reject,
}

/// Whether weather made it onto a recorded entry, and why not if it didn't.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherStatus {
    Attached,
    Unavailable(String),
    Invalid(String),
}

#[derive(Debug, Clone)]
pub struct RecordOutcome {
    pub entry: DailyEntry,
    pub weather_status: WeatherStatus,
    /// The bucket updated by this entry, when weather was attached.
    pub pattern: Option<WeatherMoodPattern>,
}

/// Maps a 1..=5 mood rating onto the 0..=10 scale used by patterns, so that
/// an average mood (3) lands on the neutral score (5.0).
pub fn mood_impact_from_rating(mood_rating: i32) -> f64 {
    (mood_rating - EntryDraft::MIN_MOOD) as f64 * 2.5
}

pub struct JournalService {
    entries: Arc<dyn EntryRepository>,
    weather: Arc<dyn WeatherSource>,
    aggregator: PatternAggregator,
}

impl JournalService {
    pub fn new(
        entries: Arc<dyn EntryRepository>,
        patterns: Arc<dyn PatternRepository>,
        weather: Arc<dyn WeatherSource>,
    ) -> Self {
        Self {
            entries,
            weather,
            aggregator: PatternAggregator::new(patterns),
        }
    }

    pub fn aggregator(&self) -> &PatternAggregator {
        &self.aggregator
    }

    /// Records one day's entry.
    ///
    /// Weather is best effort: if it cannot be fetched or is malformed the
    /// entry is still saved, without a snapshot, and no pattern is updated.
    pub async fn record_entry(
        &self,
        user_id: Uuid,
        draft: EntryDraft,
        policy: ResubmitPolicy,
    ) -> JournalResult<RecordOutcome> {
        // Fast path only; the insert below is what enforces one entry per day.
        if policy == ResubmitPolicy::Reject
            && self.entries.find_entry(user_id, draft.date).await?.is_some()
        {
            return Err(JournalError::DuplicateEntry(draft.date));
        }

        let (observation, weather_status) = match self.current_observation().await {
            Ok(obs) => (Some(obs), WeatherStatus::Attached),
            Err(JournalError::WeatherUnavailable(reason)) => {
                warn!(%user_id, %reason, "Saving entry without weather data");
                (None, WeatherStatus::Unavailable(reason))
            }
            Err(JournalError::InvalidObservation(reason)) => {
                error!(%user_id, %reason, "Weather provider returned an unusable reading");
                (None, WeatherStatus::Invalid(reason))
            }
            Err(e) => return Err(e),
        };

        let snapshot = observation.as_ref().map(|obs| {
            let ScoreResult {
                mood_score,
                factors,
            } = scoring::score(obs);
            WeatherSnapshot {
                observation: obs.clone(),
                mood_score,
                impact_factors: factors,
            }
        });

        let entry = DailyEntry::from_draft(user_id, draft, snapshot, Utc::now());
        match policy {
            ResubmitPolicy::Overwrite => self.entries.save_entry(&entry).await?,
            ResubmitPolicy::Reject => {
                if !self.entries.insert_entry(&entry).await? {
                    return Err(JournalError::DuplicateEntry(entry.date));
                }
            }
        }
        info!(%user_id, date = %entry.date, mood = entry.mood_rating, "Entry saved");

        let pattern = match &observation {
            Some(obs) => Some(
                self.aggregator
                    .update(user_id, obs, mood_impact_from_rating(entry.mood_rating))
                    .await?,
            ),
            None => None,
        };

        Ok(RecordOutcome {
            entry,
            weather_status,
            pattern,
        })
    }

    /// A user's entries, most recent first.
    pub async fn entries(&self, user_id: Uuid) -> JournalResult<Vec<DailyEntry>> {
        Ok(self.entries.load_entries(user_id).await?)
    }

    /// Validates a raw reading and scores it.
    pub fn score_reading(&self, reading: WeatherReading) -> JournalResult<ScoreResult> {
        let obs = WeatherObservation::try_from(reading)?;
        Ok(scoring::score(&obs))
    }

    pub async fn update_pattern(
        &self,
        user_id: Uuid,
        reading: WeatherReading,
        mood_impact: f64,
    ) -> JournalResult<WeatherMoodPattern> {
        let obs = WeatherObservation::try_from(reading)?;
        self.aggregator.update(user_id, &obs, mood_impact).await
    }

    pub async fn top_patterns(
        &self,
        user_id: Uuid,
        n: usize,
    ) -> JournalResult<Vec<WeatherMoodPattern>> {
        self.aggregator.top_patterns(user_id, n).await
    }

    /// Predicts today's weather impact from current conditions and the user's
    /// learned patterns, most-sampled first.
    pub async fn predict_current(&self, user_id: Uuid) -> JournalResult<Prediction> {
        let obs = self.current_observation().await?;
        let patterns = self.aggregator.patterns_for(user_id).await?;
        Ok(scoring::predict(&obs, &patterns))
    }

    pub async fn trends(&self, user_id: Uuid, top_n: usize) -> JournalResult<TrendSummary> {
        let entries = self.entries.load_entries(user_id).await?;
        let top_patterns = self.aggregator.top_patterns(user_id, top_n).await?;
        Ok(summarize(&entries, top_patterns))
    }

    async fn current_observation(&self) -> JournalResult<WeatherObservation> {
        let reading = self
            .weather
            .fetch_current()
            .await
            .map_err(|e| JournalError::WeatherUnavailable(e.to_string()))?;
        WeatherObservation::try_from(reading)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn summarize(entries: &[DailyEntry], top_patterns: Vec<WeatherMoodPattern>) -> TrendSummary {
    let habit_impacts = Habit::ALL
        .iter()
        .map(|&habit| {
            let (with, without): (Vec<&DailyEntry>, Vec<&DailyEntry>) =
                entries.iter().partition(|e| e.habits.get(habit));
            HabitImpact {
                habit,
                days_with: with.len(),
                days_without: without.len(),
                average_mood_with: mean(with.iter().map(|e| e.mood_rating as f64)),
                average_mood_without: mean(without.iter().map(|e| e.mood_rating as f64)),
            }
        })
        .collect();

    TrendSummary {
        entry_count: entries.len(),
        average_mood: mean(entries.iter().map(|e| e.mood_rating as f64)),
        habit_impacts,
        average_weather_score: mean(
            entries
                .iter()
                .filter_map(|e| e.weather.as_ref().map(|w| w.mood_score)),
        ),
        top_patterns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HabitFlags;
    use crate::memory::InMemoryStore;
    use crate::ports::{PortError, PortResult};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct FixedWeather(WeatherReading);

    #[async_trait]
    impl WeatherSource for FixedWeather {
        async fn fetch_current(&self) -> PortResult<WeatherReading> {
            Ok(self.0.clone())
        }
    }

    struct NoWeather;

    #[async_trait]
    impl WeatherSource for NoWeather {
        async fn fetch_current(&self) -> PortResult<WeatherReading> {
            Err(PortError::Unavailable("connection refused".into()))
        }
    }

    /// Yields once before answering, so concurrent captures interleave.
    struct SlowWeather;

    #[async_trait]
    impl WeatherSource for SlowWeather {
        async fn fetch_current(&self) -> PortResult<WeatherReading> {
            tokio::task::yield_now().await;
            Ok(clear_day())
        }
    }

    fn clear_day() -> WeatherReading {
        WeatherReading {
            temperature: Some(20.0),
            humidity: Some(50.0),
            condition: Some("Clear".into()),
            wind_speed: Some(3.0),
            air_pressure: Some(1015.0),
            ..Default::default()
        }
    }

    fn service(weather: impl WeatherSource + 'static) -> (JournalService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let svc = JournalService::new(store.clone(), store.clone(), Arc::new(weather));
        (svc, store)
    }

    fn draft(day: u32, mood: i32, habits: HabitFlags) -> EntryDraft {
        let date = NaiveDate::from_ymd_opt(2024, 6, day).unwrap();
        EntryDraft::new(date, mood, habits, Some("walked the dog".into())).unwrap()
    }

    #[tokio::test]
    async fn records_entry_with_weather_and_pattern() {
        let (svc, store) = service(FixedWeather(clear_day()));
        let user = Uuid::new_v4();

        let outcome = svc
            .record_entry(user, draft(1, 5, HabitFlags::default()), ResubmitPolicy::Reject)
            .await
            .unwrap();

        assert_eq!(outcome.weather_status, WeatherStatus::Attached);
        let snapshot = outcome.entry.weather.as_ref().unwrap();
        assert_eq!(snapshot.mood_score, 9.3);
        assert_eq!(snapshot.impact_factors.len(), 4);

        let pattern = outcome.pattern.unwrap();
        assert_eq!(pattern.key.temperature_bucket, "20-25");
        assert_eq!(pattern.key.humidity_bucket, "50-60");
        assert_eq!(pattern.running_average_impact, 10.0);

        assert_eq!(store.load_entries(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_duplicate_posts_store_one_entry() {
        let (svc, store) = service(SlowWeather);
        let user = Uuid::new_v4();

        let (first, second) = tokio::join!(
            svc.record_entry(user, draft(1, 1, HabitFlags::default()), ResubmitPolicy::Reject),
            svc.record_entry(user, draft(1, 5, HabitFlags::default()), ResubmitPolicy::Reject),
        );

        let (kept, rejected) = match (first, second) {
            (Ok(kept), Err(rejected)) | (Err(rejected), Ok(kept)) => (kept, rejected),
            (a, b) => panic!("expected exactly one success, got {:?} and {:?}", a, b),
        };
        assert!(matches!(rejected, JournalError::DuplicateEntry(_)));

        let entries = store.load_entries(user).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mood_rating, kept.entry.mood_rating);

        let patterns = svc.aggregator().patterns_for(user).await.unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].sample_count, 1);
    }

    #[tokio::test]
    async fn weather_failure_still_saves_entry() {
        let (svc, store) = service(NoWeather);
        let user = Uuid::new_v4();

        let outcome = svc
            .record_entry(user, draft(2, 3, HabitFlags::default()), ResubmitPolicy::Reject)
            .await
            .unwrap();

        assert!(matches!(outcome.weather_status, WeatherStatus::Unavailable(_)));
        assert!(outcome.entry.weather.is_none());
        assert!(outcome.pattern.is_none());
        assert_eq!(store.load_entries(user).await.unwrap().len(), 1);
        assert!(store.load_patterns(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_weather_still_saves_entry() {
        let (svc, store) = service(FixedWeather(WeatherReading {
            humidity: None,
            ..clear_day()
        }));
        let user = Uuid::new_v4();

        let outcome = svc
            .record_entry(user, draft(2, 3, HabitFlags::default()), ResubmitPolicy::Reject)
            .await
            .unwrap();

        assert!(matches!(outcome.weather_status, WeatherStatus::Invalid(_)));
        assert!(outcome.entry.weather.is_none());
        assert!(store.load_patterns(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reject_policy_blocks_second_entry_for_same_day() {
        let (svc, _) = service(NoWeather);
        let user = Uuid::new_v4();

        svc.record_entry(user, draft(3, 2, HabitFlags::default()), ResubmitPolicy::Reject)
            .await
            .unwrap();
        let err = svc
            .record_entry(user, draft(3, 4, HabitFlags::default()), ResubmitPolicy::Reject)
            .await
            .unwrap_err();
        assert!(matches!(err, JournalError::DuplicateEntry(d) if d == NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()));
    }

    #[tokio::test]
    async fn overwrite_policy_replaces_entry() {
        let (svc, _) = service(NoWeather);
        let user = Uuid::new_v4();

        svc.record_entry(user, draft(3, 2, HabitFlags::default()), ResubmitPolicy::Overwrite)
            .await
            .unwrap();
        svc.record_entry(user, draft(3, 4, HabitFlags::default()), ResubmitPolicy::Overwrite)
            .await
            .unwrap();

        let entries = svc.entries(user).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mood_rating, 4);
    }

    #[test]
    fn score_reading_fails_fast_on_missing_temperature() {
        let (svc, _) = service(NoWeather);
        let err = svc
            .score_reading(WeatherReading {
                temperature: None,
                ..clear_day()
            })
            .unwrap_err();
        assert!(matches!(err, JournalError::InvalidObservation(_)));

        assert_eq!(svc.score_reading(clear_day()).unwrap().mood_score, 9.3);
    }

    #[tokio::test]
    async fn prediction_requires_weather() {
        let (svc, _) = service(NoWeather);
        let err = svc.predict_current(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, JournalError::WeatherUnavailable(_)));
    }

    #[tokio::test]
    async fn prediction_uses_learned_patterns() {
        let (svc, _) = service(FixedWeather(clear_day()));
        let user = Uuid::new_v4();

        let baseline = svc.predict_current(user).await.unwrap();
        assert_eq!(baseline.mood_score, 9.3);

        // A user who is consistently miserable on clear days.
        svc.update_pattern(user, clear_day(), 0.0).await.unwrap();
        let personal = svc.predict_current(user).await.unwrap();
        assert_eq!(personal.mood_score, 7.8);
        assert_eq!(personal.factors.len(), 5);
    }

    #[test]
    fn mood_rating_maps_onto_impact_scale() {
        assert_eq!(mood_impact_from_rating(1), 0.0);
        assert_eq!(mood_impact_from_rating(3), 5.0);
        assert_eq!(mood_impact_from_rating(5), 10.0);
    }

    #[tokio::test]
    async fn trends_split_mood_by_habit() {
        let (svc, _) = service(FixedWeather(clear_day()));
        let user = Uuid::new_v4();
        let exercised = HabitFlags {
            had_exercise: true,
            ..HabitFlags::default()
        };

        svc.record_entry(user, draft(1, 5, exercised), ResubmitPolicy::Reject)
            .await
            .unwrap();
        svc.record_entry(user, draft(2, 4, exercised), ResubmitPolicy::Reject)
            .await
            .unwrap();
        svc.record_entry(user, draft(3, 1, HabitFlags::default()), ResubmitPolicy::Reject)
            .await
            .unwrap();

        let trends = svc.trends(user, 5).await.unwrap();
        assert_eq!(trends.entry_count, 3);
        assert!((trends.average_mood.unwrap() - 10.0 / 3.0).abs() < 1e-9);
        let weather_score = trends.average_weather_score.unwrap();
        assert!((weather_score - 9.3).abs() < 1e-9);

        let exercise = &trends.habit_impacts[0];
        assert_eq!(exercise.habit, Habit::Exercise);
        assert_eq!(exercise.days_with, 2);
        assert_eq!(exercise.average_mood_with, Some(4.5));
        assert_eq!(exercise.average_mood_without, Some(1.0));

        let sleep = &trends.habit_impacts[1];
        assert_eq!(sleep.days_with, 0);
        assert_eq!(sleep.average_mood_with, None);

        assert_eq!(trends.top_patterns.len(), 1);
        assert_eq!(trends.top_patterns[0].sample_count, 3);
    }

    #[tokio::test]
    async fn trends_for_empty_journal() {
        let (svc, _) = service(NoWeather);
        let trends = svc.trends(Uuid::new_v4(), 5).await.unwrap();
        assert_eq!(trends.entry_count, 0);
        assert_eq!(trends.average_mood, None);
        assert_eq!(trends.average_weather_score, None);
        assert!(trends.top_patterns.is_empty());
    }
}
