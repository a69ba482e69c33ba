//! crates/mood_journal_core/src/patterns.rs
//!
//! Incremental per-user weather/mood statistics.
//!
//! Observations are bucketed by temperature (5°C wide), humidity (10% wide) and
//! the raw condition label. Each bucket keeps an exact running mean of the mood
//! impact routed into it, updated from (average, count) alone.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{PatternKey, WeatherMoodPattern, WeatherObservation};
use crate::error::{JournalError, JournalResult};
use crate::ports::{PatternRepository, PortError};

const TEMPERATURE_BUCKET_WIDTH: f64 = 5.0;
const HUMIDITY_BUCKET_WIDTH: f64 = 10.0;
const DEFAULT_MAX_ATTEMPTS: usize = 5;

fn bucket(value: f64, width: f64) -> String {
    let low = (value / width).floor() * width;
    format!("{}-{}", low as i64, (low + width) as i64)
}

/// `floor(t / 5) * 5` to `+5`, e.g. 24.9 -> "20-25", 25.0 -> "25-30".
pub fn temperature_bucket(temperature: f64) -> String {
    bucket(temperature, TEMPERATURE_BUCKET_WIDTH)
}

pub fn humidity_bucket(humidity: f64) -> String {
    bucket(humidity, HUMIDITY_BUCKET_WIDTH)
}

/// The condition label is used verbatim, so "Rain" and "rain" are separate buckets.
pub fn bucket_key(user_id: Uuid, obs: &WeatherObservation) -> PatternKey {
    PatternKey {
        user_id,
        temperature_bucket: temperature_bucket(obs.temperature),
        humidity_bucket: humidity_bucket(obs.humidity),
        condition: obs.condition.clone(),
    }
}

/// Folds one more sample into an arithmetic mean.
pub fn running_average(average: f64, count: i64, sample: f64) -> (f64, i64) {
    let new_count = count + 1;
    let new_average = (average * count as f64 + sample) / new_count as f64;
    (new_average, new_count)
}

//=========================================================================================
// The Aggregator
//=========================================================================================

/// Maintains `WeatherMoodPattern` records through a `PatternRepository`.
///
/// Updates to the same bucket are serialized by an in-process lock per key, and
/// every write is a compare-and-swap so that other processes sharing the same
/// store cannot cause lost updates either. A lost race is retried.
pub struct PatternAggregator {
    repo: Arc<dyn PatternRepository>,
    locks: DashMap<PatternKey, Arc<Mutex<()>>>,
    max_attempts: usize,
}

/// Holds one bucket's lock. On drop the registry entry is removed again
/// unless another task is still waiting on it.
struct BucketLock<'a> {
    locks: &'a DashMap<PatternKey, Arc<Mutex<()>>>,
    key: PatternKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for BucketLock<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl PatternAggregator {
    pub fn new(repo: Arc<dyn PatternRepository>) -> Self {
        Self {
            repo,
            locks: DashMap::new(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    async fn lock_bucket(&self, key: &PatternKey) -> BucketLock<'_> {
        let mut bucket = BucketLock {
            locks: &self.locks,
            key: key.clone(),
            guard: None,
        };
        let lock = self.locks.entry(key.clone()).or_default().clone();
        bucket.guard = Some(lock.lock_owned().await);
        bucket
    }

    /// Routes one (observation, mood impact) sample into its bucket and returns
    /// the bucket's new state.
    pub async fn update(
        &self,
        user_id: Uuid,
        obs: &WeatherObservation,
        mood_impact: f64,
    ) -> JournalResult<WeatherMoodPattern> {
        if !mood_impact.is_finite() {
            return Err(JournalError::InvalidObservation(format!(
                "mood impact must be a finite number, got {}",
                mood_impact
            )));
        }

        let key = bucket_key(user_id, obs);
        let _bucket = self.lock_bucket(&key).await;

        for attempt in 1..=self.max_attempts {
            let existing = self.repo.find_pattern(&key).await?;
            let (average, count, expected) = match &existing {
                Some(p) => {
                    let (avg, count) =
                        running_average(p.running_average_impact, p.sample_count, mood_impact);
                    (avg, count, Some(p.sample_count))
                }
                None => (mood_impact, 1, None),
            };

            match self
                .repo
                .upsert_pattern(&key, average, count, expected)
                .await
            {
                Ok(()) => {
                    debug!(
                        %user_id,
                        temperature = %key.temperature_bucket,
                        humidity = %key.humidity_bucket,
                        condition = %key.condition,
                        average,
                        count,
                        "Pattern updated"
                    );
                    return Ok(WeatherMoodPattern {
                        key,
                        running_average_impact: average,
                        sample_count: count,
                        last_updated: Utc::now(),
                    });
                }
                Err(PortError::Conflict(reason)) => {
                    debug!(%user_id, attempt, %reason, "Pattern write lost a race, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(%user_id, attempts = self.max_attempts, "Giving up on pattern update");
        Err(JournalError::PersistenceConflict(format!(
            "bucket {}/{}/{} kept changing after {} attempts",
            key.temperature_bucket, key.humidity_bucket, key.condition, self.max_attempts
        )))
    }

    /// All of a user's patterns, highest sample count first.
    pub async fn patterns_for(&self, user_id: Uuid) -> JournalResult<Vec<WeatherMoodPattern>> {
        Ok(self.repo.load_patterns(user_id).await?)
    }

    pub async fn top_patterns(
        &self,
        user_id: Uuid,
        n: usize,
    ) -> JournalResult<Vec<WeatherMoodPattern>> {
        let mut patterns = self.patterns_for(user_id).await?;
        patterns.truncate(n);
        Ok(patterns)
    }
}
