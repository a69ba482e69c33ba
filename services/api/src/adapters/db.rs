//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `EntryRepository` and `PatternRepository` ports from the `core` crate.
//! It handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mood_journal_core::domain::{
    DailyEntry, HabitFlags, PatternKey, WeatherMoodPattern, WeatherObservation, WeatherSnapshot,
    UNKNOWN_CONDITION,
};
use mood_journal_core::ports::{EntryRepository, PatternRepository, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements both storage ports.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const ENTRY_COLUMNS: &str = "user_id, log_date, mood_rating, had_exercise, got_enough_sleep, \
     had_social_interaction, ate_healthy, notes, temperature, humidity, weather_condition, \
     precipitation, cloud_cover, wind_speed, air_pressure, uv_index, weather_mood_score, \
     weather_impact_factors, created_at";

#[derive(FromRow)]
struct EntryRecord {
    user_id: Uuid,
    log_date: NaiveDate,
    mood_rating: i32,
    had_exercise: bool,
    got_enough_sleep: bool,
    had_social_interaction: bool,
    ate_healthy: bool,
    notes: Option<String>,
    temperature: Option<f64>,
    humidity: Option<f64>,
    weather_condition: Option<String>,
    precipitation: Option<f64>,
    cloud_cover: Option<f64>,
    wind_speed: Option<f64>,
    air_pressure: Option<f64>,
    uv_index: Option<f64>,
    weather_mood_score: Option<f64>,
    weather_impact_factors: Option<Vec<String>>,
    created_at: DateTime<Utc>,
}
impl EntryRecord {
    fn to_domain(self) -> DailyEntry {
        // A row only carries a snapshot when the required weather fields and the score were written.
        let weather = match (self.temperature, self.humidity, self.weather_mood_score) {
            (Some(temperature), Some(humidity), Some(mood_score)) => Some(WeatherSnapshot {
                observation: WeatherObservation {
                    temperature,
                    humidity,
                    condition: self
                        .weather_condition
                        .unwrap_or_else(|| UNKNOWN_CONDITION.to_string()),
                    precipitation: self.precipitation.unwrap_or(0.0),
                    cloud_cover: self.cloud_cover,
                    wind_speed: self.wind_speed,
                    air_pressure: self.air_pressure,
                    uv_index: self.uv_index,
                },
                mood_score,
                impact_factors: self.weather_impact_factors.unwrap_or_default(),
            }),
            _ => None,
        };

        DailyEntry {
            user_id: self.user_id,
            date: self.log_date,
            mood_rating: self.mood_rating,
            habits: HabitFlags {
                had_exercise: self.had_exercise,
                got_enough_sleep: self.got_enough_sleep,
                had_social_interaction: self.had_social_interaction,
                ate_healthy: self.ate_healthy,
            },
            notes: self.notes,
            weather,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct PatternRecord {
    user_id: Uuid,
    temperature_range: String,
    humidity_range: String,
    weather_condition: String,
    avg_mood_impact: f64,
    sample_count: i64,
    last_updated: DateTime<Utc>,
}
impl PatternRecord {
    fn to_domain(self) -> WeatherMoodPattern {
        WeatherMoodPattern {
            key: PatternKey {
                user_id: self.user_id,
                temperature_bucket: self.temperature_range,
                humidity_bucket: self.humidity_range,
                condition: self.weather_condition,
            },
            running_average_impact: self.avg_mood_impact,
            sample_count: self.sample_count,
            last_updated: self.last_updated,
        }
    }
}

//=========================================================================================
// `EntryRepository` Trait Implementation
//=========================================================================================

const INSERT_ENTRY: &str = r#"
    INSERT INTO daily_logs (
        user_id, log_date, mood_rating, had_exercise, got_enough_sleep,
        had_social_interaction, ate_healthy, notes, temperature, humidity,
        weather_condition, precipitation, cloud_cover, wind_speed, air_pressure,
        uv_index, weather_mood_score, weather_impact_factors, created_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
"#;

const REPLACE_ON_CONFLICT: &str = r#"
    ON CONFLICT (user_id, log_date) DO UPDATE SET
        mood_rating = EXCLUDED.mood_rating,
        had_exercise = EXCLUDED.had_exercise,
        got_enough_sleep = EXCLUDED.got_enough_sleep,
        had_social_interaction = EXCLUDED.had_social_interaction,
        ate_healthy = EXCLUDED.ate_healthy,
        notes = EXCLUDED.notes,
        temperature = EXCLUDED.temperature,
        humidity = EXCLUDED.humidity,
        weather_condition = EXCLUDED.weather_condition,
        precipitation = EXCLUDED.precipitation,
        cloud_cover = EXCLUDED.cloud_cover,
        wind_speed = EXCLUDED.wind_speed,
        air_pressure = EXCLUDED.air_pressure,
        uv_index = EXCLUDED.uv_index,
        weather_mood_score = EXCLUDED.weather_mood_score,
        weather_impact_factors = EXCLUDED.weather_impact_factors,
        created_at = EXCLUDED.created_at
"#;

impl PgStore {
    /// Inserts an entry row and returns how many rows were written.
    async fn write_entry(&self, entry: &DailyEntry, on_conflict: &str) -> PortResult<u64> {
        let weather = entry.weather.as_ref();
        let obs = weather.map(|w| &w.observation);

        let sql = format!("{}{}", INSERT_ENTRY, on_conflict);
        let result = sqlx::query(&sql)
            .bind(entry.user_id)
            .bind(entry.date)
            .bind(entry.mood_rating)
            .bind(entry.habits.had_exercise)
            .bind(entry.habits.got_enough_sleep)
            .bind(entry.habits.had_social_interaction)
            .bind(entry.habits.ate_healthy)
            .bind(&entry.notes)
            .bind(obs.map(|o| o.temperature))
            .bind(obs.map(|o| o.humidity))
            .bind(obs.map(|o| o.condition.clone()))
            .bind(obs.map(|o| o.precipitation))
            .bind(obs.and_then(|o| o.cloud_cover))
            .bind(obs.and_then(|o| o.wind_speed))
            .bind(obs.and_then(|o| o.air_pressure))
            .bind(obs.and_then(|o| o.uv_index))
            .bind(weather.map(|w| w.mood_score))
            .bind(weather.map(|w| w.impact_factors.clone()))
            .bind(entry.created_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl EntryRepository for PgStore {
    async fn save_entry(&self, entry: &DailyEntry) -> PortResult<()> {
        self.write_entry(entry, REPLACE_ON_CONFLICT).await?;
        Ok(())
    }

    async fn insert_entry(&self, entry: &DailyEntry) -> PortResult<bool> {
        let written = self
            .write_entry(entry, "ON CONFLICT (user_id, log_date) DO NOTHING")
            .await?;
        Ok(written > 0)
    }

    async fn find_entry(&self, user_id: Uuid, date: NaiveDate) -> PortResult<Option<DailyEntry>> {
        let record = sqlx::query_as::<_, EntryRecord>(&format!(
            "SELECT {} FROM daily_logs WHERE user_id = $1 AND log_date = $2",
            ENTRY_COLUMNS
        ))
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn load_entries(&self, user_id: Uuid) -> PortResult<Vec<DailyEntry>> {
        let records = sqlx::query_as::<_, EntryRecord>(&format!(
            "SELECT {} FROM daily_logs WHERE user_id = $1 ORDER BY log_date DESC",
            ENTRY_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let entries = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(entries)
    }
}

//=========================================================================================
// `PatternRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl PatternRepository for PgStore {
    async fn find_pattern(&self, key: &PatternKey) -> PortResult<Option<WeatherMoodPattern>> {
        let record = sqlx::query_as::<_, PatternRecord>(
            r#"
            SELECT user_id, temperature_range, humidity_range, weather_condition,
                   avg_mood_impact, sample_count, last_updated
            FROM weather_mood_patterns
            WHERE user_id = $1 AND temperature_range = $2 AND humidity_range = $3
              AND weather_condition = $4
            "#,
        )
        .bind(key.user_id)
        .bind(&key.temperature_bucket)
        .bind(&key.humidity_bucket)
        .bind(&key.condition)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn upsert_pattern(
        &self,
        key: &PatternKey,
        average: f64,
        count: i64,
        expected_count: Option<i64>,
    ) -> PortResult<()> {
        // Both branches only write when the row is in the state the caller read,
        // so the affected row count tells us whether we won.
        let result = match expected_count {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO weather_mood_patterns (
                        user_id, temperature_range, humidity_range, weather_condition,
                        avg_mood_impact, sample_count
                    )
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ON CONFLICT DO NOTHING
                    "#,
                )
                .bind(key.user_id)
                .bind(&key.temperature_bucket)
                .bind(&key.humidity_bucket)
                .bind(&key.condition)
                .bind(average)
                .bind(count)
                .execute(&self.pool)
                .await
            }
            Some(expected) => {
                sqlx::query(
                    r#"
                    UPDATE weather_mood_patterns
                    SET avg_mood_impact = $5, sample_count = $6, last_updated = NOW()
                    WHERE user_id = $1 AND temperature_range = $2 AND humidity_range = $3
                      AND weather_condition = $4 AND sample_count = $7
                    "#,
                )
                .bind(key.user_id)
                .bind(&key.temperature_bucket)
                .bind(&key.humidity_bucket)
                .bind(&key.condition)
                .bind(average)
                .bind(count)
                .bind(expected)
                .execute(&self.pool)
                .await
            }
        }
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            debug!(user_id = %key.user_id, ?expected_count, "Pattern row changed underneath us");
            return Err(PortError::Conflict(format!(
                "pattern {}/{}/{} no longer has sample count {:?}",
                key.temperature_bucket, key.humidity_bucket, key.condition, expected_count
            )));
        }
        Ok(())
    }

    async fn load_patterns(&self, user_id: Uuid) -> PortResult<Vec<WeatherMoodPattern>> {
        let records = sqlx::query_as::<_, PatternRecord>(
            r#"
            SELECT user_id, temperature_range, humidity_range, weather_condition,
                   avg_mood_impact, sample_count, last_updated
            FROM weather_mood_patterns
            WHERE user_id = $1
            ORDER BY sample_count DESC, last_updated DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let patterns = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> EntryRecord {
        EntryRecord {
            user_id: Uuid::new_v4(),
            log_date: NaiveDate::from_ymd_opt(2024, 7, 4).unwrap(),
            mood_rating: 4,
            had_exercise: true,
            got_enough_sleep: false,
            had_social_interaction: true,
            ate_healthy: false,
            notes: Some("fireworks".into()),
            temperature: Some(24.0),
            humidity: Some(55.0),
            weather_condition: Some("Clear".into()),
            precipitation: None,
            cloud_cover: Some(5.0),
            wind_speed: Some(3.0),
            air_pressure: None,
            uv_index: None,
            weather_mood_score: Some(9.3),
            weather_impact_factors: Some(vec!["Comfortable temperature (24°C)".into()]),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn row_with_weather_maps_to_snapshot() {
        let entry = record().to_domain();
        assert!(entry.habits.had_exercise);
        assert!(!entry.habits.ate_healthy);

        let weather = entry.weather.unwrap();
        assert_eq!(weather.mood_score, 9.3);
        assert_eq!(weather.observation.condition, "Clear");
        assert_eq!(weather.observation.precipitation, 0.0);
        assert_eq!(weather.impact_factors.len(), 1);
    }

    #[test]
    fn row_without_weather_has_no_snapshot() {
        let entry = EntryRecord {
            temperature: None,
            humidity: None,
            weather_condition: None,
            weather_mood_score: None,
            weather_impact_factors: None,
            ..record()
        }
        .to_domain();
        assert!(entry.weather.is_none());
        assert_eq!(entry.notes.as_deref(), Some("fireworks"));
    }
}
