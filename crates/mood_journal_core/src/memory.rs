//! crates/mood_journal_core/src/memory.rs
//!
//! An in-process implementation of the storage ports. Used as the storage
//! backend when no database is configured, and by tests.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{DailyEntry, PatternKey, WeatherMoodPattern};
use crate::ports::{EntryRepository, PatternRepository, PortError, PortResult};

#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<(Uuid, NaiveDate), DailyEntry>>,
    patterns: RwLock<HashMap<PatternKey, WeatherMoodPattern>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntryRepository for InMemoryStore {
    async fn save_entry(&self, entry: &DailyEntry) -> PortResult<()> {
        self.entries
            .write()
            .await
            .insert((entry.user_id, entry.date), entry.clone());
        Ok(())
    }

    async fn insert_entry(&self, entry: &DailyEntry) -> PortResult<bool> {
        match self.entries.write().await.entry((entry.user_id, entry.date)) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(entry.clone());
                Ok(true)
            }
        }
    }

    async fn find_entry(&self, user_id: Uuid, date: NaiveDate) -> PortResult<Option<DailyEntry>> {
        Ok(self.entries.read().await.get(&(user_id, date)).cloned())
    }

    async fn load_entries(&self, user_id: Uuid) -> PortResult<Vec<DailyEntry>> {
        let mut entries: Vec<DailyEntry> = self
            .entries
            .read()
            .await
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }
}

#[async_trait]
impl PatternRepository for InMemoryStore {
    async fn find_pattern(&self, key: &PatternKey) -> PortResult<Option<WeatherMoodPattern>> {
        Ok(self.patterns.read().await.get(key).cloned())
    }

    async fn upsert_pattern(
        &self,
        key: &PatternKey,
        average: f64,
        count: i64,
        expected_count: Option<i64>,
    ) -> PortResult<()> {
        let mut patterns = self.patterns.write().await;
        let stored_count = patterns.get(key).map(|p| p.sample_count);
        if stored_count != expected_count {
            return Err(PortError::Conflict(format!(
                "expected sample count {:?}, found {:?}",
                expected_count, stored_count
            )));
        }

        patterns.insert(
            key.clone(),
            WeatherMoodPattern {
                key: key.clone(),
                running_average_impact: average,
                sample_count: count,
                last_updated: Utc::now(),
            },
        );
        Ok(())
    }

    async fn load_patterns(&self, user_id: Uuid) -> PortResult<Vec<WeatherMoodPattern>> {
        let mut patterns: Vec<WeatherMoodPattern> = self
            .patterns
            .read()
            .await
            .values()
            .filter(|p| p.key.user_id == user_id)
            .cloned()
            .collect();
        patterns.sort_by(|a, b| {
            b.sample_count
                .cmp(&a.sample_count)
                .then_with(|| b.last_updated.cmp(&a.last_updated))
        });
        Ok(patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntryDraft, HabitFlags};

    fn entry(user_id: Uuid, day: u32, mood: i32) -> DailyEntry {
        let date = NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        let draft = EntryDraft::new(date, mood, HabitFlags::default(), None).unwrap();
        DailyEntry::from_draft(user_id, draft, None, Utc::now())
    }

    #[tokio::test]
    async fn saving_same_date_twice_keeps_second_write() {
        let store = InMemoryStore::new();
        let user = Uuid::new_v4();

        store.save_entry(&entry(user, 1, 2)).await.unwrap();
        store.save_entry(&entry(user, 1, 4)).await.unwrap();

        let entries = store.load_entries(user).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mood_rating, 4);
    }

    #[tokio::test]
    async fn insert_entry_keeps_first_write() {
        let store = InMemoryStore::new();
        let user = Uuid::new_v4();

        assert!(store.insert_entry(&entry(user, 2, 2)).await.unwrap());
        assert!(!store.insert_entry(&entry(user, 2, 5)).await.unwrap());
        assert!(store.insert_entry(&entry(Uuid::new_v4(), 2, 5)).await.unwrap());

        let entries = store.load_entries(user).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mood_rating, 2);
    }

    #[tokio::test]
    async fn entries_are_most_recent_first() {
        let store = InMemoryStore::new();
        let user = Uuid::new_v4();
        for day in [3, 1, 7] {
            store.save_entry(&entry(user, day, 3)).await.unwrap();
        }
        store.save_entry(&entry(Uuid::new_v4(), 9, 3)).await.unwrap();

        let days: Vec<u32> = store
            .load_entries(user)
            .await
            .unwrap()
            .iter()
            .map(|e| chrono::Datelike::day(&e.date))
            .collect();
        assert_eq!(days, vec![7, 3, 1]);
    }

    #[tokio::test]
    async fn upsert_checks_expected_count() {
        let store = InMemoryStore::new();
        let key = PatternKey {
            user_id: Uuid::new_v4(),
            temperature_bucket: "10-15".into(),
            humidity_bucket: "70-80".into(),
            condition: "Rain".into(),
        };

        store.upsert_pattern(&key, 3.0, 1, None).await.unwrap();
        let err = store.upsert_pattern(&key, 3.0, 1, None).await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));

        let err = store.upsert_pattern(&key, 4.0, 2, Some(5)).await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));

        store.upsert_pattern(&key, 4.0, 2, Some(1)).await.unwrap();
        let stored = store.find_pattern(&key).await.unwrap().unwrap();
        assert_eq!(stored.sample_count, 2);
        assert_eq!(stored.running_average_impact, 4.0);
    }
}
