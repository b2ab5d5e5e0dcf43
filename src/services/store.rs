use super::KeyValueStore;
use crate::models::*;
use crate::services::stats::UsageSnapshot;
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use futures::future::join_all;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;

/// Key prefix for per-day event logs; the suffix is the ISO date.
pub const DAY_KEY_PREFIX: &str = "day-";
/// Key holding the serialized plan spec + curve.
pub const PLAN_KEY: &str = "plan";

/// File-per-key JSON store rooted at a data directory.
///
/// Each key maps to `<data_dir>/<key>.json`. Values written by this store
/// are pretty-printed JSON; a value that fails to parse is treated as
/// absent by the typed accessors so one corrupt day cannot poison the
/// aggregation.
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        // Keys are internal (day-<iso-date>, plan); reject anything that
        // could escape the data directory.
        if key.is_empty() || key.contains(['/', '\\', '.']) {
            return Err(anyhow!("Invalid store key: {key:?}"));
        }
        Ok(self.data_dir.join(format!("{key}.json")))
    }

    pub fn day_key(date: NaiveDate) -> String {
        format!("{DAY_KEY_PREFIX}{}", date.format("%Y-%m-%d"))
    }

    fn date_from_day_key(key: &str) -> Option<NaiveDate> {
        let iso = key.strip_prefix(DAY_KEY_PREFIX)?;
        NaiveDate::parse_from_str(iso, "%Y-%m-%d").ok()
    }

    /// Read the event log for one day. Missing or corrupt records read as
    /// empty; corruption is logged and otherwise ignored.
    pub async fn events_for(&self, date: NaiveDate) -> Result<Vec<UsageEvent>> {
        let key = Self::day_key(date);
        let Some(raw) = self.get(&key).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(events) => Ok(events),
            Err(e) => {
                log::warn!("Skipping corrupt day log {key}: {e}");
                Ok(Vec::new())
            }
        }
    }

    /// Append one event to its day's log.
    pub async fn append_event(&self, event: UsageEvent) -> Result<()> {
        let date = event.timestamp.date_naive();
        let mut events = self.events_for(date).await?;
        events.push(event);
        let key = Self::day_key(date);
        self.set(&key, &serde_json::to_string_pretty(&events)?).await
    }

    /// Drop the most recent event of `date` (manual correction). Returns
    /// the removed event, or `None` when the day log is empty.
    pub async fn undo_last(&self, date: NaiveDate) -> Result<Option<UsageEvent>> {
        let mut events = self.events_for(date).await?;
        let removed = events.pop();
        if removed.is_some() {
            let key = Self::day_key(date);
            self.set(&key, &serde_json::to_string_pretty(&events)?).await?;
        }
        Ok(removed)
    }

    pub async fn save_plan(&self, plan: &PlanState) -> Result<()> {
        self.set(PLAN_KEY, &serde_json::to_string_pretty(plan)?).await
    }

    /// Load the persisted plan. `None` when no plan has been created; a
    /// corrupt plan record also reads as `None`.
    pub async fn load_plan(&self) -> Result<Option<PlanState>> {
        let Some(raw) = self.get(PLAN_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(plan) => Ok(Some(plan)),
            Err(e) => {
                log::warn!("Skipping corrupt plan record: {e}");
                Ok(None)
            }
        }
    }

    pub async fn clear_plan(&self) -> Result<()> {
        self.remove(PLAN_KEY).await
    }

    /// Load every day log into an immutable per-day count snapshot.
    ///
    /// The per-day reads run concurrently; the snapshot is only built once
    /// all of them have completed, so summaries never see partial data.
    pub async fn usage_snapshot(&self) -> Result<UsageSnapshot> {
        let keys = self.list_keys(DAY_KEY_PREFIX).await?;

        let reads = keys.iter().filter_map(|key| {
            let date = Self::date_from_day_key(key)?;
            Some(async move {
                let events = self.events_for(date).await?;
                Ok::<_, anyhow::Error>((date, events.len() as u64))
            })
        });

        let mut counts: HashMap<NaiveDate, u64> = HashMap::new();
        for result in join_all(reads).await {
            let (date, count) = result?;
            if count > 0 {
                counts.insert(date, count);
            }
        }

        log::debug!("Loaded usage snapshot covering {} days", counts.len());
        Ok(UsageSnapshot::new(counts))
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, value)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = match fs::read_dir(&self.data_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(keys),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to list {}", self.data_dir.display()))
            }
        };

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(key) = name.strip_suffix(".json") {
                if key.starts_with(prefix) {
                    keys.push(key.to_string());
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}
