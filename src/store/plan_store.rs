use crate::domain::plan::{PlanRecord, WellnessPlan};
use crate::error::{Result, WellnessError};
use crate::store::document::{DocPath, DocumentStore};
use crate::store::local::{Cached, LocalCache};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

const CACHE_FRESH_DAYS: i64 = 1;

fn cache_key(user_id: &str) -> String {
    format!("plan:{user_id}")
}

/// Local mirror of the current plan. `unsynced` marks a copy whose remote
/// write failed; it stays authoritative until a later write succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LocalPlan {
    #[serde(flatten)]
    record: PlanRecord,
    #[serde(default)]
    unsynced: bool,
}

/// Owns the persisted plan: `plans/currentPlan` remotely, mirrored in the
/// local cache for reads while the remote store is unreachable.
pub struct PlanStore {
    docs: Arc<dyn DocumentStore>,
    cache: Arc<LocalCache>,
}

impl PlanStore {
    pub fn new(docs: Arc<dyn DocumentStore>, cache: Arc<LocalCache>) -> Self {
        Self { docs, cache }
    }

    /// Stores `plan` under a fresh creation date, replacing any previous
    /// plan. The local copy is written first; when the remote write fails it
    /// is kept as unsynced and served by `load` until it can be pushed.
    pub async fn save(&self, user_id: &str, plan: WellnessPlan) -> Result<PlanRecord> {
        let record = PlanRecord {
            creation_date: Utc::now(),
            plan: plan.into_days(),
        };

        if let Err(e) = self.cache_entry(user_id, &record, true).await {
            tracing::warn!("Failed to cache plan locally for {}: {}", user_id, e);
        }
        self.push(user_id, &record).await?;
        self.mark_synced(user_id, &record).await;

        tracing::info!("Saved plan for {} created {}", user_id, record.creation_date);
        Ok(record)
    }

    /// `Ok(None)` means no plan exists yet. An unsynced local copy wins over
    /// the remote one. When the remote store cannot be reached the cached
    /// copy is returned instead, if there is one.
    pub async fn load(&self, user_id: &str) -> Result<Option<PlanRecord>> {
        if let Some(pending) = self.pending(user_id).await {
            match self.push(user_id, &pending).await {
                Ok(()) => {
                    tracing::info!("Synced locally kept plan for {}", user_id);
                    self.mark_synced(user_id, &pending).await;
                }
                Err(e) => tracing::warn!("Serving unsynced local plan for {}: {}", user_id, e),
            }
            return Ok(Some(pending));
        }

        match self.docs.get(&DocPath::current_plan(user_id)).await {
            Ok(Some(raw)) => {
                let record: PlanRecord = serde_json::from_value(raw)?;
                if let Err(e) = self.cache_locally(user_id, &record).await {
                    tracing::warn!("Failed to refresh local plan cache for {}: {}", user_id, e);
                }
                Ok(Some(record))
            }
            Ok(None) => Ok(None),
            Err(WellnessError::Transport(message)) => match self.load_cached(user_id).await {
                Some(cached) => {
                    if cached.is_stale(Duration::days(CACHE_FRESH_DAYS), Utc::now()) {
                        tracing::warn!("Cached plan for {} is more than {} day(s) old", user_id, CACHE_FRESH_DAYS);
                    }
                    tracing::warn!(
                        "Plan store unreachable ({}), serving cached plan for {} from {}",
                        message,
                        user_id,
                        cached.stored_at
                    );
                    Ok(Some(cached.into_inner()))
                }
                None => Err(WellnessError::Transport(message)),
            },
            Err(e) => Err(e),
        }
    }

    /// Sets one activity's completion flag. `Ok(false)` when no activity in
    /// the stored plan has `activity_id`. The stored creation date is
    /// written back exactly as read.
    pub async fn update_completion(&self, user_id: &str, activity_id: Uuid, completed: bool) -> Result<bool> {
        let (doc, mut record) = self.read_existing(user_id).await?;
        if !record.set_completion(activity_id, completed) {
            tracing::debug!("Activity {} not found in plan for {}", activity_id, user_id);
            return Ok(false);
        }
        self.write_days(user_id, doc, &record).await?;
        Ok(true)
    }

    /// Replaces the days of the stored plan, keeping its creation date.
    pub async fn update_plan(&self, user_id: &str, plan: WellnessPlan) -> Result<()> {
        let (doc, mut record) = self.read_existing(user_id).await?;
        record.plan = plan.into_days();
        self.write_days(user_id, doc, &record).await
    }

    pub async fn cache_locally(&self, user_id: &str, record: &PlanRecord) -> Result<()> {
        self.cache_entry(user_id, record, false).await
    }

    pub async fn load_cached(&self, user_id: &str) -> Option<Cached<PlanRecord>> {
        let cached = self.cache.get::<LocalPlan>(&cache_key(user_id)).await?;
        Some(Cached {
            value: cached.value.record,
            stored_at: cached.stored_at,
        })
    }

    async fn cache_entry(&self, user_id: &str, record: &PlanRecord, unsynced: bool) -> Result<()> {
        let entry = LocalPlan {
            record: record.clone(),
            unsynced,
        };
        self.cache.set(&cache_key(user_id), &entry).await
    }

    async fn mark_synced(&self, user_id: &str, record: &PlanRecord) {
        if let Err(e) = self.cache_locally(user_id, record).await {
            tracing::warn!("Failed to refresh local plan cache for {}: {}", user_id, e);
        }
    }

    async fn pending(&self, user_id: &str) -> Option<PlanRecord> {
        let cached = self.cache.get::<LocalPlan>(&cache_key(user_id)).await?;
        cached.value.unsynced.then_some(cached.value.record)
    }

    async fn push(&self, user_id: &str, record: &PlanRecord) -> Result<()> {
        let body = serde_json::to_value(record)?;
        self.docs
            .set(&DocPath::current_plan(user_id), body)
            .await
            .map_err(|e| {
                tracing::error!("Failed to save plan for {}: {}", user_id, e);
                e
            })
    }

    /// Reads the remote plan for an in-place update, pushing an unsynced
    /// local copy first so the update applies to it.
    async fn read_existing(&self, user_id: &str) -> Result<(Map<String, Value>, PlanRecord)> {
        if let Some(pending) = self.pending(user_id).await {
            self.push(user_id, &pending).await?;
            self.mark_synced(user_id, &pending).await;
        }

        let raw = self
            .docs
            .get(&DocPath::current_plan(user_id))
            .await?
            .ok_or_else(|| WellnessError::NotFound(format!("no plan for user {user_id}")))?;
        let record: PlanRecord = serde_json::from_value(raw.clone())?;
        match raw {
            Value::Object(doc) => Ok((doc, record)),
            _ => Err(WellnessError::Corrupt("plan document is not an object".into())),
        }
    }

    /// Read-modify-write without a concurrency check; the last writer wins.
    async fn write_days(&self, user_id: &str, mut doc: Map<String, Value>, record: &PlanRecord) -> Result<()> {
        doc.insert("plan".into(), serde_json::to_value(&record.plan)?);
        self.docs
            .set(&DocPath::current_plan(user_id), Value::Object(doc))
            .await?;
        self.mark_synced(user_id, record).await;
        Ok(())
    }
}
