use crate::domain::assessment::{Assessment, Scale};
use crate::error::Result;
use crate::services::emotion::EmotionScore;
use crate::store::document::{DocPath, DocumentStore, CHECK_RECORDS, DAILY_EMOTIONS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One entry of `twoweek_check_records`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckRecord {
    pub date: DateTime<Utc>,
    pub gad_score: u8,
    pub gad_score_level: String,
    pub phq_score: u8,
    pub phq_score_level: String,
}

impl CheckRecord {
    pub fn from_assessment(assessment: &Assessment, date: DateTime<Utc>) -> Self {
        Self {
            date,
            gad_score: assessment.gad_score,
            gad_score_level: assessment.gad_level().label(Scale::Anxiety),
            phq_score: assessment.phq_score,
            phq_score_level: assessment.phq_level().label(Scale::Depression),
        }
    }
}

/// One entry of `daily_emotions`. Field names are the stored names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyEmotions {
    pub date: DateTime<Utc>,
    pub emotions: Vec<String>,
    pub emotions_values: Vec<f64>,
    pub summary: String,
    #[serde(default)]
    pub greeting_texts: BTreeMap<String, String>,
}

impl DailyEmotions {
    pub fn new(date: DateTime<Utc>, scores: &[EmotionScore], summary: String, greetings: &[String]) -> Self {
        Self {
            date,
            emotions: scores.iter().map(|s| s.label.clone()).collect(),
            emotions_values: scores.iter().map(|s| s.score).collect(),
            summary,
            greeting_texts: greetings
                .iter()
                .enumerate()
                .map(|(i, text)| (i.to_string(), text.clone()))
                .collect(),
        }
    }
}

/// Typed access to the per-user record collections.
pub struct Records {
    docs: Arc<dyn DocumentStore>,
}

impl Records {
    pub fn new(docs: Arc<dyn DocumentStore>) -> Self {
        Self { docs }
    }

    pub async fn append_check(&self, user_id: &str, record: &CheckRecord) -> Result<String> {
        let id = self
            .docs
            .append(user_id, CHECK_RECORDS, serde_json::to_value(record)?)
            .await?;
        tracing::info!(
            "Stored two-week check for {} (gad={}, phq={})",
            user_id,
            record.gad_score,
            record.phq_score
        );
        Ok(id)
    }

    pub async fn latest_check(&self, user_id: &str) -> Result<Option<CheckRecord>> {
        match self.docs.latest(user_id, CHECK_RECORDS).await? {
            Some(raw) => Ok(Some(serde_json::from_value(raw)?)),
            None => Ok(None),
        }
    }

    /// Activity preference scores; a missing document is an empty map.
    /// Non-numeric entries are skipped.
    pub async fn preferences(&self, user_id: &str) -> Result<BTreeMap<String, f64>> {
        let Some(raw) = self.docs.get(&DocPath::preferences(user_id)).await? else {
            return Ok(BTreeMap::new());
        };
        let Value::Object(fields) = raw else {
            tracing::warn!("Preference document for {} is not an object", user_id);
            return Ok(BTreeMap::new());
        };
        Ok(fields
            .into_iter()
            .filter_map(|(name, score)| score.as_f64().map(|s| (name, s)))
            .collect())
    }

    pub async fn set_preference(&self, user_id: &str, activity: &str, score: f64) -> Result<()> {
        let mut fields = Map::new();
        fields.insert(activity.to_string(), Value::from(score));
        self.docs.merge(&DocPath::preferences(user_id), fields).await
    }

    pub async fn append_daily_emotions(&self, user_id: &str, record: &DailyEmotions) -> Result<String> {
        self.docs
            .append(user_id, DAILY_EMOTIONS, serde_json::to_value(record)?)
            .await
    }

    pub async fn latest_daily_emotions(&self, user_id: &str) -> Result<Option<DailyEmotions>> {
        match self.docs.latest(user_id, DAILY_EMOTIONS).await? {
            Some(raw) => Ok(Some(serde_json::from_value(raw)?)),
            None => Ok(None),
        }
    }
}
