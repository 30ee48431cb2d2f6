use crate::domain::assessment::{Assessment, Scale};
use crate::domain::checkin::{schedule_for, CheckSchedule};
use crate::domain::plan::{Activity, PlanRecord, TimeSlot};
use crate::error::{Result, WellnessError};
use crate::services::completion::summarize;
use crate::services::emotion::EmotionScore;
use crate::state::AppState;
use crate::store::records::{CheckRecord, DailyEmotions};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Emotions shown per chat reply and stored per day.
pub const TOP_EMOTIONS: usize = 3;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub gad_score: u8,
    pub gad_score_level: String,
    pub phq_score: u8,
    pub phq_score_level: String,
    pub summary: String,
    pub plan: PlanRecord,
}

/// Records the answers, generates a fresh plan from them and the stored
/// preferences, and saves it over any previous plan.
pub async fn submit_check(state: &AppState, user_id: &str, answers: &[u8]) -> Result<CheckOutcome> {
    let scored = Assessment::from_answers(answers, BTreeMap::new())?;

    let record = CheckRecord::from_assessment(&scored, Utc::now());
    state.records.append_check(user_id, &record).await?;

    let assessment = Assessment {
        preferences: state.records.preferences(user_id).await?,
        ..scored
    };
    let plan = state.generator.generate_14_day_plan(&assessment).await?;
    let plan = state.plans.save(user_id, plan).await?;

    Ok(CheckOutcome {
        gad_score: assessment.gad_score,
        gad_score_level: assessment.gad_level().label(Scale::Anxiety),
        phq_score: assessment.phq_score,
        phq_score_level: assessment.phq_level().label(Scale::Depression),
        summary: assessment.summary(),
        plan,
    })
}

pub async fn check_status(state: &AppState, user_id: &str) -> Result<CheckSchedule> {
    let last = state.records.latest_check(user_id).await?;
    let last_date = last.map(|record| state.zone.date_of(record.date));
    Ok(schedule_for(last_date, state.zone.today()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotActivities {
    pub time_slot: TimeSlot,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayView {
    pub creation_date: DateTime<Utc>,
    pub current_day: u32,
    pub days_remaining: u32,
    pub slots: Vec<SlotActivities>,
}

pub fn today_view(record: &PlanRecord, created_local: NaiveDate, today: NaiveDate) -> TodayView {
    let current_day = record.current_day(created_local, today);
    let day = record.day(current_day);
    let slots = TimeSlot::ALL
        .iter()
        .map(|&slot| SlotActivities {
            time_slot: slot,
            activities: day
                .map(|d| d.activities_in(slot).cloned().collect())
                .unwrap_or_default(),
        })
        .collect();

    TodayView {
        creation_date: record.creation_date,
        current_day,
        days_remaining: PlanRecord::days_remaining(current_day),
        slots,
    }
}

pub async fn plan_today(state: &AppState, user_id: &str) -> Result<TodayView> {
    let record = state
        .plans
        .load(user_id)
        .await?
        .ok_or_else(|| WellnessError::NotFound(format!("no plan for user {user_id}")))?;
    let created_local = state.zone.date_of(record.creation_date);
    Ok(today_view(&record, created_local, state.zone.today()))
}

/// Emotion scores and messages gathered from today's chat, until the next
/// daily rollover stores them.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct DailyTally {
    scores: BTreeMap<String, f64>,
    messages: Vec<String>,
}

impl DailyTally {
    fn add(&mut self, message: &str, emotions: &[EmotionScore]) {
        for e in emotions {
            *self.scores.entry(e.label.clone()).or_insert(0.0) += e.score;
        }
        self.messages.push(message.to_string());
    }

    fn top(&self, n: usize) -> Vec<EmotionScore> {
        let mut scores: Vec<EmotionScore> = self
            .scores
            .iter()
            .map(|(label, score)| EmotionScore {
                label: label.clone(),
                score: *score,
            })
            .collect();
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        scores.truncate(n);
        scores
    }
}

fn tally_key(user_id: &str) -> String {
    format!("dailyTopEmotions:{user_id}")
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub emotions: Vec<EmotionScore>,
}

/// Answers a chat message. Emotion classification is best-effort: when it
/// fails the reply is still returned, without emotions.
pub async fn chat(state: &AppState, user_id: &str, message: &str) -> Result<ChatReply> {
    let reply = state.completion.complete(message).await?;

    let emotions = match state.emotions.classify(message).await {
        Ok(mut scores) => {
            scores.truncate(TOP_EMOTIONS);
            scores
        }
        Err(e) => {
            tracing::warn!("Emotion classification unavailable for {}: {}", user_id, e);
            Vec::new()
        }
    };

    let tallied = state
        .cache
        .update::<DailyTally, _>(&tally_key(user_id), |tally| tally.add(message, &emotions))
        .await;
    if let Err(e) = tallied {
        tracing::warn!("Failed to keep daily emotions for {}: {}", user_id, e);
    }

    Ok(ChatReply { reply, emotions })
}

#[derive(Debug, Serialize)]
pub struct DailyRollover {
    pub stored: bool,
    pub record: Option<DailyEmotions>,
}

/// Stores yesterday's gathered emotions with a short summary, at most once
/// per local day. The tally is cleared for the new day either way.
pub async fn store_daily_emotions(state: &AppState, user_id: &str, greetings: &[String]) -> Result<DailyRollover> {
    let today = state.zone.today();
    let marker = format!("lastStoredDate:{user_id}");
    if !state.cache.first_open_today(&marker, today).await {
        tracing::debug!("Daily emotions already stored today for {}", user_id);
        return Ok(DailyRollover {
            stored: false,
            record: None,
        });
    }

    let key = tally_key(user_id);
    let tally = state
        .cache
        .get::<DailyTally>(&key)
        .await
        .map(|cached| cached.into_inner())
        .unwrap_or_default();

    let record = if tally.messages.is_empty() {
        tracing::info!("No emotions to store for {}", user_id);
        None
    } else {
        let summary = summarize(state.summarizer.as_ref(), &tally.messages.join("\n")).await?;
        let record = DailyEmotions::new(Utc::now(), &tally.top(TOP_EMOTIONS), summary, greetings);
        state.records.append_daily_emotions(user_id, &record).await?;
        tracing::info!("Stored daily emotions for {}", user_id);
        Some(record)
    };

    state.cache.remove(&key).await?;
    state.cache.stamp_today(&marker, today).await?;

    Ok(DailyRollover {
        stored: record.is_some(),
        record,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchView {
    pub first_open_today: bool,
    pub summary: Option<String>,
}

/// Marks today's first app open and hands back the latest daily summary
/// for the greeting.
pub async fn launch(state: &AppState, user_id: &str) -> Result<LaunchView> {
    let today = state.zone.today();
    let marker = format!("lastLaunchDate:{user_id}");
    let first_open_today = state.cache.first_open_today(&marker, today).await;
    if first_open_today {
        state.cache.stamp_today(&marker, today).await?;
    }

    Ok(LaunchView {
        first_open_today,
        summary: latest_summary(state, user_id).await?,
    })
}

pub async fn latest_summary(state: &AppState, user_id: &str) -> Result<Option<String>> {
    Ok(state
        .records
        .latest_daily_emotions(user_id)
        .await?
        .map(|day| day.summary))
}
