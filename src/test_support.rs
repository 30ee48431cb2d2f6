//! Fakes and fixtures shared by the unit tests.

use crate::crypto::Crypto;
use crate::domain::plan::{DayPlan, TimeSlot};
use crate::error::{Result, WellnessError};
use crate::services::completion::TextCompletion;
use crate::services::emotion::{HuggingFaceClassifier, DEFAULT_EMOTION_MODEL_URL};
use crate::services::generator::PlanGenerator;
use crate::services::http::HttpTransport;
use crate::services::parser::TextPlanParser;
use crate::state::{AppState, SharedState};
use crate::store::document::{DocPath, DocumentStore, MemoryDocumentStore};
use crate::store::local::LocalCache;
use crate::store::plan_store::PlanStore;
use crate::store::records::Records;
use crate::time_utils::Zone;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Replays queued HTTP bodies (or errors) in order.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Vec<u8>>>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<Vec<u8>>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post_json(&self, _url: &str, _bearer: &str, _body: &serde_json::Value) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(WellnessError::Transport("script exhausted".into())))
    }
}

/// Replays queued completions and records every prompt it was sent.
pub struct ScriptedCompletion {
    responses: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextCompletion for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(WellnessError::Upstream {
                attempts: 1,
                message: "script exhausted".into(),
            }))
    }
}

/// In-memory store that can be switched offline: reads then fail with
/// `Transport`, writes with `Persistence`. Read-only mode fails writes only.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryDocumentStore,
    offline: AtomicBool,
    read_only: AtomicBool,
}

impl FlakyStore {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn check_read(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(WellnessError::Transport("store unreachable".into()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) || self.read_only.load(Ordering::SeqCst) {
            return Err(WellnessError::Persistence("store unreachable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, path: &DocPath) -> Result<Option<serde_json::Value>> {
        self.check_read()?;
        self.inner.get(path).await
    }

    async fn set(&self, path: &DocPath, body: serde_json::Value) -> Result<()> {
        self.check_write()?;
        self.inner.set(path, body).await
    }

    async fn merge(&self, path: &DocPath, fields: serde_json::Map<String, serde_json::Value>) -> Result<()> {
        self.check_write()?;
        self.inner.merge(path, fields).await
    }

    async fn append(&self, user_id: &str, collection: &str, body: serde_json::Value) -> Result<String> {
        self.check_write()?;
        self.inner.append(user_id, collection, body).await
    }

    async fn latest(&self, user_id: &str, collection: &str) -> Result<Option<serde_json::Value>> {
        self.check_read()?;
        self.inner.latest(user_id, collection).await
    }
}

const SLOT_ACTIVITIES: [(&str, &str); 4] = [
    ("Mindful Breathing", "Breathe slowly for a few minutes and notice how your body feels. 🌸"),
    ("Nature Walk", "Take a gentle walk outside and pay attention to the sounds around you."),
    ("Gratitude Journal", "Write down three things that went well today, however small."),
    ("Bedtime Reading", "Read something light and calming, away from screens."),
];

/// Well-formed generated text for `days`; even days get two activities in
/// the afternoon.
pub fn plan_text(days: RangeInclusive<u32>) -> String {
    days.map(|day| {
        let mut out = format!("Day {day}:\n");
        for (slot, (title, description)) in TimeSlot::ALL.iter().zip(SLOT_ACTIVITIES) {
            out.push_str(&format!("{}\n- {title} ({} minutes): {description}\n", slot.header(), 5 + day));
            if *slot == TimeSlot::Afternoon && day % 2 == 0 {
                out.push_str("- Call a Friend (15 minutes): Reach out to someone you trust.\n");
            }
        }
        out
    })
    .collect::<Vec<_>>()
    .join("\n")
}

/// Renders day plans back into the generation layout.
pub fn render_plan(days: &[DayPlan]) -> String {
    let mut out = String::new();
    for day in days {
        out.push_str(&format!("Day {}:\n", day.day_number));
        for slot in TimeSlot::ALL {
            out.push_str(&format!("{}\n", slot.header()));
            for a in day.activities_in(slot) {
                out.push_str(&format!("- {} ({} minutes): {}\n", a.title, a.duration, a.content));
            }
        }
        out.push('\n');
    }
    out
}

/// A fully wired state over fakes: one scripted completion backs plan
/// generation, chat and summaries; emotion bodies are replayed in order.
pub struct TestApp {
    pub state: SharedState,
    pub docs: Arc<FlakyStore>,
    pub completion: Arc<ScriptedCompletion>,
    _dir: TempDir,
}

pub async fn test_app(completions: Vec<Result<String>>, emotion_bodies: Vec<Result<Vec<u8>>>) -> TestApp {
    let dir = TempDir::new().unwrap();
    let crypto = Arc::new(Crypto::from_key_bytes(&[4u8; 32]).unwrap());
    let cache = Arc::new(LocalCache::open(dir.path().join("cache.json"), crypto).await.unwrap());
    let docs = Arc::new(FlakyStore::default());
    let completion = Arc::new(ScriptedCompletion::new(completions));
    let emotions = HuggingFaceClassifier::new(
        Arc::new(ScriptedTransport::new(emotion_bodies)),
        DEFAULT_EMOTION_MODEL_URL.into(),
        "hf-test".into(),
    )
    .with_retry(3, std::time::Duration::ZERO);

    let state = Arc::new(AppState {
        zone: Zone::parse("UTC").unwrap(),
        generator: PlanGenerator::new(completion.clone(), Arc::new(TextPlanParser)),
        completion: completion.clone(),
        summarizer: completion.clone(),
        emotions: Arc::new(emotions),
        plans: PlanStore::new(docs.clone(), cache.clone()),
        records: Records::new(docs.clone()),
        cache,
    });

    TestApp {
        state,
        docs,
        completion,
        _dir: dir,
    }
}
