use crate::services::completion::TextCompletion;
use crate::services::emotion::EmotionClassifier;
use crate::services::generator::PlanGenerator;
use crate::store::local::LocalCache;
use crate::store::plan_store::PlanStore;
use crate::store::records::Records;
use crate::time_utils::Zone;
use std::sync::Arc;

/// Services built once in `main` and shared by every request.
pub struct AppState {
    pub zone: Zone,
    pub generator: PlanGenerator,
    /// Chat replies; never memoized.
    pub completion: Arc<dyn TextCompletion>,
    /// Daily summaries; may be memoized.
    pub summarizer: Arc<dyn TextCompletion>,
    pub emotions: Arc<dyn EmotionClassifier>,
    pub plans: PlanStore,
    pub records: Records,
    pub cache: Arc<LocalCache>,
}

pub type SharedState = Arc<AppState>;
