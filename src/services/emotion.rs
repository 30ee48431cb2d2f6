use crate::error::{Result, WellnessError};
use crate::services::http::HttpTransport;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

pub const DEFAULT_EMOTION_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/SamLowe/roberta-base-go_emotions";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmotionScore {
    pub label: String,
    pub score: f64,
}

#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Scores for `text`, highest first.
    async fn classify(&self, text: &str) -> Result<Vec<EmotionScore>>;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Failure { error: serde_json::Value },
    Batched(Vec<Vec<EmotionScore>>),
    Flat(Vec<EmotionScore>),
}

enum Outcome {
    Scores(Vec<EmotionScore>),
    ModelLoading,
    Failed(String),
}

fn interpret(body: &[u8]) -> Outcome {
    match serde_json::from_slice::<InferenceResponse>(body) {
        Ok(InferenceResponse::Failure { error }) => {
            let message = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            if message.contains("currently loading") {
                Outcome::ModelLoading
            } else {
                Outcome::Failed(message)
            }
        }
        Ok(InferenceResponse::Batched(batches)) => {
            Outcome::Scores(sorted(batches.into_iter().next().unwrap_or_default()))
        }
        Ok(InferenceResponse::Flat(scores)) => Outcome::Scores(sorted(scores)),
        Err(e) => Outcome::Failed(format!("undecodable response: {e}")),
    }
}

fn sorted(mut scores: Vec<EmotionScore>) -> Vec<EmotionScore> {
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
    scores
}

pub struct HuggingFaceClassifier {
    transport: Arc<dyn HttpTransport>,
    url: String,
    api_key: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl HuggingFaceClassifier {
    pub fn new(transport: Arc<dyn HttpTransport>, url: String, api_key: String) -> Self {
        Self {
            transport,
            url,
            api_key,
            max_retries: 3,
            retry_delay: Duration::from_secs(20),
        }
    }

    pub fn with_retry(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }
}

#[async_trait]
impl EmotionClassifier for HuggingFaceClassifier {
    async fn classify(&self, text: &str) -> Result<Vec<EmotionScore>> {
        let body = serde_json::json!({ "inputs": text });
        let mut attempts = 0;

        loop {
            attempts += 1;
            let bytes = self.transport.post_json(&self.url, &self.api_key, &body).await?;

            match interpret(&bytes) {
                Outcome::Scores(scores) => return Ok(scores),
                Outcome::Failed(message) => {
                    tracing::error!("Emotion classification failed: {}", message);
                    return Err(WellnessError::Upstream { attempts, message });
                }
                Outcome::ModelLoading if attempts > self.max_retries => {
                    tracing::error!("Emotion model still loading after {} attempts, giving up", attempts);
                    return Err(WellnessError::Upstream {
                        attempts,
                        message: "model still loading".into(),
                    });
                }
                Outcome::ModelLoading => {
                    tracing::warn!(
                        "Emotion model is loading, retrying in {}s",
                        self.retry_delay.as_secs()
                    );
                    sleep(self.retry_delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedTransport;

    const LOADING: &str = r#"{"error":"Model SamLowe/roberta-base-go_emotions is currently loading","estimated_time":20.0}"#;
    const SCORES: &str = r#"[[{"label":"neutral","score":0.2},{"label":"joy","score":0.7},{"label":"sadness","score":0.1}]]"#;

    fn classifier(transport: Arc<ScriptedTransport>) -> HuggingFaceClassifier {
        HuggingFaceClassifier::new(transport, DEFAULT_EMOTION_MODEL_URL.into(), "hf-test".into())
            .with_retry(3, Duration::ZERO)
    }

    #[test]
    fn batched_and_flat_payloads_are_sorted() {
        let Outcome::Scores(scores) = interpret(SCORES.as_bytes()) else {
            panic!("expected scores");
        };
        assert_eq!(scores[0].label, "joy");
        assert_eq!(scores[2].label, "sadness");

        let flat = r#"[{"label":"anger","score":0.1},{"label":"love","score":0.9}]"#;
        let Outcome::Scores(scores) = interpret(flat.as_bytes()) else {
            panic!("expected scores");
        };
        assert_eq!(scores[0].label, "love");
    }

    #[tokio::test]
    async fn model_loading_is_retried() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(LOADING.into()),
            Ok(LOADING.into()),
            Ok(SCORES.into()),
        ]));
        let scores = classifier(transport.clone()).classify("I feel great").await.unwrap();
        assert_eq!(scores[0].label, "joy");
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn loading_forever_gives_up() {
        let transport = Arc::new(ScriptedTransport::new((0..5).map(|_| Ok(LOADING.into())).collect()));
        let err = classifier(transport.clone()).classify("hm").await.unwrap_err();
        assert!(matches!(err, WellnessError::Upstream { attempts: 4, .. }));
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test]
    async fn other_errors_are_terminal() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(br#"{"error":"Authorization header is invalid"}"#.to_vec())]));
        let err = classifier(transport.clone()).classify("hm").await.unwrap_err();
        assert!(matches!(err, WellnessError::Upstream { attempts: 1, .. }));
        assert_eq!(transport.calls(), 1);
    }
}
