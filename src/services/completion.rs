use crate::error::{Result, WellnessError};
use crate::services::http::HttpTransport;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{sleep, Duration};

const SYSTEM_ROLE: &str = "You are a helpful assistant.";

#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl<T: TextCompletion + ?Sized> TextCompletion for Arc<T> {
    async fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt).await
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChatSuccess {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Interprets a chat-completion response body. The error schema is checked
/// first: a body that carries `error` is a failure even if it also has
/// `choices`.
fn decode_completion(body: &[u8]) -> std::result::Result<String, String> {
    if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) {
        let err = envelope.error;
        return Err(format!(
            "{} (type={}, code={})",
            err.message,
            err.kind.as_deref().unwrap_or("unknown"),
            err.code.map(|c| c.to_string()).unwrap_or_else(|| "none".into())
        ));
    }

    let success: ChatSuccess =
        serde_json::from_slice(body).map_err(|e| format!("undecodable response: {e}"))?;
    Ok(success
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default())
}

pub struct CompletionClient {
    transport: Arc<dyn HttpTransport>,
    endpoint: String,
    api_key: String,
    model: String,
    max_retries: u32,
    backoff: Duration,
}

impl CompletionClient {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: &str, api_key: String, model: String) -> Self {
        Self {
            transport,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model,
            max_retries: 3,
            backoff: Duration::from_secs(1),
        }
    }

    pub fn with_retry(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff = backoff;
        self
    }

    fn request_body(&self, prompt: &str) -> Result<serde_json::Value> {
        let build = |e: async_openai::error::OpenAIError| {
            WellnessError::Transport(format!("could not build completion request: {e}"))
        };

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_ROLE)
                .build()
                .map_err(build)?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(build)?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(build)?;

        Ok(serde_json::to_value(&request)?)
    }
}

#[async_trait]
impl TextCompletion for CompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = self.request_body(prompt)?;
        let mut attempts = 0;

        loop {
            attempts += 1;
            let outcome = match self.transport.post_json(&self.endpoint, &self.api_key, &body).await {
                Ok(bytes) => decode_completion(&bytes),
                Err(err) => Err(err.to_string()),
            };

            match outcome {
                Ok(content) => return Ok(content),
                Err(reason) => {
                    if attempts > self.max_retries {
                        tracing::error!("Completion failed after {} attempts: {}", attempts, reason);
                        return Err(WellnessError::Upstream {
                            attempts,
                            message: reason,
                        });
                    }
                    tracing::warn!(
                        "Completion attempt {} failed ({}), retrying; {} left",
                        attempts,
                        reason,
                        self.max_retries + 1 - attempts
                    );
                    sleep(self.backoff).await;
                }
            }
        }
    }
}

/// Default number of prompts a `MemoizedCompletion` remembers.
pub const MEMO_CAPACITY: usize = 64;

/// Best-effort memoization keyed by the exact prompt text. Only for
/// callers where a repeated prompt may legitimately reuse the last answer.
/// Holds at most `capacity` answers; the oldest is evicted first.
pub struct MemoizedCompletion<C> {
    inner: C,
    capacity: usize,
    cache: RwLock<Memo>,
}

#[derive(Default)]
struct Memo {
    answers: HashMap<String, String>,
    order: VecDeque<String>,
}

impl Memo {
    fn insert(&mut self, prompt: String, answer: String, capacity: usize) {
        if self.answers.insert(prompt.clone(), answer).is_none() {
            self.order.push_back(prompt);
        }
        while self.order.len() > capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.answers.remove(&oldest);
            }
        }
    }
}

impl<C: TextCompletion> MemoizedCompletion<C> {
    pub fn new(inner: C) -> Self {
        Self::with_capacity(inner, MEMO_CAPACITY)
    }

    pub fn with_capacity(inner: C, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
            cache: RwLock::new(Memo::default()),
        }
    }
}

#[async_trait]
impl<C: TextCompletion> TextCompletion for MemoizedCompletion<C> {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if let Some(hit) = self.cache.read().await.answers.get(prompt) {
            tracing::debug!("Completion cache hit ({} chars)", prompt.len());
            return Ok(hit.clone());
        }
        let content = self.inner.complete(prompt).await?;
        self.cache
            .write()
            .await
            .insert(prompt.to_string(), content.clone(), self.capacity);
        Ok(content)
    }
}

pub async fn summarize(client: &dyn TextCompletion, text: &str) -> Result<String> {
    let prompt = format!("Summarize the following text in no more than 15 words:\n\n{text}\n\nSummary:");
    Ok(client.complete(&prompt).await?.trim().to_string())
}
