use crate::error::{Result, WellnessError};
use async_trait::async_trait;

/// POSTs a JSON body and hands back the raw response bytes, whatever the
/// status code. Interpreting the payload is the caller's job: both AI
/// endpoints report errors in the body.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(&self, url: &str, bearer: &str, body: &serde_json::Value) -> Result<Vec<u8>>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: std::time::Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WellnessError::Transport(format!("http client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, url: &str, bearer: &str, body: &serde_json::Value) -> Result<Vec<u8>> {
        let resp = self
            .client
            .post(url)
            .bearer_auth(bearer)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;
        tracing::debug!("POST {} -> {} ({} bytes)", url, status, bytes.len());
        Ok(bytes.to_vec())
    }
}
