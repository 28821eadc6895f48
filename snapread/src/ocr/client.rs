use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::config::VisionConfig;
use crate::error::{Result, SnapreadError};

use super::types::ReadOperation;

/// Seam between the poller and the Read API wire protocol.
#[async_trait]
pub trait OcrApi: Send + Sync {
    /// Submits an image URL for analysis and returns the operation-location
    /// string identifying the asynchronous operation.
    async fn submit(&self, image_url: &str) -> Result<String>;

    /// Fetches the current state of a previously submitted operation.
    async fn fetch(&self, operation_id: &str) -> Result<ReadOperation>;
}

#[derive(Clone, Debug)]
pub struct VisionClient {
    client: Client,
    subscription_key: String,
    endpoint: String,
}

impl VisionClient {
    pub fn new(config: &VisionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SnapreadError::Ocr(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            subscription_key: config.subscription_key.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl OcrApi for VisionClient {
    async fn submit(&self, image_url: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/vision/v3.2/read/analyze", self.endpoint))
            .header("Ocp-Apim-Subscription-Key", &self.subscription_key)
            .json(&json!({ "url": image_url }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SnapreadError::Ocr(format!(
                "read submission failed: {status} - {body}"
            )));
        }

        response
            .headers()
            .get("Operation-Location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| {
                SnapreadError::Ocr("read submission returned no Operation-Location".to_string())
            })
    }

    async fn fetch(&self, operation_id: &str) -> Result<ReadOperation> {
        let response = self
            .client
            .get(format!(
                "{}/vision/v3.2/read/analyzeResults/{operation_id}",
                self.endpoint
            ))
            .header("Ocp-Apim-Subscription-Key", &self.subscription_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SnapreadError::Ocr(format!(
                "read result fetch failed: {status} - {body}"
            )));
        }

        let operation = response
            .json::<ReadOperation>()
            .await
            .map_err(|e| SnapreadError::Ocr(format!("Failed to parse read result: {e}")))?;

        Ok(operation)
    }
}
