use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::VisionConfig;
use crate::error::{Result, SnapreadError};

use super::client::OcrApi;
use super::types::{AnalyzeResult, OperationStatus};

/// Drives one image through the submit-then-poll protocol.
pub struct OcrPoller {
    api: Arc<dyn OcrApi>,
    interval: Duration,
    max_attempts: u32,
}

/// The operation identifier is the trailing path segment of the
/// operation-location string returned on submission.
fn operation_id_from_location(location: &str) -> Result<String> {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            SnapreadError::Ocr(format!(
                "could not extract operation id from location '{location}'"
            ))
        })
}

impl OcrPoller {
    pub fn new(api: Arc<dyn OcrApi>, interval: Duration, max_attempts: u32) -> Self {
        Self {
            api,
            interval,
            max_attempts,
        }
    }

    pub fn from_config(api: Arc<dyn OcrApi>, config: &VisionConfig) -> Self {
        Self::new(
            api,
            Duration::from_millis(config.poll_interval_ms),
            config.max_poll_attempts,
        )
    }

    /// Submits `image_url` and polls until the operation is terminal or the
    /// attempt ceiling is reached.
    pub async fn run(&self, image_url: &str) -> Result<AnalyzeResult> {
        let location = self.api.submit(image_url).await?;
        let operation_id = operation_id_from_location(&location)?;
        debug!(operation = %operation_id, "read operation submitted");

        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(self.interval).await;
            let operation = self.api.fetch(&operation_id).await?;

            match operation.status {
                OperationStatus::Succeeded => {
                    debug!(operation = %operation_id, attempt, "read operation succeeded");
                    return operation.analyze_result.ok_or_else(|| {
                        SnapreadError::Ocr("operation succeeded without a result".to_string())
                    });
                }
                OperationStatus::Failed => {
                    return Err(SnapreadError::Ocr("analysis failed".to_string()));
                }
                OperationStatus::NotStarted | OperationStatus::Running => {
                    debug!(operation = %operation_id, attempt, "read operation still pending");
                }
            }
        }

        Err(SnapreadError::OcrTimeout {
            attempts: self.max_attempts,
        })
    }
}
