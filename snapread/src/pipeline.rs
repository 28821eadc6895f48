//! Request pipeline: origin check → rate limit → validate → upload →
//! recognize → cleanup → respond.
//!
//! The pipeline is transport-agnostic; the axum layer adapts requests into
//! [`PipelineRequest`] and [`PipelineReply`] back into responses. All
//! collaborators are injected so tests can run the whole flow with fakes.

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Result, SnapreadError};
use crate::ocr::{flatten_text, OcrPoller};
use crate::origin::OriginPolicy;
use crate::ratelimit::RateLimiter;
use crate::storage::ImageStore;

#[derive(Debug, Deserialize)]
struct RecognizePayload {
    image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub method: Method,
    pub origin: Option<String>,
    pub client_id: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReply {
    pub status: StatusCode,
    /// Origin to echo in CORS headers; `None` suppresses them.
    pub allow_origin: Option<String>,
    pub body: String,
}

pub struct RecognitionPipeline {
    origin: OriginPolicy,
    limiter: RateLimiter,
    store: Arc<dyn ImageStore>,
    poller: OcrPoller,
    max_image_bytes: usize,
}

impl RecognitionPipeline {
    pub fn new(
        origin: OriginPolicy,
        limiter: RateLimiter,
        store: Arc<dyn ImageStore>,
        poller: OcrPoller,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            origin,
            limiter,
            store,
            poller,
            max_image_bytes,
        }
    }

    pub async fn handle(&self, request: PipelineRequest) -> PipelineReply {
        let decision = self.origin.evaluate(request.origin.as_deref());
        if !decision.allow {
            let err = SnapreadError::OriginRejected;
            return PipelineReply {
                status: err.status(),
                allow_origin: None,
                body: err.response_body(),
            };
        }
        let allow_origin = decision.allowed_origin;

        // Pre-flight short-circuits once headers are decided.
        if request.method == Method::OPTIONS {
            return PipelineReply {
                status: StatusCode::OK,
                allow_origin,
                body: String::new(),
            };
        }

        if !self.limiter.admit(&request.client_id) {
            info!(client = %request.client_id, "rate limit exceeded");
            let err = SnapreadError::RateLimited;
            return PipelineReply {
                status: err.status(),
                allow_origin,
                body: err.response_body(),
            };
        }

        match self.process(&request).await {
            Ok(text) => PipelineReply {
                status: StatusCode::OK,
                allow_origin,
                body: text,
            },
            Err(err) => {
                warn!(client = %request.client_id, error = %err, "recognition request failed");
                PipelineReply {
                    status: err.status(),
                    allow_origin,
                    body: err.response_body(),
                }
            }
        }
    }

    async fn process(&self, request: &PipelineRequest) -> Result<String> {
        let image = self.validate(request)?;

        let stored = self.store.upload(&image).await?;
        info!(blob = %stored.name, bytes = image.len(), "image uploaded to storage");

        // Recognition outcome is captured so the delete below runs on every
        // exit path once the upload has succeeded.
        let outcome = self.recognize(&stored.url).await;

        if let Err(e) = self.store.delete(&stored.name).await {
            warn!(blob = %stored.name, error = %e, "cleanup delete failed");
        }

        outcome
    }

    fn validate(&self, request: &PipelineRequest) -> Result<Vec<u8>> {
        if request.method != Method::POST {
            return Err(SnapreadError::Validation(
                "No image found in request body.".to_string(),
            ));
        }

        let payload: RecognizePayload = serde_json::from_slice(&request.body)
            .map_err(|_| SnapreadError::Validation("No image found in request body.".to_string()))?;

        let encoded = payload
            .image
            .filter(|image| !image.is_empty())
            .ok_or_else(|| {
                SnapreadError::Validation("No image found in request body.".to_string())
            })?;

        let image = STANDARD.decode(encoded.as_bytes()).map_err(|_| {
            SnapreadError::Validation("Image payload is not valid base64.".to_string())
        })?;

        if image.len() > self.max_image_bytes {
            return Err(SnapreadError::PayloadTooLarge {
                max_bytes: self.max_image_bytes,
            });
        }

        Ok(image)
    }

    async fn recognize(&self, image_url: &str) -> Result<String> {
        let result = self.poller.run(image_url).await?;
        Ok(flatten_text(&result))
    }
}
