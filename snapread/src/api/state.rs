use std::sync::Arc;

use crate::config::Config;
use crate::ocr::{OcrApi, OcrPoller};
use crate::origin::OriginPolicy;
use crate::pipeline::RecognitionPipeline;
use crate::ratelimit::RateLimiter;
use crate::storage::ImageStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<RecognitionPipeline>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ImageStore>, ocr: Arc<dyn OcrApi>) -> Self {
        let origin = OriginPolicy::new(config.origins.allowed.iter().cloned());
        let limiter = RateLimiter::from_limits(&config.limits);
        let poller = OcrPoller::from_config(ocr, &config.vision);
        let pipeline = RecognitionPipeline::new(
            origin,
            limiter,
            store,
            poller,
            config.limits.max_image_bytes,
        );

        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }
}
