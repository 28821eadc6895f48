use std::env;

use url::Url;

use crate::error::{Result, SnapreadError};

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn require_env(var: &str) -> Result<String> {
    env::var(var)
        .map_err(|_| SnapreadError::Config(format!("required environment variable {var} is not set")))
}

fn require_url(var: &str) -> Result<String> {
    let raw = require_env(var)?;
    Url::parse(&raw).map_err(|e| SnapreadError::Config(format!("{var} is not a valid URL: {e}")))?;
    Ok(raw)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub vision: VisionConfig,
    pub storage: StorageConfig,
    pub limits: LimitsConfig,
    pub origins: OriginConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Read-API collaborator settings. Key and endpoint are startup-fatal when
/// absent; a misconfigured process never surfaces them as per-request errors.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub subscription_key: String,
    pub endpoint: String,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Container URL carrying the SAS token in its query string.
    pub sas_url: String,
    /// Public base URL under which uploaded blobs are readable.
    pub public_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    pub max_image_bytes: usize,
    pub rate_window_ms: u64,
    pub rate_max_requests: usize,
    pub rate_gc_threshold: usize,
}

#[derive(Debug, Clone)]
pub struct OriginConfig {
    pub allowed: Vec<String>,
}

impl LimitsConfig {
    /// Raw request-body ceiling handed to the framework: the decoded cap
    /// inflated by the 4/3 base64 expansion plus slack for the JSON envelope.
    pub fn max_body_bytes(&self) -> usize {
        self.max_image_bytes / 3 * 4 + 64 * 1024
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig {
                host: env::var("SNAPREAD_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("SNAPREAD_PORT", 3000),
            },
            vision: VisionConfig {
                subscription_key: require_env("AZURE_COMPUTER_VISION_KEY")?,
                endpoint: require_url("AZURE_COMPUTER_VISION_ENDPOINT")?,
                poll_interval_ms: parse_env_or("OCR_POLL_INTERVAL_MS", 1000),
                max_poll_attempts: parse_env_or("OCR_MAX_POLL_ATTEMPTS", 30),
                timeout_secs: parse_env_or("HTTP_TIMEOUT_SECS", 30),
            },
            storage: StorageConfig {
                sas_url: require_url("AZURE_BLOB_SAS_URL")?,
                public_base_url: require_url("AZURE_IMAGES_URL")?,
                timeout_secs: parse_env_or("HTTP_TIMEOUT_SECS", 30),
            },
            limits: LimitsConfig {
                max_image_bytes: parse_env_or("MAX_IMAGE_BYTES", 10 * 1024 * 1024),
                rate_window_ms: parse_env_or("RATE_WINDOW_MS", 60_000),
                rate_max_requests: parse_env_or("RATE_MAX_REQUESTS", 10),
                rate_gc_threshold: parse_env_or("RATE_GC_THRESHOLD", 1000),
            },
            origins: OriginConfig {
                allowed: env::var("ALLOWED_ORIGINS")
                    .map(|v| {
                        v.split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
            },
        })
    }
}
