use std::time::Duration;

use async_trait::async_trait;
use nanoid::nanoid;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::config::StorageConfig;
use crate::error::{Result, SnapreadError};

use super::{ImageStore, StoredImage};

/// Azure Blob REST client scoped to one SAS-authorized container.
#[derive(Clone, Debug)]
pub struct BlobImageStore {
    client: Client,
    /// Container URL without the SAS query string.
    container_url: String,
    /// SAS token appended to every blob operation.
    sas_query: Option<String>,
    public_base_url: String,
}

fn blob_name() -> String {
    format!(
        "image-{}-{}.png",
        chrono::Utc::now().timestamp_millis(),
        nanoid!(6)
    )
}

impl BlobImageStore {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let (container_url, sas_query) = match config.sas_url.split_once('?') {
            Some((base, query)) => (base.to_string(), Some(query.to_string())),
            None => (config.sas_url.clone(), None),
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SnapreadError::Storage(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            container_url: container_url.trim_end_matches('/').to_string(),
            sas_query,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn blob_url(&self, name: &str) -> String {
        match &self.sas_query {
            Some(query) => format!("{}/{}?{}", self.container_url, name, query),
            None => format!("{}/{}", self.container_url, name),
        }
    }
}

#[async_trait]
impl ImageStore for BlobImageStore {
    async fn upload(&self, image: &[u8]) -> Result<StoredImage> {
        let name = blob_name();

        let response = self
            .client
            .put(self.blob_url(&name))
            .header("x-ms-blob-type", "BlockBlob")
            .header("Content-Type", "image/png")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| SnapreadError::Storage(format!("blob upload failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SnapreadError::Storage(format!(
                "blob upload failed: {status} - {body}"
            )));
        }

        let url = format!("{}/{}", self.public_base_url, name);
        debug!(blob = %name, "image uploaded to storage");
        Ok(StoredImage { name, url })
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.blob_url(name))
            .send()
            .await
            .map_err(|e| SnapreadError::Storage(format!("blob delete failed: {e}")))?;

        // A blob that is already gone counts as deleted.
        if response.status() == StatusCode::NOT_FOUND {
            debug!(blob = %name, "blob already absent on delete");
            return Ok(());
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SnapreadError::Storage(format!(
                "blob delete failed: {status} - {body}"
            )));
        }

        debug!(blob = %name, "image deleted from storage");
        Ok(())
    }
}
