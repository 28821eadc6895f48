//! Transient object storage for in-flight images.
//!
//! An uploaded image lives exactly as long as the request that created it:
//! the pipeline uploads, hands the public URL to the OCR backend, and
//! deletes the blob on every exit path. Deleting an already-gone blob is not
//! an error.

mod blob;

use async_trait::async_trait;

pub use blob::BlobImageStore;

use crate::error::Result;

/// Handle to one transient upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Deletable object name, unique per request.
    pub name: String,
    /// Publicly retrievable URL handed to the OCR backend.
    pub url: String,
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, image: &[u8]) -> Result<StoredImage>;

    /// Best-effort delete. Implementations must treat a missing object as
    /// success; the caller treats any surfaced fault as non-fatal cleanup
    /// noise.
    async fn delete(&self, name: &str) -> Result<()>;
}
