use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

/// The blob-storage seam: store bytes at a key, get back a retrievable URL.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn put(&self, key: &str, content_type: &str, bytes: Bytes) -> Result<Url>;
}
