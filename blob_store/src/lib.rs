use std::{env, ops::Range, sync::Arc};

use anyhow::Result;
use bytes::{Bytes, BytesMut};
use futures::{stream::BoxStream, Stream, StreamExt, TryStreamExt};
use object_store::{
    aws::AmazonS3ConfigKey,
    parse_url,
    parse_url_opts,
    path::Path,
    GetOptions,
    GetRange,
    ObjectStore,
    ObjectStoreScheme,
    WriteMultipart,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;
use url::Url;

mod error;
pub use error::{BlobError, BlobResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobStorageConfig {
    pub path: Option<String>,
}

impl BlobStorageConfig {
    pub fn new(path: &str) -> Self {
        BlobStorageConfig {
            path: Some(format!("file://{}", path)),
        }
    }
}

impl Default for BlobStorageConfig {
    fn default() -> Self {
        let blob_store_path = format!(
            "file://{}",
            env::current_dir()
                .unwrap()
                .join("trackstream_storage/blobs")
                .to_str()
                .unwrap()
        );
        info!("using blob store path: {}", blob_store_path);
        BlobStorageConfig {
            path: Some(blob_store_path),
        }
    }
}

/// Result of a streamed write.
#[derive(Debug, Clone)]
pub struct PutResult {
    pub url: String,
    pub size_bytes: u64,
    pub sha256_hash: String,
}

/// Object metadata reported by the store.
#[derive(Debug, Clone)]
pub struct BlobMetadata {
    pub size_bytes: u64,
}

#[derive(Clone)]
pub struct BlobStorage {
    object_store: Arc<dyn ObjectStore>,
    path: Path,
}

impl BlobStorage {
    pub fn new(config: BlobStorageConfig) -> BlobResult<Self> {
        let url = config.path.unwrap_or_else(|| {
            BlobStorageConfig::default()
                .path
                .unwrap_or_default()
        });
        let (object_store, path) = Self::build_object_store(&url)?;
        Ok(Self {
            object_store: Arc::new(object_store),
            path,
        })
    }

    pub fn build_object_store(url_str: &str) -> BlobResult<(Box<dyn ObjectStore>, Path)> {
        let url = url_str
            .parse::<Url>()
            .map_err(|e| BlobError::InvalidUrl {
                url: url_str.to_string(),
                reason: e.to_string(),
            })?;
        let (scheme, _) = ObjectStoreScheme::parse(&url).map_err(object_store::Error::from)?;
        match scheme {
            ObjectStoreScheme::AmazonS3 => {
                // AWS_* env vars are passed through as client options so
                // configured keys win over instance metadata credentials.
                let opts: Vec<(AmazonS3ConfigKey, String)> = std::env::vars_os()
                    .filter_map(|(os_key, os_value)| {
                        if let (Some(key), Some(value)) = (os_key.to_str(), os_value.to_str()) {
                            if key.starts_with("AWS_") {
                                if let Ok(config_key) = key.to_ascii_lowercase().parse() {
                                    return Some((config_key, String::from(value)));
                                }
                            }
                        }
                        None
                    })
                    .collect();
                Ok(parse_url_opts(&url, opts)?)
            }
            _ => Ok(parse_url(&url)?),
        }
    }

    /// Streams `data` into the store under `key`, hashing as it goes.
    ///
    /// Chunks are forwarded to the store as they arrive; nothing is
    /// buffered beyond the multipart writer's own in-flight window.
    pub async fn put(
        &self,
        key: &str,
        data: impl Stream<Item = Result<Bytes>> + Send + Unpin,
    ) -> BlobResult<PutResult> {
        let mut hasher = Sha256::new();
        let mut hashed_stream = data.map(|item| {
            item.map(|bytes| {
                hasher.update(&bytes);
                bytes
            })
        });

        let path = self.path.child(key);
        let m = self.object_store.put_multipart(&path).await?;
        let mut w = WriteMultipart::new(m);
        let mut size_bytes = 0;
        while let Some(chunk) = hashed_stream.next().await {
            w.wait_for_capacity(1).await?;
            let chunk = chunk?;
            size_bytes += chunk.len() as u64;
            w.write(&chunk);
        }
        w.finish().await?;

        let hash = format!("{:x}", hasher.finalize());
        Ok(PutResult {
            url: path.to_string(),
            size_bytes,
            sha256_hash: hash,
        })
    }

    /// Opens a read cursor over the object at `path`, optionally scoped to
    /// a half-open byte range.
    ///
    /// The returned stream is the store client's own response stream;
    /// chunks are fetched only as the consumer polls for them, in object
    /// order.
    pub async fn get(
        &self,
        path: &str,
        range: Option<Range<u64>>,
    ) -> BlobResult<BoxStream<'static, BlobResult<Bytes>>> {
        let path = Path::from(path);
        let result = match range {
            Some(range) => {
                let options = GetOptions {
                    range: Some(GetRange::Bounded(range)),
                    ..Default::default()
                };
                self.object_store.get_opts(&path, options).await?
            }
            None => self.object_store.get(&path).await?,
        };
        Ok(result.into_stream().map_err(BlobError::from).boxed())
    }

    pub async fn head(&self, path: &str) -> BlobResult<BlobMetadata> {
        let meta = self.object_store.head(&Path::from(path)).await?;
        Ok(BlobMetadata {
            size_bytes: meta.size,
        })
    }

    pub async fn delete(&self, path: &str) -> BlobResult<()> {
        self.object_store.delete(&Path::from(path)).await?;
        Ok(())
    }

    pub async fn read_bytes(&self, path: &str) -> BlobResult<Bytes> {
        let mut reader = self.get(path, None).await?;
        let mut bytes = BytesMut::new();
        while let Some(chunk) = reader.next().await {
            bytes.extend_from_slice(&chunk?);
        }
        Ok(bytes.into())
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;
    use sha2::{Digest, Sha256};
    use tempfile::TempDir;

    use super::*;

    fn test_storage(temp_dir: &TempDir) -> BlobStorage {
        let config = BlobStorageConfig::new(temp_dir.path().to_str().unwrap());
        BlobStorage::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = test_storage(&temp_dir);

        let data = vec![Ok(Bytes::from("hello ")), Ok(Bytes::from("world"))];
        let res = storage.put("test.mp3", stream::iter(data)).await.unwrap();
        assert_eq!(res.size_bytes, 11);
        let expected_hash = format!("{:x}", Sha256::digest(b"hello world"));
        assert_eq!(res.sha256_hash, expected_hash);

        let full = storage.read_bytes(&res.url).await.unwrap();
        assert_eq!(&full[..], b"hello world");
    }

    #[tokio::test]
    async fn test_get_range() {
        let temp_dir = TempDir::new().unwrap();
        let storage = test_storage(&temp_dir);

        let data = vec![Ok(Bytes::from("hello world"))];
        let res = storage.put("test.txt", stream::iter(data)).await.unwrap();

        let mut download = storage.get(&res.url, Some(6..11)).await.unwrap();
        let mut out = Vec::new();
        while let Some(chunk) = download.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(out, b"world");
    }

    #[tokio::test]
    async fn test_head_reports_length() {
        let temp_dir = TempDir::new().unwrap();
        let storage = test_storage(&temp_dir);

        let data = vec![Ok(Bytes::from("hello world"))];
        let res = storage.put("test.txt", stream::iter(data)).await.unwrap();

        let meta = storage.head(&res.url).await.unwrap();
        assert_eq!(meta.size_bytes, 11);
    }

    #[tokio::test]
    async fn test_subrange_reconstruction() {
        let temp_dir = TempDir::new().unwrap();
        let storage = test_storage(&temp_dir);

        // ragged tail so spans never line up with the written chunks
        let mut chunks: Vec<Result<Bytes>> = (0..100)
            .map(|i| Ok(Bytes::from(vec![i as u8; 1024])))
            .collect();
        chunks.push(Ok(Bytes::from(vec![7u8; 37])));
        let res = storage.put("large.bin", stream::iter(chunks)).await.unwrap();
        assert_eq!(res.size_bytes, 102_437);

        let full = storage.read_bytes(&res.url).await.unwrap();

        let total = res.size_bytes;
        let mut rebuilt = Vec::new();
        let mut start = 0u64;
        while start < total {
            let end = std::cmp::min(start + 7777, total);
            let mut span = storage.get(&res.url, Some(start..end)).await.unwrap();
            while let Some(chunk) = span.next().await {
                rebuilt.extend_from_slice(&chunk.unwrap());
            }
            start = end;
        }
        assert_eq!(rebuilt.as_slice(), &full[..]);
    }

    #[tokio::test]
    async fn test_delete_then_read_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let storage = test_storage(&temp_dir);

        let data = vec![Ok(Bytes::from("hello world"))];
        let res = storage.put("test.txt", stream::iter(data)).await.unwrap();

        storage.delete(&res.url).await.unwrap();
        let err = storage.read_bytes(&res.url).await.err().unwrap();
        assert!(matches!(err, BlobError::NotFound { .. }));
        let err = storage.head(&res.url).await.err().unwrap();
        assert!(matches!(err, BlobError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_missing_object() {
        let temp_dir = TempDir::new().unwrap();
        let storage = test_storage(&temp_dir);

        let err = storage
            .get("definitely/missing.mp3", None)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, BlobError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_streaming_put_counts_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let storage = test_storage(&temp_dir);

        let chunks: Vec<Result<Bytes>> = (0..100)
            .map(|_| Ok(Bytes::from(vec![0u8; 1024])))
            .collect();
        let res = storage
            .put("large.bin", stream::iter(chunks))
            .await
            .unwrap();
        assert_eq!(res.size_bytes, 102_400);
    }
}
