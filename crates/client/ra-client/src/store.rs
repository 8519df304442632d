//! Transport over the `object_store` crate.

use crate::S3ClientConfig;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ClientOptions, ObjectStore};
use parking_lot::RwLock;
use ra_error::{RaError, Result};
use ra_traits::ObjectClient;
use ra_types::{ObjectMetadata, ObjectUri, Range};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// HTTP client options for S3 connection pooling.
///
/// Sized for many concurrent ranged GETs against the same host.
fn create_s3_client_options() -> ClientOptions {
    ClientOptions::new()
        .with_pool_max_idle_per_host(100)
        .with_pool_idle_timeout(Duration::from_secs(90))
        // Ranges are bounded, so requests are short
        .with_timeout(Duration::from_secs(60))
        .with_connect_timeout(Duration::from_secs(10))
        .with_http2_keep_alive_interval(Duration::from_secs(30))
        .with_http2_keep_alive_timeout(Duration::from_secs(20))
        .with_http2_keep_alive_while_idle()
}

enum Stores {
    /// Every bucket resolves to the same store.
    Fixed(Arc<dyn ObjectStore>),

    /// One S3 store per bucket, created on first use.
    PerBucket {
        config: S3ClientConfig,
        cache: RwLock<HashMap<String, Arc<dyn ObjectStore>>>,
    },
}

/// [`ObjectClient`] backed by `object_store`.
pub struct ObjectStoreClient {
    stores: Stores,
}

impl ObjectStoreClient {
    /// Resolve every object against `store`, ignoring the bucket.
    pub fn with_store(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            stores: Stores::Fixed(store),
        }
    }

    /// Build S3 stores per bucket from `config`.
    ///
    /// Without credentials requests are unsigned, which works for public buckets.
    pub fn s3(config: S3ClientConfig) -> Self {
        Self {
            stores: Stores::PerBucket {
                config,
                cache: RwLock::new(HashMap::new()),
            },
        }
    }

    /// The store serving `bucket`.
    pub fn store_for(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        let (config, cache) = match &self.stores {
            Stores::Fixed(store) => return Ok(Arc::clone(store)),
            Stores::PerBucket { config, cache } => (config, cache),
        };

        if let Some(store) = cache.read().get(bucket) {
            return Ok(Arc::clone(store));
        }

        let mut cache = cache.write();
        // Another caller may have built it while we waited
        if let Some(store) = cache.get(bucket) {
            return Ok(Arc::clone(store));
        }

        debug!(bucket, region = %config.region, "Creating S3 object store");
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(bucket)
            .with_region(&config.region)
            .with_client_options(create_s3_client_options());

        if let Some((access_key, secret_key)) = config.credentials() {
            builder = builder
                .with_access_key_id(access_key)
                .with_secret_access_key(secret_key);
            if let Some(token) = &config.session_token {
                builder = builder.with_token(token);
            }
        } else {
            builder = builder.with_skip_signature(true);
        }

        if let Some(endpoint) = &config.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(true)
                .with_virtual_hosted_style_request(false);
        }

        let store: Arc<dyn ObjectStore> = Arc::new(builder.build().map_err(|e| {
            RaError::Config(format!("Failed to create S3 object store for {}: {}", bucket, e))
        })?);
        cache.insert(bucket.to_string(), Arc::clone(&store));
        Ok(store)
    }
}

fn map_error(uri: &ObjectUri, error: object_store::Error) -> RaError {
    match error {
        object_store::Error::NotFound { .. } => RaError::NotFound(uri.to_string()),
        other => RaError::Transport(format!("{}: {}", uri, other)),
    }
}

#[async_trait]
impl ObjectClient for ObjectStoreClient {
    async fn head_object(&self, uri: &ObjectUri) -> Result<ObjectMetadata> {
        let store = self.store_for(&uri.bucket)?;
        let meta = store
            .head(&ObjectPath::from(uri.key.as_str()))
            .await
            .map_err(|e| map_error(uri, e))?;

        let mut metadata = ObjectMetadata::new(meta.size as u64);
        if let Some(etag) = meta.e_tag {
            metadata = metadata.with_etag(etag);
        }
        Ok(metadata)
    }

    async fn get_object_range(&self, uri: &ObjectUri, range: Range) -> Result<Bytes> {
        trace!(uri = %uri, range = %range, "GET");
        let store = self.store_for(&uri.bucket)?;
        store
            .get_range(
                &ObjectPath::from(uri.key.as_str()),
                range.start() as usize..range.end() as usize + 1,
            )
            .await
            .map_err(|e| map_error(uri, e))
    }
}

impl std::fmt::Debug for ObjectStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.stores {
            Stores::Fixed(store) => f
                .debug_struct("ObjectStoreClient")
                .field("store", &store.to_string())
                .finish(),
            Stores::PerBucket { config, cache } => f
                .debug_struct("ObjectStoreClient")
                .field("config", config)
                .field("buckets", &cache.read().len())
                .finish(),
        }
    }
}
