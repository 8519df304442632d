//! Transport over the AWS SDK.

use crate::S3ClientConfig;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::SdkError;
use bytes::Bytes;
use ra_error::{RaError, Result};
use ra_traits::ObjectClient;
use ra_types::{ObjectMetadata, ObjectUri, Range};
use tracing::trace;

/// [`ObjectClient`] backed by `aws-sdk-s3`.
#[derive(Clone, Debug)]
pub struct S3Client {
    client: Client,
}

impl S3Client {
    /// Create a client from configuration.
    ///
    /// Credentials not given explicitly come from the default provider chain.
    pub async fn new(config: &S3ClientConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        if let Some((access_key, secret_key)) = config.credentials() {
            let credentials = aws_sdk_s3::config::Credentials::new(
                access_key,
                secret_key,
                config.session_token.clone(),
                None,
                "ra-client",
            );
            loader = loader.credentials_provider(credentials);
        }

        let sdk_config = loader.load().await;
        let builder = aws_sdk_s3::config::Builder::from(&sdk_config);

        // Custom endpoints (LocalStack) need path-style addressing
        let s3_config = if config.endpoint.is_some() {
            builder.force_path_style(true).build()
        } else {
            builder.build()
        };

        Self {
            client: Client::from_conf(s3_config),
        }
    }

    /// Wrap an already configured SDK client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn is_404<E>(error: &SdkError<E, HttpResponse>) -> bool {
    error
        .raw_response()
        .is_some_and(|r| r.status().as_u16() == 404)
}

#[async_trait]
impl ObjectClient for S3Client {
    async fn head_object(&self, uri: &ObjectUri) -> Result<ObjectMetadata> {
        let output = self
            .client
            .head_object()
            .bucket(&uri.bucket)
            .key(&uri.key)
            .send()
            .await
            .map_err(|e| {
                let missing = e.as_service_error().is_some_and(|se| se.is_not_found());
                if missing || is_404(&e) {
                    RaError::NotFound(uri.to_string())
                } else {
                    RaError::Transport(format!("HEAD {} failed: {}", uri, e))
                }
            })?;

        let mut metadata = ObjectMetadata::new(output.content_length().unwrap_or(0).max(0) as u64);
        if let Some(etag) = output.e_tag() {
            metadata = metadata.with_etag(etag);
        }
        Ok(metadata)
    }

    async fn get_object_range(&self, uri: &ObjectUri, range: Range) -> Result<Bytes> {
        trace!(uri = %uri, range = %range, "GET");

        let output = self
            .client
            .get_object()
            .bucket(&uri.bucket)
            .key(&uri.key)
            .range(format!("bytes={}-{}", range.start(), range.end()))
            .send()
            .await
            .map_err(|e| {
                let missing = e.as_service_error().is_some_and(|se| se.is_no_such_key());
                if missing || is_404(&e) {
                    RaError::NotFound(uri.to_string())
                } else {
                    RaError::Transport(format!("GET {} {} failed: {}", uri, range, e))
                }
            })?;

        let body = output.body.collect().await.map_err(|e| {
            RaError::Transport(format!("Failed to read body of {} {}: {}", uri, range, e))
        })?;
        Ok(body.into_bytes())
    }
}
