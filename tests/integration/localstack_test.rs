//! Transport tests against LocalStack S3.
//!
//! Both clients are exercised through the full stream stack so that range
//! headers and error mapping are checked against a real S3 API.

use crate::common::{LocalStackTestContext, generate_test_bytes, generate_test_parquet};
use ra_client::{ObjectStoreClient, S3Client};
use ra_error::RaError;
use ra_logical::parquet::{FOOTER_LENGTH, footer_length};
use ra_stream::{SeekableStreamFactory, StreamConfig};
use ra_traits::ObjectClient;
use ra_types::{ONE_MB, ObjectUri, Range};
use std::io::SeekFrom;
use std::sync::Arc;

const BUCKET: &str = "test-read-accelerator";

async fn setup() -> Option<LocalStackTestContext> {
    let ctx = LocalStackTestContext::new().await;
    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return None;
    }
    ctx.create_bucket(BUCKET).await.unwrap();
    Some(ctx)
}

async fn clients(ctx: &LocalStackTestContext) -> Vec<(&'static str, Arc<dyn ObjectClient>)> {
    let config = ctx.client_config();
    let sdk: Arc<dyn ObjectClient> = Arc::new(S3Client::new(&config).await);
    let store: Arc<dyn ObjectClient> = Arc::new(ObjectStoreClient::s3(config));
    vec![("aws-sdk", sdk), ("object_store", store)]
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_ranged_get_is_inclusive() {
    let Some(ctx) = setup().await else { return };
    let data = generate_test_bytes(4096);
    ctx.upload(BUCKET, "range/data.bin", data.clone()).await.unwrap();
    let uri = ObjectUri::new(BUCKET, "range/data.bin");

    for (name, client) in clients(&ctx).await {
        let metadata = client.head_object(&uri).await.unwrap();
        assert_eq!(metadata.size, 4096, "{name}");

        let bytes = client
            .get_object_range(&uri, Range::new(100, 199).unwrap())
            .await
            .unwrap();
        assert_eq!(&bytes[..], &data[100..200], "{name}");
    }
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_missing_object_is_not_found() {
    let Some(ctx) = setup().await else { return };
    let uri = ObjectUri::new(BUCKET, "does/not/exist.bin");

    for (name, client) in clients(&ctx).await {
        let head = client.head_object(&uri).await;
        assert!(matches!(head, Err(RaError::NotFound(_))), "{name}: {head:?}");

        let get = client
            .get_object_range(&uri, Range::new(0, 9).unwrap())
            .await;
        assert!(matches!(get, Err(RaError::NotFound(_))), "{name}: {get:?}");
    }
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_stream_over_s3() {
    let Some(ctx) = setup().await else { return };
    let data = generate_test_bytes(12 * ONE_MB);
    ctx.upload(BUCKET, "stream/large.bin", data.clone()).await.unwrap();

    for (name, client) in clients(&ctx).await {
        let factory = SeekableStreamFactory::new(client, StreamConfig::default()).unwrap();
        let mut stream = factory
            .create_stream(ObjectUri::new(BUCKET, "stream/large.bin"))
            .unwrap();

        stream.seek(SeekFrom::End(-(ONE_MB as i64))).await.unwrap();
        let mut buf = vec![0u8; ONE_MB as usize];
        assert_eq!(stream.read(&mut buf).await.unwrap(), buf.len(), "{name}");
        assert_eq!(&buf[..], &data[(11 * ONE_MB) as usize..], "{name}");
        assert_eq!(stream.read(&mut buf).await.unwrap(), 0, "{name}");
    }
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_parquet_footer_over_s3() {
    let Some(ctx) = setup().await else { return };
    let data = generate_test_parquet(5_000, 2);
    ctx.upload(BUCKET, "parquet/table.parquet", data.clone())
        .await
        .unwrap();

    for (name, client) in clients(&ctx).await {
        let factory = SeekableStreamFactory::new(client, StreamConfig::default()).unwrap();
        let uri = ObjectUri::new(BUCKET, "parquet/table.parquet");
        let stream = factory.create_stream(uri.clone()).unwrap();

        let mut trailer = [0u8; FOOTER_LENGTH];
        stream.read_tail(&mut trailer).await.unwrap();
        assert_eq!(&trailer[..], &data[data.len() - FOOTER_LENGTH..], "{name}");
        assert!(footer_length(&trailer).unwrap() < data.len(), "{name}");
        stream.wait_for_prefetches().await;

        let mappers = factory
            .column_prefetch_store()
            .column_mappers(&uri)
            .unwrap();
        assert_eq!(mappers.columns_named("score").len(), 2, "{name}");
    }
}
