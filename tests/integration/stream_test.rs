//! End-to-end stream tests over an in-memory object store.

use crate::common::{generate_test_bytes, in_memory};
use ra_error::RaError;
use ra_stream::{SeekableStreamFactory, StreamConfig};
use ra_types::{ONE_MB, ObjectFormat, ObjectUri, OpenOptions, ReadPolicy};
use std::io::SeekFrom;
use std::sync::Arc;

fn uri(key: &str) -> ObjectUri {
    ObjectUri::new("bucket", key)
}

#[tokio::test]
async fn test_large_object_read_through_cache() {
    let size = 20 * ONE_MB;
    let data = generate_test_bytes(size);
    let client = in_memory(vec![("data.bin", data.clone())]).await;
    let factory = SeekableStreamFactory::new(client.clone(), StreamConfig::default()).unwrap();

    let mut stream = factory.create_stream(uri("data.bin")).unwrap();
    assert_eq!(stream.format(), ObjectFormat::Default);

    let mut first = vec![0u8; (8 * ONE_MB) as usize];
    assert_eq!(stream.read(&mut first).await.unwrap(), first.len());
    assert_eq!(&first[..], &data[..first.len()]);
    assert_eq!(client.get_count(), 1);

    // The first 8MB is served from cache
    stream.seek(SeekFrom::Start(0)).await.unwrap();
    stream.read(&mut first).await.unwrap();
    assert_eq!(client.get_count(), 1);

    // The remaining 12MB is fetched in pieces no larger than 8MB
    let mut rest = vec![0u8; (12 * ONE_MB) as usize];
    assert_eq!(stream.read(&mut rest).await.unwrap(), rest.len());
    assert_eq!(&rest[..], &data[first.len()..]);
    assert_eq!(client.get_count(), 3);
    assert!(
        client
            .ranges_for(&uri("data.bin"))
            .iter()
            .all(|r| r.len() <= 8 * ONE_MB)
    );

    assert_eq!(stream.read(&mut rest).await.unwrap(), 0);
    assert_eq!(client.head_count(), 1);
}

#[tokio::test]
async fn test_concurrent_streams_share_fetches() {
    let data = generate_test_bytes(4 * ONE_MB);
    let client = in_memory(vec![("shared.bin", data.clone())]).await;
    let factory =
        Arc::new(SeekableStreamFactory::new(client.clone(), StreamConfig::default()).unwrap());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let factory = Arc::clone(&factory);
        handles.push(tokio::spawn(async move {
            let stream = factory.create_stream(uri("shared.bin")).unwrap();
            let mut buf = vec![0u8; ONE_MB as usize];
            stream.read_at(ONE_MB, &mut buf).await.unwrap();
            buf
        }));
    }

    for handle in handles {
        let buf = handle.await.unwrap();
        assert_eq!(&buf[..], &data[ONE_MB as usize..2 * ONE_MB as usize]);
    }
    assert_eq!(client.head_count(), 1);
    assert_eq!(client.get_count(), 1);
}

#[tokio::test]
async fn test_sequential_read_ahead() {
    let size = 10 * ONE_MB;
    let data = generate_test_bytes(size);
    let client = in_memory(vec![("events.csv", data.clone())]).await;
    let factory = SeekableStreamFactory::new(client.clone(), StreamConfig::default()).unwrap();

    let mut stream = factory.create_stream(uri("events.csv")).unwrap();
    assert_eq!(stream.format(), ObjectFormat::Sequential);

    let mut out = Vec::with_capacity(size as usize);
    let mut buf = vec![0u8; 64 * 1024];
    let mut reads = 0;
    loop {
        let n = stream.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        reads += 1;
        out.extend_from_slice(&buf[..n]);
        // Consumer work between reads lets background read-ahead progress
        tokio::task::yield_now().await;
    }
    stream.wait_for_prefetches().await;

    assert_eq!(out, data);
    assert_eq!(reads, 160);
    assert!(
        client.get_count() < reads / 4,
        "expected read-ahead to batch fetches, got {} GETs",
        client.get_count()
    );
}

#[tokio::test]
async fn test_sequential_hint_overrides_parquet() {
    let data = generate_test_bytes(ONE_MB);
    let client = in_memory(vec![("table.parquet", data.clone())]).await;
    let factory = SeekableStreamFactory::new(client.clone(), StreamConfig::default()).unwrap();

    let mut stream = factory
        .create_stream_with(
            uri("table.parquet"),
            OpenOptions::new().with_policy(ReadPolicy::Sequential),
        )
        .unwrap();
    assert_eq!(stream.format(), ObjectFormat::Sequential);

    let mut tail = [0u8; 8];
    stream.read_tail(&mut tail).await.unwrap();
    let mut buf = vec![0u8; data.len()];
    assert_eq!(stream.read(&mut buf).await.unwrap(), data.len());
    assert_eq!(buf, data);

    stream.wait_for_prefetches().await;
    assert_eq!(factory.column_prefetch_store().claims_granted(), 0);
}

#[tokio::test]
async fn test_missing_object() {
    let client = in_memory(vec![]).await;
    let factory = SeekableStreamFactory::new(client.clone(), StreamConfig::default()).unwrap();

    let mut stream = factory.create_stream(uri("nope.bin")).unwrap();
    let mut buf = [0u8; 16];
    assert!(matches!(
        stream.read(&mut buf).await,
        Err(RaError::NotFound(_))
    ));

    // Failures are not cached
    assert!(matches!(stream.len().await, Err(RaError::NotFound(_))));
    assert_eq!(client.head_count(), 2);
}

#[tokio::test]
async fn test_factory_close() {
    let client = in_memory(vec![("data.bin", generate_test_bytes(1024))]).await;
    let factory = SeekableStreamFactory::new(client.clone(), StreamConfig::default()).unwrap();

    let mut stream = factory.create_stream(uri("data.bin")).unwrap();
    let mut buf = [0u8; 16];
    stream.read(&mut buf).await.unwrap();

    factory.close();
    assert!(matches!(
        factory.create_stream(uri("data.bin")),
        Err(RaError::Closed(_))
    ));

    stream.close();
    assert!(matches!(stream.read(&mut buf).await, Err(RaError::Closed(_))));
}
