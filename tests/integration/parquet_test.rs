//! Columnar read path tests over real Parquet files.

use crate::common::{generate_test_parquet, in_memory};
use parquet::file::metadata::ParquetMetaDataReader;
use ra_logical::LogicalIoConfig;
use ra_logical::parquet::{FOOTER_LENGTH, footer_length};
use ra_stream::{SeekableStream, SeekableStreamFactory, StreamConfig};
use ra_types::{ObjectFormat, ObjectUri};

fn uri(key: &str) -> ObjectUri {
    ObjectUri::new("bucket", key)
}

/// Read the footer the way a Parquet reader does: trailer first, then the
/// metadata block.
async fn read_footer(stream: &SeekableStream) -> Vec<u8> {
    let mut trailer = [0u8; FOOTER_LENGTH];
    stream.read_tail(&mut trailer).await.unwrap();
    let mut footer = vec![0u8; footer_length(&trailer).unwrap()];
    stream.read_tail(&mut footer).await.unwrap();
    footer
}

/// No whole-object prefetch and a small tail, so column reads go upstream.
fn column_config() -> StreamConfig {
    StreamConfig::new().with_logical(
        LogicalIoConfig::new()
            .with_small_object_prefetching(false, 0)
            .with_footer_caching(true, 16 * 1024),
    )
}

#[tokio::test]
async fn test_footer_parsed_once_and_reused() {
    let data = generate_test_parquet(10_000, 4);
    let client = in_memory(vec![("table.parquet", data.clone())]).await;
    let factory = SeekableStreamFactory::new(client.clone(), StreamConfig::default()).unwrap();

    let first = factory.create_stream(uri("table.parquet")).unwrap();
    assert_eq!(first.format(), ObjectFormat::ColumnarParquet);
    let footer = read_footer(&first).await;
    first.wait_for_prefetches().await;

    // The footer bytes are a valid Parquet footer
    let metadata_len = footer.len() - FOOTER_LENGTH;
    let metadata = ParquetMetaDataReader::decode_metadata(&footer[..metadata_len]).unwrap();
    assert_eq!(metadata.num_row_groups(), 4);

    let store = factory.column_prefetch_store();
    let mappers = store.column_mappers(&uri("table.parquet")).unwrap();
    assert_eq!(mappers.columns_named("id").len(), 4);
    assert_eq!(mappers.columns_named("name").len(), 4);
    assert_eq!(mappers.len(), 12);

    let gets = client.get_count();
    let second = factory.create_stream(uri("table.parquet")).unwrap();
    assert_eq!(read_footer(&second).await, footer);
    second.wait_for_prefetches().await;

    assert_eq!(store.claims_granted(), 1);
    assert_eq!(client.get_count(), gets);
    assert_eq!(client.head_count(), 1);
}

#[tokio::test]
async fn test_small_file_prefetched_on_open() {
    let data = generate_test_parquet(1_000, 1);
    let client = in_memory(vec![("small.parquet", data.clone())]).await;
    let factory = SeekableStreamFactory::new(client.clone(), StreamConfig::default()).unwrap();

    let stream = factory.create_stream(uri("small.parquet")).unwrap();
    stream.wait_for_prefetches().await;
    assert_eq!(client.get_count(), 1);

    let mut buf = vec![0u8; data.len()];
    stream.read_at(0, &mut buf).await.unwrap();
    read_footer(&stream).await;
    assert_eq!(buf, data);
    assert_eq!(client.get_count(), 1);
}

#[tokio::test]
async fn test_partial_column_read_prefetches_rest_of_chunk() {
    let data = generate_test_parquet(20_000, 2);
    let client = in_memory(vec![("wide.parquet", data.clone())]).await;
    let factory = SeekableStreamFactory::new(client.clone(), column_config()).unwrap();

    let stream = factory.create_stream(uri("wide.parquet")).unwrap();
    read_footer(&stream).await;
    stream.wait_for_prefetches().await;

    let mappers = factory
        .column_prefetch_store()
        .column_mappers(&uri("wide.parquet"))
        .unwrap();
    let chunk = mappers.columns_named("name")[0].clone();
    assert!(chunk.compressed_size > 64);

    let mut head = [0u8; 64];
    stream.read_at(chunk.start_offset, &mut head).await.unwrap();
    stream.wait_for_prefetches().await;

    // The rest of the chunk is already cached
    let gets = client.get_count();
    let mut whole = vec![0u8; chunk.compressed_size as usize];
    stream.read_at(chunk.start_offset, &mut whole).await.unwrap();
    assert_eq!(client.get_count(), gets);

    let start = chunk.start_offset as usize;
    assert_eq!(&whole[..], &data[start..start + whole.len()]);
}

#[tokio::test]
async fn test_remaining_column_prefetch_disabled() {
    let data = generate_test_parquet(20_000, 2);
    let client = in_memory(vec![("wide.parquet", data.clone())]).await;
    let mut config = column_config();
    config.logical = config.logical.with_remaining_column_prefetch(false);
    let factory = SeekableStreamFactory::new(client.clone(), config).unwrap();

    let stream = factory.create_stream(uri("wide.parquet")).unwrap();
    read_footer(&stream).await;
    stream.wait_for_prefetches().await;

    let mappers = factory
        .column_prefetch_store()
        .column_mappers(&uri("wide.parquet"))
        .unwrap();
    let chunk = mappers.columns_named("id")[0].clone();

    let mut head = [0u8; 8];
    stream.read_at(chunk.start_offset, &mut head).await.unwrap();
    stream.wait_for_prefetches().await;

    let gets = client.get_count();
    let mut whole = vec![0u8; chunk.compressed_size as usize];
    stream.read_at(chunk.start_offset, &mut whole).await.unwrap();
    assert_eq!(client.get_count(), gets + 1);
}

#[tokio::test]
async fn test_corrupt_footer_degrades_to_plain_reads() {
    let mut data = generate_test_parquet(1_000, 1);
    let len = data.len();
    // Keep the magic, claim a footer longer than the file
    data[len - 8..len - 4].copy_from_slice(&u32::MAX.to_le_bytes());
    let client = in_memory(vec![("broken.parquet", data.clone())]).await;
    let factory = SeekableStreamFactory::new(client.clone(), StreamConfig::default()).unwrap();

    let stream = factory.create_stream(uri("broken.parquet")).unwrap();
    let mut trailer = [0u8; FOOTER_LENGTH];
    stream.read_tail(&mut trailer).await.unwrap();
    stream.wait_for_prefetches().await;

    assert!(!factory.column_prefetch_store().contains(&uri("broken.parquet")));

    let mut buf = vec![0u8; 100];
    stream.read_at(0, &mut buf).await.unwrap();
    assert_eq!(&buf[..], &data[..100]);
}
