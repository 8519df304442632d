//! Common utilities for integration tests.
//!
//! Counting transport over an in-memory store, LocalStack setup and test
//! data generation.

pub mod counting;
pub mod localstack;

pub use counting::{CountingClient, in_memory};
pub use localstack::LocalStackTestContext;

/// Deterministic object contents.
pub fn generate_test_bytes(size: u64) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

/// Generate a Parquet file with `num_records` rows spread over `row_groups`
/// row groups.
pub fn generate_test_parquet(num_records: usize, row_groups: usize) -> Vec<u8> {
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use parquet::file::properties::WriterProperties;
    use std::sync::Arc;

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("score", DataType::Int64, false),
    ]));

    let ids: Vec<i64> = (0..num_records as i64).collect();
    let names: Vec<String> = (0..num_records).map(|i| format!("user_{}", i)).collect();
    let scores: Vec<i64> = (0..num_records).map(|i| (i as i64 * 7) % 100).collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(StringArray::from(names)),
            Arc::new(Int64Array::from(scores)),
        ],
    )
    .expect("Failed to create record batch");

    let props = WriterProperties::builder()
        .set_max_row_group_size(num_records.div_ceil(row_groups))
        .build();
    let mut buf = Vec::new();
    let mut writer =
        ArrowWriter::try_new(&mut buf, schema, Some(props)).expect("Failed to create parquet writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
    buf
}
