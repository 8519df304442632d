//! Integration tests for the read accelerator.
//!
//! Most tests run against an in-memory object store. Tests that need a real
//! S3 endpoint use LocalStack and are marked `#[ignore]`.
//!
//! ## Running LocalStack Tests
//!
//! 1. Start LocalStack:
//!    ```bash
//!    docker run -d -p 4566:4566 localstack/localstack
//!    ```
//!
//! 2. Run the ignored tests:
//!    ```bash
//!    LOCALSTACK_ENDPOINT=http://localhost:4566 cargo test -p integration-tests -- --ignored
//!    ```

mod common;
mod localstack_test;
mod parquet_test;
mod stream_test;
