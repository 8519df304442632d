//! ra-client - Transport clients for the read accelerator.
//!
//! Two [`ObjectClient`](ra_traits::ObjectClient) implementations:
//!
//! - [`ObjectStoreClient`]: backed by the `object_store` crate. Either wraps a
//!   fixed store (for example `InMemory`) or builds one S3 store per bucket.
//! - [`S3Client`]: backed by the AWS SDK.
//!
//! Both map a missing object to `NotFound` and any other failure to
//! `Transport`.

mod config;
mod s3;
mod store;

pub use config::S3ClientConfig;
pub use s3::S3Client;
pub use store::ObjectStoreClient;
