//! ra-stream - Seekable streams over accelerated object reads.
//!
//! A [`SeekableStreamFactory`] owns the caches shared by every stream it
//! creates and picks a read strategy per object. A [`SeekableStream`] is the
//! caller-facing cursor.
//!
//! # Example
//!
//! ```ignore
//! use ra_stream::{SeekableStreamFactory, StreamConfig};
//! use ra_types::ObjectUri;
//!
//! let factory = SeekableStreamFactory::new(client, StreamConfig::default())?;
//! let mut stream = factory.create_stream(ObjectUri::parse("s3://bucket/events/part-0.parquet")?)?;
//!
//! let mut footer = [0u8; 8];
//! stream.read_tail(&mut footer).await?;
//! ```

mod config;
mod factory;
mod stream;

#[cfg(test)]
pub(crate) mod test_util;

pub use config::StreamConfig;
pub use factory::SeekableStreamFactory;
pub use stream::SeekableStream;
