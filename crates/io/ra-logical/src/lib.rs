//! Logical I/O layer.
//!
//! Picks a read strategy per object and runs the speculative prefetching
//! around foreground reads:
//!
//! - [`DefaultLogicalIo`]: plain pass-through
//! - [`SequentialLogicalIo`]: growing read-ahead for front-to-back consumers
//! - [`ParquetLogicalIo`]: footer parse and remaining column chunk prefetch
//!
//! [`FormatSelector`] decides which one an object gets.

mod config;
mod default;
mod detached;
mod format;
mod io;
pub mod parquet;
mod sequential;

#[cfg(test)]
pub(crate) mod test_util;

pub use config::{
    DEFAULT_COLUMN_PREFETCH_STORE_CAPACITY, DEFAULT_FOOTER_CACHING_SIZE,
    DEFAULT_SEQUENTIAL_PREFETCH_BASE, DEFAULT_SEQUENTIAL_PREFETCH_MAX,
    DEFAULT_SMALL_OBJECT_SIZE_THRESHOLD, LogicalIoConfig,
};
pub use default::DefaultLogicalIo;
pub use format::FormatSelector;
pub use io::LogicalIo;
pub use parquet::{ColumnMappers, ColumnMetadata, ColumnPrefetchStore, ParquetLogicalIo};
pub use sequential::SequentialLogicalIo;
