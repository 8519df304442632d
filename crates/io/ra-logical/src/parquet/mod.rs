//! Parquet footer parsing and column prefetching.

mod io;
mod metadata;
mod store;
mod tasks;

pub use io::{ParquetLogicalIo, ParquetState};
pub use metadata::{ColumnMappers, ColumnMetadata, FOOTER_LENGTH, footer_length, parse_footer};
pub use store::ColumnPrefetchStore;
pub use tasks::{FooterParseTask, RemainingColumnTask, TailPrefetchTask};
