//! Named operations.

use std::fmt;

/// Operation names recorded by the pipeline.
pub mod names {
    /// HEAD request on a metadata cache miss.
    pub const METADATA_HEAD: &str = "metadata.head";
    /// Ranged GET populating one block.
    pub const BLOCK_GET: &str = "block.get";
    /// Submission of a prefetch plan.
    pub const IO_PLAN_EXECUTE: &str = "io_plan.execute";
    /// Footer parse building column mappers.
    pub const PARQUET_FOOTER_PARSE: &str = "parquet.footer.parse";
    /// Tail (and small object) prefetch on parquet open.
    pub const PARQUET_TAIL_PREFETCH: &str = "parquet.tail.prefetch";
    /// Prefetch of the rest of a partially read column chunk.
    pub const PARQUET_COLUMN_PREFETCH: &str = "parquet.column.prefetch";
    /// Read-ahead for sequential streams.
    pub const SEQUENTIAL_PREFETCH: &str = "sequential.prefetch";
    /// Foreground positioned read.
    pub const STREAM_READ: &str = "stream.read";
    /// Foreground tail read.
    pub const STREAM_READ_TAIL: &str = "stream.read_tail";
}

/// A named operation with descriptive attributes.
///
/// Attributes are written to logs only; metrics are tagged with the name and
/// outcome so that per-object values do not explode metric cardinality.
#[derive(Debug, Clone)]
pub struct Operation {
    name: &'static str,
    attributes: Vec<(&'static str, String)>,
}

impl Operation {
    /// Create an operation with no attributes.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            attributes: Vec::new(),
        }
    }

    /// Add a descriptive attribute.
    pub fn with_attribute(mut self, key: &'static str, value: impl ToString) -> Self {
        self.attributes.push((key, value.to_string()));
        self
    }

    /// The operation name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Attributes in insertion order.
    pub fn attributes(&self) -> &[(&'static str, String)] {
        &self.attributes
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (key, value) in &self.attributes {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}
