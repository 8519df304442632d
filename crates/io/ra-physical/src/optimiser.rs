//! Range splitting.

use crate::PhysicalIoConfig;
use ra_types::Range;

/// Splits oversized ranges into bounded sub-ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeOptimiser {
    max_range_size: u64,
}

impl RangeOptimiser {
    /// Create an optimiser that caps ranges at `max_range_size` bytes.
    ///
    /// A zero maximum is treated as one byte.
    pub fn new(max_range_size: u64) -> Self {
        Self {
            max_range_size: max_range_size.max(1),
        }
    }

    /// Create an optimiser from physical I/O configuration.
    pub fn from_config(config: &PhysicalIoConfig) -> Self {
        Self::new(config.max_range_size)
    }

    /// The configured maximum range size.
    pub fn max_range_size(&self) -> u64 {
        self.max_range_size
    }

    /// Split every range longer than the maximum.
    ///
    /// Each oversized range becomes the fewest contiguous pieces that fit,
    /// with lengths differing by at most one byte. Input order is preserved
    /// and ranges within the limit pass through unchanged.
    pub fn split(&self, ranges: &[Range]) -> Vec<Range> {
        let mut result = Vec::with_capacity(ranges.len());
        for range in ranges {
            if range.len() <= self.max_range_size {
                result.push(*range);
                continue;
            }

            let pieces = range.len().div_ceil(self.max_range_size);
            let base = range.len() / pieces;
            let longer = range.len() % pieces;

            let mut start = range.start();
            for i in 0..pieces {
                let len = if i < longer { base + 1 } else { base };
                let end = start + len - 1;
                result.push(piece(start, end));
                start = end + 1;
            }
        }
        result
    }
}

// Every piece has start <= end.
fn piece(start: u64, end: u64) -> Range {
    match Range::new(start, end) {
        Ok(range) => range,
        Err(_) => unreachable!("split produced inverted range {start}-{end}"),
    }
}
