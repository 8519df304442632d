//! Inclusive byte ranges.

use ra_error::{RaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A byte interval `[start, end]`, both ends inclusive.
///
/// Offsets are unsigned, so a range can never start before the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct Range {
    start: u64,
    end: u64,
}

/// Unchecked wire form of [`Range`].
#[derive(Deserialize)]
struct RawRange {
    start: u64,
    end: u64,
}

impl TryFrom<RawRange> for Range {
    type Error = RaError;

    fn try_from(raw: RawRange) -> Result<Self> {
        Range::new(raw.start, raw.end)
    }
}

impl Range {
    /// Create a range, failing if `end < start`.
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if end < start {
            return Err(RaError::InvalidArgument(format!(
                "range end {} must not be less than start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Create the range covering `len` bytes from `start`. `len` must be non-zero.
    pub fn from_len(start: u64, len: u64) -> Result<Self> {
        if len == 0 {
            return Err(RaError::InvalidArgument(format!(
                "range starting at {} must have a non-zero length",
                start
            )));
        }
        let end = start.checked_add(len - 1).ok_or_else(|| {
            RaError::InvalidArgument(format!("range {}+{} overflows", start, len))
        })?;
        Ok(Self { start, end })
    }

    /// First byte of the range.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Last byte of the range (inclusive).
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of bytes covered.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// A range always covers at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `pos` falls inside the range.
    pub fn contains(&self, pos: u64) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Whether the two ranges share at least one byte.
    pub fn overlaps(&self, other: &Range) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Whether the ranges overlap or touch end to start.
    pub fn is_adjacent_or_overlapping(&self, other: &Range) -> bool {
        self.overlaps(other)
            || self.end.checked_add(1) == Some(other.start)
            || other.end.checked_add(1) == Some(self.start)
    }

    /// Bytes shared by both ranges.
    pub fn intersection(&self, other: &Range) -> Option<Range> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Range {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }

    /// Smallest range covering both.
    pub fn merge(&self, other: &Range) -> Range {
        Range {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Clamp the range to an object of `size` bytes. `None` if it starts past the end.
    pub fn clamp_to(&self, size: u64) -> Option<Range> {
        if size == 0 || self.start >= size {
            return None;
        }
        Some(Range {
            start: self.start,
            end: self.end.min(size - 1),
        })
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
