//! Prefetch plans.

use crate::Range;
use serde::{Deserialize, Serialize};

/// An ordered collection of ranges to fetch together.
///
/// Ranges need not be sorted or disjoint; the blob store coalesces them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoPlan {
    ranges: Vec<Range>,
}

impl IoPlan {
    /// Create a plan from a list of ranges.
    pub fn new(ranges: Vec<Range>) -> Self {
        Self { ranges }
    }

    /// A plan with a single range.
    pub fn single(range: Range) -> Self {
        Self {
            ranges: vec![range],
        }
    }

    /// A plan with nothing to fetch.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The ranges in submission order.
    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    /// Whether the plan contains no ranges.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl From<Vec<Range>> for IoPlan {
    fn from(ranges: Vec<Range>) -> Self {
        Self::new(ranges)
    }
}
