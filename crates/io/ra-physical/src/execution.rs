//! Handles for submitted prefetch plans.

use crate::block::{Block, BlockState};
use ra_error::Result;
use ra_types::Range;
use tracing::debug;

/// Submission state of an I/O plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoPlanState {
    /// At least one upstream fetch was started.
    Submitted,
    /// Everything the plan asked for was already cached or in flight.
    Skipped,
}

/// Outcome of a completed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IoPlanSummary {
    /// Fetches that populated the cache.
    pub fetched: usize,
    /// Fetches that failed.
    pub failed: usize,
}

/// Handle to the fetches started by one plan.
///
/// Dropping the handle does not cancel anything. Waiting is optional and only
/// reports the outcome.
#[derive(Debug)]
pub struct IoPlanExecution {
    state: IoPlanState,
    blocks: Vec<Block>,
}

impl IoPlanExecution {
    pub(crate) fn submitted(blocks: Vec<Block>) -> Self {
        if blocks.is_empty() {
            return Self::skipped();
        }
        Self {
            state: IoPlanState::Submitted,
            blocks,
        }
    }

    pub(crate) fn skipped() -> Self {
        Self {
            state: IoPlanState::Skipped,
            blocks: Vec::new(),
        }
    }

    /// Submission state.
    pub fn state(&self) -> IoPlanState {
        self.state
    }

    /// Ranges fetched upstream by this plan, after clamping, coalescing and splitting.
    pub fn ranges(&self) -> Vec<Range> {
        self.blocks.iter().map(Block::range).collect()
    }

    /// Number of fetches still in flight.
    pub fn pending(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.state() == BlockState::Pending)
            .count()
    }

    /// Wait for every fetch of the plan.
    ///
    /// Succeeds when at least one fetch populated the cache or nothing needed
    /// fetching. Fails with [`RaError::Prefetch`] carrying the first cause
    /// only when every fetch failed.
    pub async fn wait(self) -> Result<IoPlanSummary> {
        let mut summary = IoPlanSummary::default();
        let mut first_error = None;

        for block in &self.blocks {
            match block.data().await {
                Ok(_) => summary.fetched += 1,
                Err(e) => {
                    debug!(range = %block.range(), error = %e, "Plan fetch failed");
                    summary.failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if summary.fetched == 0 => Err(e.into_prefetch()),
            _ => Ok(summary),
        }
    }
}
