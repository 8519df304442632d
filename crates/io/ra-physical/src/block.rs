//! Cached byte ranges.

use bytes::Bytes;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use ra_error::{RaError, Result};
use ra_telemetry::{Operation, Telemetry, names};
use ra_traits::ObjectClient;
use ra_types::{ObjectUri, Range};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::trace;

type BlockFuture = Shared<BoxFuture<'static, Result<Bytes>>>;

/// Fetch state of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockState {
    /// Upstream request still in flight.
    Pending,
    /// Bytes available.
    Ready,
    /// Upstream request failed; the block will be dropped on next access.
    Failed,
}

/// One owned byte range of an object, backed by exactly one upstream fetch.
#[derive(Clone)]
pub(crate) struct Block {
    range: Range,
    data: BlockFuture,
}

impl Block {
    /// Start fetching `range` of `uri` on a detached task.
    ///
    /// The task drives the shared future, so the fetch completes even if
    /// nobody waits on it. Outside a tokio runtime the fetch is driven by
    /// its first waiter instead.
    pub(crate) fn fetch(
        client: Arc<dyn ObjectClient>,
        telemetry: Telemetry,
        uri: ObjectUri,
        range: Range,
    ) -> Self {
        let runtime = Handle::try_current().ok();
        if runtime.is_none() {
            trace!(uri = %uri, range = %range, "No runtime, block fetched on demand");
        }

        let data = async move {
            let operation = Operation::new(names::BLOCK_GET)
                .with_attribute("uri", &uri)
                .with_attribute("range", range);
            let bytes = telemetry
                .measure(operation, async {
                    let bytes = client.get_object_range(&uri, range).await?;
                    if bytes.len() as u64 != range.len() {
                        return Err(RaError::Transport(format!(
                            "Short read for {} range {}: expected {} bytes, got {}",
                            uri,
                            range,
                            range.len(),
                            bytes.len()
                        )));
                    }
                    Ok(bytes)
                })
                .await?;
            telemetry.record_bytes_fetched(bytes.len() as u64);
            Ok(bytes)
        }
        .boxed()
        .shared();

        if let Some(runtime) = runtime {
            runtime.spawn(data.clone());
        }

        Self { range, data }
    }

    pub(crate) fn range(&self) -> Range {
        self.range
    }

    pub(crate) fn state(&self) -> BlockState {
        match self.data.peek() {
            None => BlockState::Pending,
            Some(Ok(_)) => BlockState::Ready,
            Some(Err(_)) => BlockState::Failed,
        }
    }

    /// Wait for the block's bytes, attaching to the in-flight fetch.
    pub(crate) async fn data(&self) -> Result<Bytes> {
        self.data.clone().await
    }

    /// Bytes held by the block once ready.
    pub(crate) fn ready_len(&self) -> u64 {
        match self.data.peek() {
            Some(Ok(bytes)) => bytes.len() as u64,
            _ => 0,
        }
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("range", &self.range)
            .field("state", &self.state())
            .finish()
    }
}
