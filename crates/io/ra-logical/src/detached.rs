//! Fire-and-forget prefetch tasks.

use parking_lot::Mutex;
use ra_error::Result;
use ra_types::ObjectUri;
use std::future::Future;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Spawns prefetch work and records its outcome in the logs.
///
/// Foreground code never awaits these tasks. Handles are kept only so that
/// [`DetachedTasks::wait`] can drain them.
#[derive(Debug, Default)]
pub(crate) struct DetachedTasks {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl DetachedTasks {
    /// Run `future` on the current tokio runtime, logging a failure.
    ///
    /// Outside a runtime the task is skipped and false is returned;
    /// prefetching is best-effort.
    pub(crate) fn spawn<T, F>(&self, task: &'static str, uri: &ObjectUri, future: F) -> bool
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            debug!(task, uri = %uri, "No runtime available, skipping prefetch task");
            return false;
        };

        let uri = uri.clone();
        let handle = runtime.spawn(async move {
            if let Err(e) = future.await {
                warn!(task, uri = %uri, error = %e, "Prefetch task failed");
            }
        });

        let mut handles = self.handles.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
        true
    }

    /// Wait until every task spawned so far has finished.
    pub(crate) async fn wait(&self) {
        loop {
            let handles = std::mem::take(&mut *self.handles.lock());
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Prefetch task panicked");
                }
            }
        }
    }
}
