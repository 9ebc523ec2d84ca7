//! Async task pool used to run `Effect::Run` operations.

use std::future::Future;

use tokio::runtime::Handle;

use crate::effect::Priority;

/// Spawns effect operations on a tokio runtime.
///
/// Uses the runtime handle given at construction, otherwise whichever
/// runtime the dispatching thread is running in.
#[derive(Clone, Default)]
pub(crate) struct TaskPool {
    runtime: Option<Handle>,
}

impl TaskPool {
    pub(crate) fn new(runtime: Option<Handle>) -> Self {
        Self { runtime }
    }

    fn handle(&self) -> Option<Handle> {
        self.runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
    }

    /// Spawn `task`. Returns `false` when no runtime is reachable.
    pub(crate) fn spawn<F>(&self, priority: Priority, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Some(handle) = self.handle() else {
            return false;
        };
        let yields = priority.start_yields();
        handle.spawn(async move {
            for _ in 0..yields {
                tokio::task::yield_now().await;
            }
            task.await;
        });
        true
    }
}
