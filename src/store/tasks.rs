//! Bookkeeping for scheduled effects.

use std::collections::HashMap;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::cancel::{CancelId, CancelToken};

pub(crate) type TaskId = Uuid;

struct TaskEntry {
    token: CancelToken,
    cancel_id: Option<CancelId>,
}

/// Tracks running effects so they can be cancelled by id or all at once.
#[derive(Default)]
pub(crate) struct TaskRegistry {
    tasks: Mutex<HashMap<TaskId, TaskEntry>>,
}

impl TaskRegistry {
    /// Register a new task. With `cancel_in_flight`, tasks already running
    /// under the same id are cancelled first.
    pub(crate) fn register(
        &self,
        cancel_id: Option<CancelId>,
        cancel_in_flight: bool,
    ) -> (TaskId, CancelToken) {
        let mut tasks = self.tasks.lock();
        if cancel_in_flight {
            if let Some(id) = &cancel_id {
                let stale: Vec<TaskId> = tasks
                    .iter()
                    .filter(|(_, entry)| entry.cancel_id.as_ref() == Some(id))
                    .map(|(task_id, _)| *task_id)
                    .collect();
                for task_id in stale {
                    if let Some(entry) = tasks.remove(&task_id) {
                        entry.token.cancel();
                    }
                }
            }
        }

        let task_id = Uuid::new_v4();
        let token = CancelToken::new();
        tasks.insert(
            task_id,
            TaskEntry {
                token: token.clone(),
                cancel_id,
            },
        );
        (task_id, token)
    }

    /// Forget a finished task.
    pub(crate) fn finish(&self, task_id: TaskId) {
        self.tasks.lock().remove(&task_id);
    }

    /// Cancel every task tagged with `id`. Returns how many were cancelled.
    pub(crate) fn cancel(&self, id: &CancelId) -> usize {
        let mut tasks = self.tasks.lock();
        let mut cancelled = 0;
        tasks.retain(|_, entry| {
            if entry.cancel_id.as_ref() == Some(id) {
                entry.token.cancel();
                cancelled += 1;
                false
            } else {
                true
            }
        });
        cancelled
    }

    pub(crate) fn cancel_all(&self) -> usize {
        let drained: Vec<TaskEntry> = self.tasks.lock().drain().map(|(_, e)| e).collect();
        for entry in &drained {
            entry.token.cancel();
        }
        drained.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_by_id_only_hits_matching_tasks() {
        let registry = TaskRegistry::default();
        let (_, fetch) = registry.register(Some("fetch".into()), false);
        let (_, other) = registry.register(Some("other".into()), false);
        let (_, untagged) = registry.register(None, false);

        assert_eq!(registry.cancel(&"fetch".into()), 1);
        assert!(fetch.is_cancelled());
        assert!(!other.is_cancelled());
        assert!(!untagged.is_cancelled());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn cancel_in_flight_replaces_previous() {
        let registry = TaskRegistry::default();
        let (_, first) = registry.register(Some("search".into()), false);
        let (_, second) = registry.register(Some("search".into()), true);
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn finish_and_cancel_all() {
        let registry = TaskRegistry::default();
        let (done, _) = registry.register(None, false);
        let (_, pending) = registry.register(None, false);
        registry.finish(done);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.cancel_all(), 1);
        assert!(pending.is_cancelled());
        assert_eq!(registry.len(), 0);
    }
}
