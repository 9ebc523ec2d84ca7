//! The Send capability handed to running effects.

use std::sync::Weak;

use crate::cancel::CancelToken;
use crate::mvi::Action;

/// Entry point a capability forwards actions to.
pub(crate) trait Dispatch<A>: Send + Sync {
    fn dispatch(&self, action: A);
}

/// Cancellation-aware handle for feeding actions back into a store.
///
/// Holds only a weak reference: once the store is dropped every call to
/// [`send`](Self::send) is a silent no-op. A capability created for a
/// scheduled effect also stops forwarding as soon as that effect is
/// cancelled.
pub struct ActionSender<A> {
    target: Weak<dyn Dispatch<A>>,
    token: CancelToken,
}

impl<A> Clone for ActionSender<A> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            token: self.token.clone(),
        }
    }
}

impl<A: Action> ActionSender<A> {
    pub(crate) fn new(target: Weak<dyn Dispatch<A>>, token: CancelToken) -> Self {
        Self { target, token }
    }

    /// Forward `action` to the owning store's dispatch.
    pub fn send(&self, action: A) {
        if self.token.is_cancelled() {
            tracing::trace!("Dropping action from cancelled effect");
            return;
        }
        let Some(target) = self.target.upgrade() else {
            tracing::trace!("Dropping action, store released");
            return;
        };
        target.dispatch(action);
    }

    /// True once the effect owning this capability was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True while sends would still reach a store.
    pub fn is_live(&self) -> bool {
        !self.token.is_cancelled() && self.target.strong_count() > 0
    }

    /// Resolves when the owning effect is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

impl<A> std::fmt::Debug for ActionSender<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionSender")
            .field("cancelled", &self.token.is_cancelled())
            .field("store_alive", &(self.target.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Note(u32);
    impl Action for Note {}

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<u32>>,
    }

    impl Dispatch<Note> for Recorder {
        fn dispatch(&self, action: Note) {
            self.seen.lock().push(action.0);
        }
    }

    fn sender_for(recorder: &Arc<Recorder>, token: CancelToken) -> ActionSender<Note> {
        let weak: Weak<Recorder> = Arc::downgrade(recorder);
        let target: Weak<dyn Dispatch<Note>> = weak;
        ActionSender::new(target, token)
    }

    #[test]
    fn forwards_while_live() {
        let recorder = Arc::new(Recorder::default());
        let sender = sender_for(&recorder, CancelToken::new());
        sender.send(Note(1));
        sender.clone().send(Note(2));
        assert_eq!(*recorder.seen.lock(), vec![1, 2]);
        assert!(sender.is_live());
    }

    #[test]
    fn cancelled_token_drops_actions() {
        let recorder = Arc::new(Recorder::default());
        let token = CancelToken::new();
        let sender = sender_for(&recorder, token.clone());
        sender.send(Note(1));
        token.cancel();
        sender.send(Note(2));
        assert_eq!(*recorder.seen.lock(), vec![1]);
        assert!(sender.is_cancelled());
        assert!(!sender.is_live());
    }

    #[test]
    fn released_target_is_noop() {
        let recorder = Arc::new(Recorder::default());
        let sender = sender_for(&recorder, CancelToken::new());
        drop(recorder);
        sender.send(Note(1));
        assert!(!sender.is_live());
        assert!(!sender.is_cancelled());
    }
}
