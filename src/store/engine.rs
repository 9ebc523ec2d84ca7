//! The dispatch loop shared by plain and persisted stores.

use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::Weak;

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use tokio::sync::watch;

use super::pool::TaskPool;
use super::tasks::TaskRegistry;
use crate::cancel::CancelToken;
use crate::effect::{Effect, RunEffect};
use crate::mvi::Reducer;
use crate::persist::PersistHook;
use crate::sender::{ActionSender, Dispatch};

/// Current state together with its version number.
pub(crate) struct Published<S> {
    pub(crate) version: u64,
    pub(crate) value: S,
}

pub(crate) struct StoreCore<R: Reducer> {
    reducer: R,
    pub(crate) state: RwLock<Published<R::State>>,
    /// Serializes dispatch. Holds `true` while a cascade is running on the
    /// owning thread.
    gate: ReentrantMutex<Cell<bool>>,
    /// Actions dispatched re-entrantly while a cascade was running.
    pending: Mutex<VecDeque<R::Action>>,
    persistence: Option<Box<dyn PersistHook<R::State>>>,
    pub(crate) tasks: TaskRegistry,
    pool: TaskPool,
    versions: watch::Sender<u64>,
    /// 0 disables the limit.
    max_cascade_depth: usize,
    self_ref: Weak<StoreCore<R>>,
}

pub(crate) struct CoreParts<R: Reducer> {
    pub(crate) reducer: R,
    pub(crate) initial: R::State,
    pub(crate) persistence: Option<Box<dyn PersistHook<R::State>>>,
    pub(crate) pool: TaskPool,
    pub(crate) max_cascade_depth: usize,
}

impl<R: Reducer> StoreCore<R> {
    pub(crate) fn new(parts: CoreParts<R>, self_ref: Weak<StoreCore<R>>) -> Self {
        let (versions, _) = watch::channel(0);
        Self {
            reducer: parts.reducer,
            state: RwLock::new(Published {
                version: 0,
                value: parts.initial,
            }),
            gate: ReentrantMutex::new(Cell::new(false)),
            pending: Mutex::new(VecDeque::new()),
            persistence: parts.persistence,
            tasks: TaskRegistry::default(),
            pool: parts.pool,
            versions,
            max_cascade_depth: parts.max_cascade_depth,
            self_ref,
        }
    }

    /// Capability bound to this store through a weak reference.
    pub(crate) fn sender(&self, token: CancelToken) -> ActionSender<R::Action> {
        let target: Weak<dyn Dispatch<R::Action>> = self.self_ref.clone();
        ActionSender::new(target, token)
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<u64> {
        self.versions.subscribe()
    }

    /// Entry point for every action, external or from an effect.
    pub(crate) fn dispatch_action(&self, action: R::Action) {
        let gate = self.gate.lock();
        if gate.get() {
            // Re-entered from the thread already running a cascade.
            self.pending.lock().push_back(action);
            return;
        }
        gate.set(true);
        let _running = scopeguard::guard(&*gate, |flag| flag.set(false));

        self.run_cascade(action);
        loop {
            let next = self.pending.lock().pop_front();
            let Some(next) = next else { break };
            self.run_cascade(next);
        }
    }

    /// Reduce `action` and every action it sends, depth-first, without
    /// growing the call stack.
    fn run_cascade(&self, action: R::Action) {
        let mut next = Some(action);
        let mut steps = 0usize;

        while let Some(action) = next.take() {
            if self.max_cascade_depth != 0 && steps >= self.max_cascade_depth {
                tracing::error!(
                    limit = self.max_cascade_depth,
                    "Send cascade exceeded limit, dropping remaining actions"
                );
                return;
            }
            steps += 1;

            next = match self.step(action) {
                Effect::None => None,
                Effect::Send(action) => Some(action),
                Effect::Run(run) => {
                    self.schedule(run);
                    None
                }
            };
        }

        tracing::debug!(steps, "Dispatch cascade complete");
    }

    /// One reduce step: reduce a copy, publish it, persist it.
    fn step(&self, action: R::Action) -> Effect<R::Action> {
        let mut working = self.state.read().value.clone();
        let effect = self.reducer.reduce(&mut working, action);

        let version = {
            let mut slot = self.state.write();
            slot.version += 1;
            slot.value = working;
            slot.version
        };
        tracing::trace!(version, "State published");

        if let Some(hook) = &self.persistence {
            let slot = self.state.read();
            hook.persist(&slot.value);
        }

        self.versions.send_replace(version);
        effect
    }

    fn schedule(&self, run: RunEffect<R::Action>) {
        let RunEffect {
            priority,
            operation,
            catch,
            cancel_id,
            cancel_in_flight,
        } = run;

        let (task_id, token) = self.tasks.register(cancel_id, cancel_in_flight);
        let send = self.sender(token.clone());
        // Unregisters on completion, panic, or the task being dropped unpolled.
        let finished = scopeguard::guard(self.self_ref.clone(), move |core| {
            if let Some(core) = core.upgrade() {
                core.tasks.finish(task_id);
            }
        });

        let task = async move {
            let _finished = finished;
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                result = operation(send.clone()) => Some(result),
            };

            match outcome {
                None => tracing::debug!(%task_id, "Effect cancelled"),
                Some(Ok(())) => tracing::trace!(%task_id, "Effect finished"),
                Some(Err(error)) => match catch {
                    Some(handler) if !token.is_cancelled() => {
                        tokio::select! {
                            biased;
                            _ = token.cancelled() => {}
                            _ = handler(error, send) => {}
                        }
                    }
                    _ => tracing::debug!(%task_id, error = %error, "Effect failed, no handler"),
                },
            }
        };

        if !self.pool.spawn(priority, task) {
            tracing::warn!(%task_id, "No tokio runtime available, dropping effect");
        }
    }
}

impl<R: Reducer> Dispatch<R::Action> for StoreCore<R> {
    fn dispatch(&self, action: R::Action) {
        self.dispatch_action(action);
    }
}

impl<R: Reducer> Drop for StoreCore<R> {
    fn drop(&mut self) {
        let cancelled = self.tasks.cancel_all();
        if cancelled > 0 {
            tracing::debug!(cancelled, "Store released, cancelled outstanding effects");
        }
    }
}
