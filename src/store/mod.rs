//! The store: exclusive owner of state and home of the dispatch loop.
//!
//! # Dispatch
//!
//! ```text
//! dispatch(a) ──→ reduce(copy, a) ──→ publish ──→ persist? ──→ effect
//!                      ↑                                        │
//!                      └──────────── Send(next) ────────────────┤
//!                                                               ├─ None: done
//!                                                               └─ Run: spawn task
//! ```
//!
//! Dispatches from different threads are serialized; a whole `Send` cascade
//! runs before any other dispatch is admitted. Run tasks re-enter through an
//! [`ActionSender`] holding only a weak reference to the store.

mod engine;
mod pool;
mod tasks;

use std::sync::{Arc, Weak};

use tokio::runtime::Handle;
use tokio::sync::watch;

use self::engine::{CoreParts, StoreCore};
use self::pool::TaskPool;
use crate::cancel::{CancelId, CancelToken};
use crate::config::{StoreConfig, DEFAULT_MAX_CASCADE_DEPTH};
use crate::mvi::Reducer;
use crate::persist::{PersistHook, Persistable, Persistence};
use crate::sender::ActionSender;

/// Single owner of a state value, driven by a [`Reducer`].
pub struct Store<R: Reducer> {
    core: Arc<StoreCore<R>>,
}

impl<R: Reducer> Store<R> {
    /// Construct with an explicit initial state.
    pub fn new(initial_state: R::State, reducer: R) -> Self {
        StoreBuilder::new(reducer).build(initial_state)
    }

    /// Construct a store that restores its state on creation and saves it
    /// after every change.
    ///
    /// Uses the `[persistence]` section of the default config file. When no
    /// storage location can be resolved the store runs in memory only.
    pub fn new_persisted(reducer: R, default_state: R::State) -> Self
    where
        R::State: Persistable,
    {
        let config = StoreConfig::load().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Falling back to default store config");
            StoreConfig::default()
        });
        let builder = StoreBuilder::new(reducer).with_config(&config);
        match Persistence::from_config(&config.persistence) {
            Ok(persistence) => builder.build_persisted(default_state, persistence),
            Err(err) => {
                tracing::warn!(error = %err, "Persistence unavailable, state kept in memory");
                builder.build(default_state)
            }
        }
    }

    pub fn builder(reducer: R) -> StoreBuilder<R> {
        StoreBuilder::new(reducer)
    }

    /// Process `action` and its synchronous cascade. Run effects are only
    /// scheduled; this returns without waiting for them.
    pub fn dispatch(&self, action: R::Action) {
        self.core.dispatch_action(action);
    }

    /// Snapshot of the most recently published state.
    pub fn current_state(&self) -> R::State {
        self.core.state.read().value.clone()
    }

    /// Project from the current state without cloning all of it.
    ///
    /// `f` runs under the state read lock and must not dispatch to this
    /// store; use [`current_state`](Self::current_state) for that.
    pub fn with_state<T>(&self, f: impl FnOnce(&R::State) -> T) -> T {
        f(&self.core.state.read().value)
    }

    /// Number of reduce steps published so far.
    pub fn version(&self) -> u64 {
        self.core.state.read().version
    }

    /// Receiver that observes every published version.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.core.subscribe()
    }

    /// Capability for feeding actions in from elsewhere. Never cancelled;
    /// inert once the store is dropped.
    pub fn sender(&self) -> ActionSender<R::Action> {
        self.core.sender(CancelToken::new())
    }

    /// Two-way handle onto one field of the state.
    pub fn binding<T>(
        &self,
        get: impl Fn(&R::State) -> T + Send + Sync + 'static,
        set: impl Fn(T) -> R::Action + Send + Sync + 'static,
    ) -> Binding<R, T> {
        Binding {
            store: Arc::downgrade(&self.core),
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    /// Cancel running effects tagged with `id`. Returns how many were cancelled.
    pub fn cancel(&self, id: impl Into<CancelId>) -> usize {
        let id = id.into();
        let cancelled = self.core.tasks.cancel(&id);
        tracing::debug!(cancel_id = %id, cancelled, "Cancelled effects");
        cancelled
    }

    /// Cancel every running effect.
    pub fn cancel_all(&self) -> usize {
        self.core.tasks.cancel_all()
    }

    /// Number of scheduled effects that have not finished yet.
    pub fn active_tasks(&self) -> usize {
        self.core.tasks.len()
    }
}

/// Configures and builds a [`Store`].
pub struct StoreBuilder<R: Reducer> {
    reducer: R,
    runtime: Option<Handle>,
    max_cascade_depth: usize,
}

impl<R: Reducer> StoreBuilder<R> {
    pub fn new(reducer: R) -> Self {
        Self {
            reducer,
            runtime: None,
            max_cascade_depth: DEFAULT_MAX_CASCADE_DEPTH,
        }
    }

    /// Runtime for Run effects. Defaults to the runtime of the dispatching thread.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Limit on reduce steps per `Send` cascade. `0` disables the limit.
    pub fn with_max_cascade_depth(mut self, depth: usize) -> Self {
        self.max_cascade_depth = depth;
        self
    }

    pub fn with_config(self, config: &StoreConfig) -> Self {
        self.with_max_cascade_depth(config.store.max_cascade_depth)
    }

    pub fn build(self, initial_state: R::State) -> Store<R> {
        self.assemble(initial_state, None)
    }

    /// Restore from `persistence`, or start at `default_state` and save it
    /// right away so memory and storage agree from the start.
    pub fn build_persisted(
        self,
        default_state: R::State,
        persistence: Persistence<R::State>,
    ) -> Store<R>
    where
        R::State: Persistable,
    {
        let initial = match persistence.load() {
            Some(restored) => {
                tracing::debug!(key = persistence.key(), "Restored persisted state");
                restored
            }
            None => {
                persistence.persist(&default_state);
                default_state
            }
        };
        self.assemble(initial, Some(Box::new(persistence)))
    }

    fn assemble(
        self,
        initial: R::State,
        persistence: Option<Box<dyn PersistHook<R::State>>>,
    ) -> Store<R> {
        let parts = CoreParts {
            reducer: self.reducer,
            initial,
            persistence,
            pool: TaskPool::new(self.runtime),
            max_cascade_depth: self.max_cascade_depth,
        };
        let core = Arc::new_cyclic(|weak| StoreCore::new(parts, weak.clone()));
        Store { core }
    }
}

/// Field projection of a store's state that writes back through dispatch.
///
/// Holds the store weakly: reads return `None` and writes are dropped once
/// the store is gone.
pub struct Binding<R: Reducer, T> {
    store: Weak<StoreCore<R>>,
    get: Arc<dyn Fn(&R::State) -> T + Send + Sync>,
    set: Arc<dyn Fn(T) -> R::Action + Send + Sync>,
}

impl<R: Reducer, T> Clone for Binding<R, T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

impl<R: Reducer, T> Binding<R, T> {
    pub fn get(&self) -> Option<T> {
        let core = self.store.upgrade()?;
        // Released before `get` runs, so the getter may dispatch.
        let state = core.state.read().value.clone();
        Some((self.get)(&state))
    }

    pub fn set(&self, value: T) {
        if let Some(core) = self.store.upgrade() {
            core.dispatch_action((self.set)(value));
        }
    }
}
