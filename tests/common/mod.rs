//! Shared test utilities and fixture feature.

#![allow(dead_code, unused_imports)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use flowstore::{Action, AppState, Effect, Priority, Reducer, Store};

// -- Fixture feature ------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FixtureState {
    pub value: i64,
    /// Every action name reduced, in order.
    pub log: Vec<String>,
    /// Value observed by `Observe` steps.
    pub seen: Vec<i64>,
    pub error: Option<String>,
}

impl AppState for FixtureState {}

#[derive(Debug, Clone, PartialEq)]
pub enum FixtureAction {
    Set(i64),
    Add(i64),
    /// Record `value` into `seen`.
    Observe,
    /// Set `value` then send `Observe`.
    SetThenObserve(i64),
    /// Chain: `Chain(n)` adds one and sends `Chain(n - 1)` until zero.
    Chain(u32),
    /// Sends itself forever.
    Forever,
    /// Run effect that sends `Set(v)`.
    Load(i64),
    /// Run effect that fails with `reason`; the handler sends `Failed`.
    FailCaught(String),
    /// Run effect that fails without a handler.
    FailSilently,
    /// Run effect that sends `Add(1)` every `ms` until cancelled.
    Stream { ms: u64 },
    /// Run effect that never finishes and never sends.
    Idle,
    /// Run effect whose operation panics.
    Crash,
    Failed(String),
}

impl Action for FixtureAction {}

pub const STREAM_ID: &str = "fixture.stream";

/// Counts error handler invocations.
#[derive(Clone, Default)]
pub struct FixtureReducer {
    pub handler_calls: Arc<AtomicUsize>,
}

impl FixtureReducer {
    pub fn handler_calls(&self) -> usize {
        self.handler_calls.load(Ordering::SeqCst)
    }
}

impl Reducer for FixtureReducer {
    type State = FixtureState;
    type Action = FixtureAction;

    fn reduce(&self, state: &mut FixtureState, action: FixtureAction) -> Effect<FixtureAction> {
        state.log.push(action_name(&action).to_string());
        match action {
            FixtureAction::Set(v) => {
                state.value = v;
                Effect::none()
            }
            FixtureAction::Add(v) => {
                state.value += v;
                Effect::none()
            }
            FixtureAction::Observe => {
                state.seen.push(state.value);
                Effect::none()
            }
            FixtureAction::SetThenObserve(v) => {
                state.value = v;
                Effect::send(FixtureAction::Observe)
            }
            FixtureAction::Chain(0) => Effect::none(),
            FixtureAction::Chain(n) => {
                state.value += 1;
                Effect::send(FixtureAction::Chain(n - 1))
            }
            FixtureAction::Forever => {
                state.value += 1;
                Effect::send(FixtureAction::Forever)
            }
            FixtureAction::Load(v) => Effect::run(Priority::High, move |send| async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                send.send(FixtureAction::Set(v));
                Ok(())
            }),
            FixtureAction::FailCaught(reason) => {
                let calls = Arc::clone(&self.handler_calls);
                Effect::run(Priority::Medium, move |_| async move {
                    Err(anyhow::anyhow!("{}", reason))
                })
                .catch(move |error, send| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    send.send(FixtureAction::Failed(error.to_string()));
                })
            }
            FixtureAction::FailSilently => Effect::run(Priority::Background, |_| async {
                Err(anyhow::anyhow!("nobody listens"))
            }),
            FixtureAction::Stream { ms } => Effect::run(Priority::Medium, move |send| async move {
                while send.is_live() {
                    send.send(FixtureAction::Add(1));
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                }
                Ok(())
            })
            .cancellable(STREAM_ID),
            FixtureAction::Idle => Effect::run(Priority::Low, |_| async {
                std::future::pending::<()>().await;
                Ok(())
            }),
            FixtureAction::Crash => Effect::run(Priority::High, |_| async {
                if std::hint::black_box(true) {
                    panic!("effect operation crashed");
                }
                Ok(())
            }),
            FixtureAction::Failed(reason) => {
                state.error = Some(reason);
                Effect::none()
            }
        }
    }
}

pub fn action_name(action: &FixtureAction) -> &'static str {
    match action {
        FixtureAction::Set(_) => "set",
        FixtureAction::Add(_) => "add",
        FixtureAction::Observe => "observe",
        FixtureAction::SetThenObserve(_) => "set_then_observe",
        FixtureAction::Chain(_) => "chain",
        FixtureAction::Forever => "forever",
        FixtureAction::Load(_) => "load",
        FixtureAction::FailCaught(_) => "fail_caught",
        FixtureAction::FailSilently => "fail_silently",
        FixtureAction::Stream { .. } => "stream",
        FixtureAction::Idle => "idle",
        FixtureAction::Crash => "crash",
        FixtureAction::Failed(_) => "failed",
    }
}

pub fn fixture_store() -> (Store<FixtureReducer>, FixtureReducer) {
    let reducer = FixtureReducer::default();
    let store = Store::new(FixtureState::default(), reducer.clone());
    (store, reducer)
}

// -- Async helpers ------------------------------------------------------------

/// Wait until `predicate` holds for the store's state.
pub async fn wait_until<R: Reducer>(
    store: &Store<R>,
    timeout: Duration,
    predicate: impl Fn(&R::State) -> bool,
) -> bool {
    let mut versions = store.subscribe();
    tokio::time::timeout(timeout, async {
        while !store.with_state(&predicate) {
            if versions.changed().await.is_err() {
                return false;
            }
        }
        true
    })
    .await
    .unwrap_or(false)
}

/// Wait until every scheduled effect has finished.
pub async fn wait_for_idle<R: Reducer>(store: &Store<R>, timeout: Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if store.active_tasks() == 0 {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}
