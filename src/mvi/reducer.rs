//! Reducer trait for MVI architecture.

use std::marker::PhantomData;

use super::action::Action;
use super::state::AppState;
use crate::effect::Effect;

/// Reducer transforms state based on actions.
///
/// The reducer is the only place where state transitions happen.
/// It must be synchronous and total: `(&mut State, Action) -> Effect`.
/// Anything asynchronous goes into an [`Effect::run`] operation.
pub trait Reducer: Send + Sync + 'static {
    /// The state type this reducer operates on.
    type State: AppState;

    /// The action type this reducer handles.
    type Action: Action;

    /// Process an action, mutating `state` in place, and describe what
    /// should happen next.
    fn reduce(&self, state: &mut Self::State, action: Self::Action) -> Effect<Self::Action>;
}

/// Reducer backed by a closure. Built with [`reducer_fn`].
pub struct FnReducer<S, A, F> {
    reduce: F,
    _marker: PhantomData<fn(&mut S, A)>,
}

/// Wrap a closure as a [`Reducer`].
pub fn reducer_fn<S, A, F>(reduce: F) -> FnReducer<S, A, F>
where
    S: AppState,
    A: Action,
    F: Fn(&mut S, A) -> Effect<A> + Send + Sync + 'static,
{
    FnReducer {
        reduce,
        _marker: PhantomData,
    }
}

impl<S, A, F> Reducer for FnReducer<S, A, F>
where
    S: AppState,
    A: Action,
    F: Fn(&mut S, A) -> Effect<A> + Send + Sync + 'static,
{
    type State = S;
    type Action = A;

    fn reduce(&self, state: &mut S, action: A) -> Effect<A> {
        (self.reduce)(state, action)
    }
}
