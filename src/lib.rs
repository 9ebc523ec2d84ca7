//! A unidirectional state container.
//!
//! A [`Store`] owns one state value. Actions go in through
//! [`Store::dispatch`], a [`Reducer`] turns them into a new state plus an
//! [`Effect`], and effects either end the cascade, continue it with another
//! action, or schedule async work that feeds actions back through an
//! [`ActionSender`].

pub mod cancel;
pub mod config;
pub mod counter;
pub mod effect;
pub mod logging;
pub mod mvi;
pub mod persist;
pub mod sender;
pub mod store;

pub use cancel::{CancelId, CancelToken};
pub use effect::{Effect, EffectResult, Priority, RunEffect};
pub use mvi::{reducer_fn, Action, AppState, Reducer};
pub use persist::{Persistable, Persistence};
pub use sender::ActionSender;
pub use store::{Binding, Store, StoreBuilder};
