//! Counter feature: a small persisted state machine used by the CLI.

mod action;
mod reducer;
mod state;

pub use action::CounterAction;
pub use reducer::{CounterReducer, TICKER_ID};
pub use state::CounterState;
