//! Model-View-Intent (MVI) primitives for the store.
//!
//! # Architecture
//!
//! ```text
//! Action ──→ Reducer ──→ State ──→ View
//!    ↑          │
//!    │          ↓
//!    └────── Effect
//! ```
//!
//! - **State**: value owned by exactly one store
//! - **Action**: user actions or system events
//! - **Reducer**: pure function that transforms state and describes follow-up work

mod action;
mod reducer;
mod state;

pub use action::Action;
pub use reducer::{reducer_fn, FnReducer, Reducer};
pub use state::AppState;
