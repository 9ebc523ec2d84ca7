//! Base trait for actions in MVI architecture.

/// Marker trait for action objects.
///
/// Actions represent:
/// - User actions (button clicks, key presses)
/// - System events (API responses, timers)
/// - Completion of asynchronous effects
///
/// Actions are processed by reducers to produce new states.
pub trait Action: Send + 'static {}
