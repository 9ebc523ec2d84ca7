//! Base trait for store state in MVI architecture.

/// Marker trait for state owned by a store.
///
/// States should be:
/// - Cloneable (readers receive snapshots, the reducer works on a copy)
/// - Self-contained (all data needed to render a view)
/// - Shareable across threads (readers may live anywhere)
pub trait AppState: Clone + Send + Sync + 'static {}
