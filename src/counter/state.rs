use serde::{Deserialize, Serialize};

use crate::mvi::AppState;
use crate::persist::Persistable;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CounterState {
    pub count: i64,
    pub message: String,
    /// Ticks received from the running ticker.
    #[serde(default)]
    pub ticks: u32,
    #[serde(default)]
    pub ticking: bool,
    /// Last failure reported by an effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl AppState for CounterState {}

impl Persistable for CounterState {}
