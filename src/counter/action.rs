use crate::mvi::Action;

#[derive(Debug, Clone, PartialEq)]
pub enum CounterAction {
    Increment,
    Decrement,
    /// Increment `times` times as one synchronous cascade.
    IncrementBy { times: u32 },
    SetMessage(String),
    Reset,
    /// Start a background ticker that sends `Tick` every `interval_ms`.
    StartTicking { count: u32, interval_ms: u64 },
    Tick,
    /// The ticker delivered all of its ticks.
    TickingFinished,
    /// The ticker could not run.
    TickingFailed { reason: String },
}

impl Action for CounterAction {}
