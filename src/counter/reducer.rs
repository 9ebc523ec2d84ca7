//! Reducer for the counter feature.

use std::time::Duration;

use crate::effect::{Effect, Priority};
use crate::mvi::Reducer;

use super::action::CounterAction;
use super::state::CounterState;

/// Cancel id of the background ticker.
pub const TICKER_ID: &str = "counter.ticker";

/// Reducer for counter state transitions.
pub struct CounterReducer;

impl Reducer for CounterReducer {
    type State = CounterState;
    type Action = CounterAction;

    fn reduce(&self, state: &mut CounterState, action: CounterAction) -> Effect<CounterAction> {
        match action {
            CounterAction::Increment => {
                state.count = state.count.saturating_add(1);
                Effect::none()
            }

            CounterAction::Decrement => {
                state.count = state.count.saturating_sub(1);
                Effect::none()
            }

            CounterAction::IncrementBy { times } => {
                if times == 0 {
                    return Effect::none();
                }
                state.count = state.count.saturating_add(1);
                if times > 1 {
                    Effect::send(CounterAction::IncrementBy { times: times - 1 })
                } else {
                    Effect::none()
                }
            }

            CounterAction::SetMessage(message) => {
                state.message = message;
                Effect::none()
            }

            CounterAction::Reset => {
                *state = CounterState::default();
                Effect::none()
            }

            CounterAction::StartTicking { count, interval_ms } => {
                state.ticking = true;
                state.ticks = 0;
                state.last_error = None;
                ticker(count, Duration::from_millis(interval_ms))
            }

            CounterAction::Tick => {
                // Ticks that arrive after a reset are stale.
                if state.ticking {
                    state.ticks = state.ticks.saturating_add(1);
                    state.count = state.count.saturating_add(1);
                }
                Effect::none()
            }

            CounterAction::TickingFinished => {
                state.ticking = false;
                Effect::none()
            }

            CounterAction::TickingFailed { reason } => {
                state.ticking = false;
                state.last_error = Some(reason);
                Effect::none()
            }
        }
    }
}

fn ticker(count: u32, interval: Duration) -> Effect<CounterAction> {
    Effect::run(Priority::Low, move |send| async move {
        if count == 0 {
            anyhow::bail!("tick count must be positive");
        }
        for _ in 0..count {
            tokio::time::sleep(interval).await;
            send.send(CounterAction::Tick);
        }
        send.send(CounterAction::TickingFinished);
        Ok(())
    })
    .catch(|error, send| async move {
        send.send(CounterAction::TickingFailed {
            reason: error.to_string(),
        });
    })
    .cancellable(TICKER_ID)
    .cancel_in_flight()
}
