//! Effects: descriptions of follow-up work returned by a reducer.
//!
//! An effect is a value, not a side effect. The store interprets it after
//! the new state has been published:
//!
//! - [`Effect::none`] ends the cascade
//! - [`Effect::send`] continues the cascade synchronously with another action
//! - [`Effect::run`] schedules an async operation that may send actions later

mod priority;

use std::future::Future;
use std::pin::Pin;

use crate::cancel::CancelId;
use crate::sender::ActionSender;

pub use priority::Priority;

/// Result type of an effect operation.
pub type EffectResult = anyhow::Result<()>;

pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
pub(crate) type Operation<A> = Box<dyn FnOnce(ActionSender<A>) -> BoxFuture<EffectResult> + Send>;
pub(crate) type ErrorHandler<A> =
    Box<dyn FnOnce(anyhow::Error, ActionSender<A>) -> BoxFuture<()> + Send>;

/// Follow-up work produced by one reduce step.
pub enum Effect<A> {
    /// No further work.
    None,
    /// Re-enter dispatch with this action before returning to the caller.
    Send(A),
    /// Schedule an asynchronous operation.
    Run(RunEffect<A>),
}

/// An asynchronous operation waiting to be scheduled.
pub struct RunEffect<A> {
    pub(crate) priority: Priority,
    pub(crate) operation: Operation<A>,
    pub(crate) catch: Option<ErrorHandler<A>>,
    pub(crate) cancel_id: Option<CancelId>,
    pub(crate) cancel_in_flight: bool,
}

impl<A> RunEffect<A> {
    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn cancel_id(&self) -> Option<&CancelId> {
        self.cancel_id.as_ref()
    }

    pub fn has_handler(&self) -> bool {
        self.catch.is_some()
    }
}

impl<A: Send + 'static> Effect<A> {
    pub fn none() -> Self {
        Self::None
    }

    pub fn send(action: A) -> Self {
        Self::Send(action)
    }

    /// Schedule `operation` on the async task pool.
    ///
    /// The operation receives an [`ActionSender`] and may call it any number
    /// of times. A returned error goes to the handler attached with
    /// [`catch`](Self::catch); without one it is discarded.
    pub fn run<F, Fut>(priority: Priority, operation: F) -> Self
    where
        F: FnOnce(ActionSender<A>) -> Fut + Send + 'static,
        Fut: Future<Output = EffectResult> + Send + 'static,
    {
        Self::Run(RunEffect {
            priority,
            operation: Box::new(move |send: ActionSender<A>| -> BoxFuture<EffectResult> {
                Box::pin(operation(send))
            }),
            catch: None,
            cancel_id: None,
            cancel_in_flight: false,
        })
    }

    /// Attach an error handler to a run effect.
    ///
    /// The handler is called at most once, with the error and a live sender.
    /// No-op for other variants.
    pub fn catch<H, Fut>(self, handler: H) -> Self
    where
        H: FnOnce(anyhow::Error, ActionSender<A>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        match self {
            Self::Run(mut run) => {
                run.catch = Some(Box::new(
                    move |error: anyhow::Error, send: ActionSender<A>| -> BoxFuture<()> {
                        Box::pin(handler(error, send))
                    },
                ));
                Self::Run(run)
            }
            other => other,
        }
    }

    /// Tag a run effect so it can be cancelled with [`Store::cancel`](crate::Store::cancel).
    pub fn cancellable(self, id: impl Into<CancelId>) -> Self {
        match self {
            Self::Run(mut run) => {
                run.cancel_id = Some(id.into());
                Self::Run(run)
            }
            other => other,
        }
    }

    /// Cancel effects already running under the same id when this one starts.
    /// Only meaningful after [`cancellable`](Self::cancellable).
    pub fn cancel_in_flight(self) -> Self {
        match self {
            Self::Run(mut run) => {
                run.cancel_in_flight = true;
                Self::Run(run)
            }
            other => other,
        }
    }
}

impl<A> Effect<A> {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn priority(&self) -> Option<Priority> {
        match self {
            Self::Run(run) => Some(run.priority),
            _ => None,
        }
    }
}

impl<A> Default for Effect<A> {
    fn default() -> Self {
        Self::None
    }
}

/// Run effects compare by priority only; operations are not comparable.
impl<A: PartialEq> PartialEq for Effect<A> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Send(a), Self::Send(b)) => a == b,
            (Self::Run(a), Self::Run(b)) => a.priority == b.priority,
            _ => false,
        }
    }
}

impl<A: std::fmt::Debug> std::fmt::Debug for Effect<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Send(action) => f.debug_tuple("Send").field(action).finish(),
            Self::Run(run) => f
                .debug_struct("Run")
                .field("priority", &run.priority)
                .field("cancel_id", &run.cancel_id)
                .field("has_handler", &run.catch.is_some())
                .finish(),
        }
    }
}
