//! Conduits between a running animation and the rest of the program.
//!
//! [`AnimationChannels`] bundles the event queue, the cancellation flag and
//! the termination slot of one animation. It is usually placed in a `static`
//! so the handles can be shared with other tasks, threads or signal handlers.
//! All three are built on `embassy-sync` primitives guarded by critical
//! sections.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{self, Channel};
use embassy_sync::signal::Signal;

use crate::error::AnimationError;

/// Number of events that may wait for the animator.
///
/// A second sender waits until the animator has picked up the first event.
pub const EVENT_CHANNEL_SIZE: usize = 1;

/// Outcome delivered once when an animation ends
pub type Outcome = Result<(), AnimationError>;

/// Error returned when trying to send to a full channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrySendError<T>(pub T);

/// Shared state of one animation.
pub struct AnimationChannels<E> {
    events: Channel<CriticalSectionRawMutex, E, EVENT_CHANNEL_SIZE>,
    cancel: Signal<CriticalSectionRawMutex, ()>,
    termination: Signal<CriticalSectionRawMutex, Outcome>,
}

impl<E> AnimationChannels<E> {
    /// Create a new set of channels.
    pub const fn new() -> Self {
        Self {
            events: Channel::new(),
            cancel: Signal::new(),
            termination: Signal::new(),
        }
    }

    /// Get a sender handle for the event queue.
    pub fn event_sender(&self) -> EventSender<'_, E> {
        EventSender {
            inner: self.events.sender(),
        }
    }

    /// Get a handle that cancels the animation.
    pub const fn cancel_handle(&self) -> CancelHandle<'_> {
        CancelHandle {
            signal: &self.cancel,
        }
    }

    /// Drop state left behind by a previous animation.
    pub(crate) fn reset(&self) {
        self.events.clear();
        self.cancel.reset();
        self.termination.reset();
    }

    pub(crate) fn termination(&self) -> Termination<'_> {
        Termination {
            signal: &self.termination,
            closed: false,
        }
    }

    /// Resolves once cancellation was requested.
    pub(crate) async fn cancelled(&self) {
        self.cancel.wait().await;
    }

    /// Resolves with the next injected event.
    pub(crate) async fn next_event(&self) -> E {
        self.events.receive().await
    }

    /// Publish the outcome of the animation.
    pub(crate) fn finish(&self, outcome: Outcome) {
        self.termination.signal(outcome);
    }
}

impl<E> Default for AnimationChannels<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A sender handle for the events of an animation.
///
/// This is a lightweight reference that can be copied and passed around.
pub struct EventSender<'a, E> {
    inner: channel::Sender<'a, CriticalSectionRawMutex, E, EVENT_CHANNEL_SIZE>,
}

impl<E> Clone for EventSender<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for EventSender<'_, E> {}

impl<E> EventSender<'_, E> {
    /// Send an event, waiting while another event is still queued.
    pub async fn send(&self, event: E) {
        self.inner.send(event).await;
    }

    /// Try to send an event without waiting.
    ///
    /// Returns `Err(TrySendError(event))` if an event is still queued.
    pub fn try_send(&self, event: E) -> Result<(), TrySendError<E>> {
        self.inner.try_send(event).map_err(|err| match err {
            channel::TrySendError::Full(event) => TrySendError(event),
        })
    }
}

/// Cancels a running animation.
///
/// Safe to call from any thread or interrupt context. Calls after the first
/// one have no further effect.
#[derive(Clone, Copy)]
pub struct CancelHandle<'a> {
    signal: &'a Signal<CriticalSectionRawMutex, ()>,
}

impl CancelHandle<'_> {
    pub fn cancel(&self) {
        self.signal.signal(());
    }
}

/// Receives the single outcome of an animation.
pub struct Termination<'a> {
    signal: &'a Signal<CriticalSectionRawMutex, Outcome>,
    closed: bool,
}

impl Termination<'_> {
    /// Wait for the animation to end.
    pub async fn wait(self) -> Outcome {
        self.signal.wait().await
    }

    /// Take the outcome if the animation has already ended.
    ///
    /// Returns `Some` at most once; afterwards the termination is closed.
    pub fn try_take(&mut self) -> Option<Outcome> {
        if self.closed {
            return None;
        }
        let outcome = self.signal.try_take();
        self.closed = outcome.is_some();
        outcome
    }

    /// Returns true once the outcome was taken through [`Termination::try_take`].
    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}
