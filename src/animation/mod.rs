//! Driver functions
//!
//! An [`Animation`] is the stateful per-tick step the [`Animator`](crate::Animator)
//! calls to find out which curve to program next. It receives everything it
//! depends on as arguments and never touches the device itself.

mod alert;

use embassy_time::Duration;
pub use alert::{AlertAnimation, AlertCommand, AlertStage, AlertTimings};

use crate::transfer::TransferFn;

/// Output of a single animation step
#[derive(Debug, Clone)]
pub struct Frame {
    /// Curve to program now
    pub curve: TransferFn,
    /// Advisory time until the curve is expected to change.
    ///
    /// The animator may wake up earlier, e.g. when an event arrives.
    pub sleep_for: Duration,
    /// Ends the animation after this frame
    pub exit: bool,
}

impl Frame {
    /// Frame asking to be called again as soon as possible
    pub const fn new(curve: TransferFn) -> Self {
        Self {
            curve,
            sleep_for: Duration::from_ticks(0),
            exit: false,
        }
    }

    /// Set the advisory sleep
    #[must_use]
    pub fn with_sleep(mut self, sleep_for: Duration) -> Self {
        self.sleep_for = sleep_for;
        self
    }

    /// Mark this frame as the last one
    #[must_use]
    pub fn with_exit(mut self, exit: bool) -> Self {
        self.exit = exit;
        self
    }
}

/// Per-tick step of an animation with events of type `E`
///
/// Must not block. For a given internal state and inputs the result must be
/// deterministic.
pub trait Animation<E> {
    /// Produce the frame for time `t` since the animation started.
    ///
    /// `base` reflects the lookup tables found on the device when the
    /// animation started (or after the last rebase). `event` carries the
    /// event that woke the animator, if any.
    fn frame(&mut self, t: Duration, base: &TransferFn, event: Option<E>) -> Frame;
}

impl<E, F> Animation<E> for F
where
    F: FnMut(Duration, &TransferFn, Option<E>) -> Frame,
{
    fn frame(&mut self, t: Duration, base: &TransferFn, event: Option<E>) -> Frame {
        self(t, base, event)
    }
}

/// Share of `total` covered by `elapsed`, not clamped
pub(crate) fn progress(elapsed: Duration, total: Duration) -> f32 {
    if total.as_ticks() == 0 {
        return 1.0;
    }
    elapsed.as_micros() as f32 / total.as_micros() as f32
}
