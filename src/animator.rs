//! Animation scheduling loop
//!
//! The [`Animator`] owns the device for the lifetime of an animation. Every
//! iteration it:
//! 1. Reads the lookup tables and checks them against what it wrote last
//! 2. Asks the [`Animation`] for the next frame
//! 3. Programs the frame and reads the result back
//! 4. Waits for the next tick, an injected event or cancellation
//!
//! Writes start at least one update interval apart, also when an event
//! wakes the loop early. With a slow device the period stays at the
//! interval as long as a write takes less than the interval.
//!
//! Cancellation and events are only observed in step 4, so cancellation
//! never interrupts a write in flight.

use core::marker::PhantomData;
use core::pin::pin;

use embassy_time::{Duration, Instant, Timer};
use futures::future::{Either, select};

#[cfg(feature = "log")]
use tracing::{debug, trace};

use crate::animation::Animation;
use crate::channel::{AnimationChannels, CancelHandle, EventSender, Outcome, Termination};
use crate::error::AnimationError;
use crate::lookup_table::LookupTable;
use crate::transfer::TransferFn;
use crate::{GammaDevice, GammaSession};

/// Default number of lookup table updates per second.
pub const DEFAULT_UPDATES_PER_SECOND: u32 = 30;

/// Default minimum interval between two lookup table updates.
pub const DEFAULT_UPDATE_INTERVAL: Duration =
    Duration::from_micros(1_000_000 / DEFAULT_UPDATES_PER_SECOND as u64);

/// When the animation clock starts ticking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockStart {
    /// Start the clock once the device session is open
    #[default]
    AfterSetup,
    /// Start the clock before opening the (possibly slow) device session
    BeforeSetup,
}

/// What to do when another process changes the lookup tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForeignUpdatePolicy {
    /// End the animation with [`AnimationError::ForeignUpdate`]
    #[default]
    Exit,
    /// Adopt the new tables as the baseline and keep animating
    Rebase,
}

/// Configuration for the animator
#[derive(Debug, Clone, Copy)]
pub struct AnimatorConfig {
    /// Initial value of the animation clock
    pub initial_clock: Duration,
    /// When the clock starts relative to opening the session
    pub clock_start: ClockStart,
    /// Minimum interval between two lookup table updates
    pub update_interval: Duration,
    /// Reaction to lookup table changes made by someone else
    pub on_foreign_update: ForeignUpdatePolicy,
    /// Program the baseline curve again when the animation ends cleanly
    pub restore_on_exit: bool,
}

impl AnimatorConfig {
    pub const fn new() -> Self {
        Self {
            initial_clock: Duration::from_ticks(0),
            clock_start: ClockStart::AfterSetup,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            on_foreign_update: ForeignUpdatePolicy::Exit,
            restore_on_exit: true,
        }
    }

    /// Limit updates to `updates` per second.
    ///
    /// Alternative to setting `update_interval` directly. Zero keeps the
    /// current interval.
    #[must_use]
    pub const fn with_updates_per_second(mut self, updates: u32) -> Self {
        if updates > 0 {
            self.update_interval = Duration::from_micros(1_000_000 / updates as u64);
        }
        self
    }
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Handles for interacting with a started animation
pub struct AnimationHandle<'a, E> {
    /// Delivers the outcome exactly once
    pub termination: Termination<'a>,
    /// Injects events into the animation
    pub events: EventSender<'a, E>,
    /// Cancels the animation
    pub cancel: CancelHandle<'a>,
}

/// Animation clock, offset by the configured initial value
#[derive(Debug, Clone, Copy)]
struct AnimationClock {
    started: Instant,
    offset: Duration,
}

impl AnimationClock {
    fn elapsed(&self) -> Duration {
        self.offset + self.started.elapsed()
    }
}

/// Runs an [`Animation`] against a [`GammaDevice`].
///
/// Created by [`Animator::start`]. Nothing happens until [`Animator::run`]
/// is spawned on an executor or awaited.
pub struct Animator<'a, D, A, E> {
    channels: &'a AnimationChannels<E>,
    device: D,
    animation: A,
    config: AnimatorConfig,
    _event: PhantomData<fn(E)>,
}

impl<'a, D, A, E> Animator<'a, D, A, E>
where
    D: GammaDevice,
    A: Animation<E>,
{
    /// Prepare an animation.
    ///
    /// Returns the runner and the handles used to talk to it. Any state left
    /// in `channels` by a previous animation is discarded.
    pub fn start(
        channels: &'a AnimationChannels<E>,
        device: D,
        animation: A,
        config: AnimatorConfig,
    ) -> (Self, AnimationHandle<'a, E>) {
        channels.reset();
        let handle = AnimationHandle {
            termination: channels.termination(),
            events: channels.event_sender(),
            cancel: channels.cancel_handle(),
        };
        let animator = Self {
            channels,
            device,
            animation,
            config,
            _event: PhantomData,
        };
        (animator, handle)
    }

    /// Run the animation until it exits, fails or is cancelled.
    ///
    /// The outcome is published through the [`Termination`] handle.
    pub async fn run(mut self) {
        let outcome = self.animate().await;
        #[cfg(feature = "log")]
        debug!(?outcome, "animation finished");
        self.channels.finish(outcome);
    }

    async fn animate(&mut self) -> Outcome {
        let config = self.config;
        let mut started = Instant::now();
        let mut session = self.device.open().map_err(AnimationError::Setup)?;
        if config.clock_start == ClockStart::AfterSetup {
            started = Instant::now();
        }
        let clock = AnimationClock {
            started,
            offset: config.initial_clock,
        };
        #[cfg(feature = "log")]
        debug!(?config, "animation started");

        let mut baseline = TransferFn::identity();
        let mut written: Option<LookupTable> = None;
        let mut last_write: Option<Instant> = None;
        let mut event = None;

        loop {
            let current = session.lookup_table().map_err(AnimationError::Read)?;
            match &written {
                None => baseline = current.transfer_fn(),
                Some(written) if *written != current => match config.on_foreign_update {
                    ForeignUpdatePolicy::Exit => return Err(AnimationError::ForeignUpdate),
                    ForeignUpdatePolicy::Rebase => {
                        #[cfg(feature = "log")]
                        debug!("lookup tables changed externally, rebasing");
                        baseline = current.transfer_fn();
                    }
                },
                Some(_) => {}
            }

            let frame = self.animation.frame(clock.elapsed(), &baseline, event.take());
            hold_off(last_write, config.update_interval).await;
            let write_start = Instant::now();
            last_write = Some(write_start);
            session
                .set_gamma(&frame.curve)
                .map_err(AnimationError::Read)?;
            written = Some(session.lookup_table().map_err(AnimationError::Read)?);

            // Measured from the start of the write, so device latency doesn't
            // stretch the period
            let remaining = (write_start + config.update_interval)
                .checked_duration_since(Instant::now())
                .unwrap_or(Duration::from_ticks(0));
            let wait = frame.sleep_for.max(remaining);
            #[cfg(feature = "log")]
            trace!(?wait, exit = frame.exit, "frame written");

            // Cancellation wins over a pending event, an event over the timer
            let cancelled = pin!(self.channels.cancelled());
            let next_event = pin!(self.channels.next_event());
            let timer = pin!(Timer::after(wait));
            match select(cancelled, select(next_event, timer)).await {
                Either::Left(((), _)) => {
                    #[cfg(feature = "log")]
                    debug!("animation cancelled");
                    break;
                }
                Either::Right((Either::Left((next, _)), _)) => event = Some(next),
                Either::Right((Either::Right(((), _)), _)) => {}
            }

            if frame.exit {
                break;
            }
        }

        if config.restore_on_exit {
            hold_off(last_write, config.update_interval).await;
            session
                .set_gamma(&baseline)
                .map_err(AnimationError::Read)?;
        }
        Ok(())
    }
}

/// Wait until at least `interval` has passed since the last write started
async fn hold_off(last_write: Option<Instant>, interval: Duration) {
    if let Some(last_write) = last_write {
        let earliest = last_write + interval;
        if Instant::now() < earliest {
            Timer::at(earliest).await;
        }
    }
}
