//! Alert overlay
//!
//! Turns the display a soft red with a short fade-in, holds it, and fades
//! back out on [`AlertCommand::Exit`]. Warble and strobe commands add
//! emphasis effects on top of whatever stage is running.

use embassy_time::Duration;

#[cfg(feature = "log")]
use tracing::debug;

use super::{Animation, Frame, progress};
use crate::effect::EffectId;
use crate::effect_stack::EffectStack;
use crate::transfer::{Channel, TransferFn};

/// Maximum number of emphasis effects running at once
const MAX_EFFECTS: usize = 16;

/// Red compensation with no effect running
const RED_FLOOR: f32 = 0.2;

/// How much running effects add to the compensation of every channel
const EFFECT_GAIN: f32 = 0.6;

/// Command for a running alert
///
/// At most 16 warble and strobe effects run at once. Further emphasis
/// commands are dropped until one of them finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertCommand {
    /// Gently modulate the alert to remind the user it's there
    Warble,
    /// Add a moment of bold emphasis
    Strobe,
    /// Fade the alert out and end the animation
    Exit,
}

/// Stage of the alert lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertStage {
    Entering,
    Static,
    Exiting,
}

/// Configuration for alert transitions
#[derive(Debug, Clone, Copy)]
pub struct AlertTimings {
    /// Duration of the fade-in and of the fade-out
    pub enter_exit: Duration,
    /// Suggested sleep while nothing changes
    pub idle: Duration,
}

impl Default for AlertTimings {
    fn default() -> Self {
        Self {
            enter_exit: Duration::from_millis(250),
            idle: Duration::from_secs(2),
        }
    }
}

/// Alert state machine
#[derive(Debug)]
pub struct AlertAnimation {
    timings: AlertTimings,
    stage: AlertStage,
    stage_start: Duration,
    /// Progress credited to the current stage on entry
    head_start: Duration,
    strength: f32,
    effects: EffectStack<MAX_EFFECTS>,
}

impl AlertAnimation {
    pub fn new() -> Self {
        Self::with_timings(AlertTimings::default())
    }

    pub fn with_timings(timings: AlertTimings) -> Self {
        Self {
            timings,
            stage: AlertStage::Entering,
            stage_start: Duration::from_ticks(0),
            head_start: Duration::from_ticks(0),
            strength: 0.0,
            effects: EffectStack::new(),
        }
    }

    /// Current stage
    pub const fn stage(&self) -> AlertStage {
        self.stage
    }

    /// Stage strength computed by the last step
    pub const fn strength(&self) -> f32 {
        self.strength
    }

    /// Number of running emphasis effects
    pub fn active_effects(&self) -> usize {
        self.effects.len()
    }

    /// Advance the state machine to time `t` and build its frame
    pub fn step(&mut self, t: Duration, base: &TransferFn, command: Option<AlertCommand>) -> Frame {
        if let Some(command) = command {
            self.handle_command(command, t);
        }

        let since = self.since_stage(t);
        let mut exit = false;
        let mut sleep_for = Duration::from_ticks(0);
        match self.stage {
            AlertStage::Entering => {
                self.strength = progress(since, self.timings.enter_exit);
                if self.strength >= 1.0 {
                    self.strength = 1.0;
                    self.set_stage(AlertStage::Static, t);
                }
            }
            AlertStage::Static => {
                self.strength = 1.0;
                sleep_for = self.timings.idle;
            }
            AlertStage::Exiting => {
                self.strength = 1.0 - progress(since, self.timings.enter_exit);
                if self.strength < 0.0 {
                    self.strength = 0.0;
                    exit = true;
                }
            }
        }

        let effect_strength = self.effects.tick(t);
        if self.effects.is_active() {
            sleep_for = Duration::from_ticks(0);
        }

        Frame::new(alert_curve(base, self.strength, effect_strength))
            .with_sleep(sleep_for)
            .with_exit(exit)
    }

    fn handle_command(&mut self, command: AlertCommand, t: Duration) {
        #[cfg(feature = "log")]
        debug!(?command, stage = ?self.stage, "alert command");
        match command {
            AlertCommand::Warble => self.start_effect(EffectId::Warble, t),
            AlertCommand::Strobe => self.start_effect(EffectId::Strobe, t),
            AlertCommand::Exit => match self.stage {
                AlertStage::Static => self.set_stage(AlertStage::Exiting, t),
                AlertStage::Entering => {
                    // Fade out from the partial strength reached so far
                    let since = self.since_stage(t);
                    self.set_stage(AlertStage::Exiting, t);
                    self.head_start = self
                        .timings
                        .enter_exit
                        .checked_sub(since)
                        .unwrap_or(Duration::from_ticks(0));
                }
                AlertStage::Exiting => {}
            },
        }
    }

    /// Start an effect unless the effect limit is reached
    fn start_effect(&mut self, id: EffectId, t: Duration) {
        if self.effects.push_id(id, t).is_err() {
            #[cfg(feature = "log")]
            debug!(effect = id.as_str(), "effect limit reached, command dropped");
        }
    }

    fn set_stage(&mut self, stage: AlertStage, t: Duration) {
        self.stage = stage;
        self.stage_start = t;
        self.head_start = Duration::from_ticks(0);
    }

    fn since_stage(&self, t: Duration) -> Duration {
        t.checked_sub(self.stage_start)
            .unwrap_or(Duration::from_ticks(0))
            + self.head_start
    }
}

impl Default for AlertAnimation {
    fn default() -> Self {
        Self::new()
    }
}

impl Animation<AlertCommand> for AlertAnimation {
    fn frame(&mut self, t: Duration, base: &TransferFn, event: Option<AlertCommand>) -> Frame {
        self.step(t, base, event)
    }
}

/// Blend the red-shifted curve over `base` by `strength`
fn alert_curve(base: &TransferFn, strength: f32, effect_strength: f32) -> TransferFn {
    let base = base.clone();
    let red_cmp = RED_FLOOR + EFFECT_GAIN * effect_strength;
    let other_cmp = EFFECT_GAIN * effect_strength;
    TransferFn::new(move |channel, input| {
        let level = base.apply(channel, input);
        let shifted = match channel {
            Channel::Red => level * (1.0 - red_cmp) + red_cmp,
            Channel::Green | Channel::Blue => level * (1.0 - other_cmp),
        };
        strength * shifted + (1.0 - strength) * level
    })
}
