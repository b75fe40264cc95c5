//! Running effects folded into a single strength

use embassy_time::Duration;
use heapless::Vec;

use crate::effect::{EffectId, EffectSlot};

/// Effect with the animation time it was started at
#[derive(Debug, Clone, Copy)]
pub struct ActiveEffect {
    pub slot: EffectSlot,
    pub start: Duration,
}

/// Ordered list of running effects
///
/// N is the maximum number of effects running at once
///
/// Effects are folded in list order into one strength per tick. Finished
/// effects are swapped with the last entry, so the order of the survivors
/// may change between ticks.
#[derive(Debug, Default)]
pub struct EffectStack<const N: usize> {
    inner: Vec<ActiveEffect, N>,
}

impl<const N: usize> EffectStack<N> {
    pub const fn new() -> Self {
        Self { inner: Vec::new() }
    }

    /// Push an effect started at `now`
    ///
    /// Returns the effect back if the stack is full
    pub fn push(&mut self, slot: EffectSlot, now: Duration) -> Result<(), EffectSlot> {
        self.inner
            .push(ActiveEffect { slot, start: now })
            .map_err(|rejected| rejected.slot)
    }

    /// Push a built-in effect by id
    pub fn push_id(&mut self, id: EffectId, now: Duration) -> Result<(), EffectSlot> {
        self.push(id.to_slot(), now)
    }

    /// Fold all running effects into one strength.
    ///
    /// Starts from 0 and chains every effect's output into the next one.
    /// Effects that report completion are removed.
    pub fn tick(&mut self, now: Duration) -> f32 {
        let mut strength = 0.0;
        let mut idx = 0;
        while idx < self.inner.len() {
            let effect = self.inner[idx];
            let since = now.checked_sub(effect.start).unwrap_or(Duration::from_ticks(0));
            let (out, done) = effect.slot.apply(since, strength);
            strength = out;
            if done {
                self.inner.swap_remove(idx);
            } else {
                idx += 1;
            }
        }
        strength
    }

    /// Returns true if at least one effect is running
    pub fn is_active(&self) -> bool {
        !self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Running effects in folding order
    pub fn iter(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.inner.iter()
    }
}
