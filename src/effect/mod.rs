//! Transient strength modifiers
//!
//! Effects are short-lived contributions to a composite strength in `[0, 1]`.
//! All built-in effects live in [`EffectSlot`] so the stack needs no heap.

mod strobe;
mod warble;

use embassy_time::Duration;
pub use strobe::StrobeEffect;
pub use warble::WarbleEffect;

const EFFECT_NAME_WARBLE: &str = "warble";
const EFFECT_NAME_STROBE: &str = "strobe";

pub trait Effect {
    /// Time after which the effect is finished
    const DURATION: Duration;

    /// Modulate `input` strength while the effect is running
    fn modulate(&self, since: Duration, input: f32) -> f32;

    /// Apply the effect `since` its start.
    ///
    /// Returns the output strength and whether the effect is done. A finished
    /// effect passes its input through unchanged.
    fn apply(&self, since: Duration, input: f32) -> (f32, bool) {
        if since >= Self::DURATION {
            return (input, true);
        }
        (self.modulate(since, input), false)
    }
}

/// Effect slot - enum containing all built-in effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectSlot {
    Warble(WarbleEffect),
    Strobe(StrobeEffect),
}

/// Known effect ids that can be requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectId {
    Warble,
    Strobe,
}

impl EffectId {
    pub const fn to_slot(self) -> EffectSlot {
        match self {
            Self::Warble => EffectSlot::Warble(WarbleEffect),
            Self::Strobe => EffectSlot::Strobe(StrobeEffect),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warble => EFFECT_NAME_WARBLE,
            Self::Strobe => EFFECT_NAME_STROBE,
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        match s {
            EFFECT_NAME_WARBLE => Some(Self::Warble),
            EFFECT_NAME_STROBE => Some(Self::Strobe),
            _ => None,
        }
    }
}

impl EffectSlot {
    /// Apply the effect `since` its start, see [`Effect::apply`]
    pub fn apply(&self, since: Duration, input: f32) -> (f32, bool) {
        match self {
            Self::Warble(effect) => effect.apply(since, input),
            Self::Strobe(effect) => effect.apply(since, input),
        }
    }

    /// Total running time of the effect
    pub const fn duration(&self) -> Duration {
        match self {
            Self::Warble(_) => WarbleEffect::DURATION,
            Self::Strobe(_) => StrobeEffect::DURATION,
        }
    }

    /// Get the effect ID for external observation
    pub const fn id(&self) -> EffectId {
        match self {
            Self::Warble(_) => EffectId::Warble,
            Self::Strobe(_) => EffectId::Strobe,
        }
    }
}
