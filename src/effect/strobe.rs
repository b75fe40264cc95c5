//! Bold emphasis flash
//!
//! Jumps halfway to full strength, then fades the remaining half in
//! linearly before dropping back.

use embassy_time::Duration;

use super::Effect;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrobeEffect;

impl Effect for StrobeEffect {
    const DURATION: Duration = Duration::from_millis(1250);

    fn modulate(&self, since: Duration, input: f32) -> f32 {
        let progress = since.as_micros() as f32 / Self::DURATION.as_micros() as f32;
        1.0 - (1.0 - input) * (0.5 + 0.5 * progress)
    }
}
