//! Gentle reminder pulse
//!
//! Five quick cosine swells, each pulling the strength at most 1/12 of the
//! way towards full.

use core::f32::consts::PI;

use embassy_time::Duration;

use super::Effect;

/// Length of a single swell
const PERIOD: Duration = Duration::from_millis(125);

/// Number of swells
const CYCLES: u64 = 5;

/// Largest share of the remaining distance to full strength
const WEIGHT: f32 = 1.0 / 12.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarbleEffect;

impl Effect for WarbleEffect {
    const DURATION: Duration = Duration::from_micros(PERIOD.as_micros() * CYCLES);

    fn modulate(&self, since: Duration, input: f32) -> f32 {
        let cycles = since.as_micros() as f32 / PERIOD.as_micros() as f32;
        let position = cycles - libm::floorf(cycles);
        let swell = libm::cosf(2.0 * PI * position) / 2.0 + 0.5;
        1.0 - (1.0 - input) * ((1.0 - WEIGHT) + WEIGHT * swell)
    }
}
