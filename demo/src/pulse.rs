//! Pulsing power curve

use std::thread;

use futures::executor::block_on;
use myrtio_gamma_composer::{
    AnimationChannels, Animator, AnimatorConfig, Duration, Frame, TransferFn,
};
use tracing::info;

use crate::display::TracedDisplay;

static PULSE_CHANNELS: AnimationChannels<()> = AnimationChannels::new();

/// Duration of one leg of the pulse
const LEG: Duration = Duration::from_millis(500);

/// Exponents visited by the pulse, one leg between each pair
const EXPONENTS: [f32; 5] = [1.0, 0.25, 1.0, 4.0, 1.0];

/// Total running time
const PULSE_LENGTH: Duration = Duration::from_secs(12);

pub(crate) fn run(display: TracedDisplay) -> anyhow::Result<()> {
    let (animator, handle) = Animator::start(
        &PULSE_CHANNELS,
        display,
        pulse,
        AnimatorConfig::default(),
    );
    let cancel = handle.cancel;
    ctrlc::set_handler(move || cancel.cancel())?;

    info!("Pulsing for {} seconds (Ctrl+C to stop)", PULSE_LENGTH.as_secs());
    let worker = thread::spawn(move || block_on(animator.run()));
    let outcome = block_on(handle.termination.wait());
    let _ = worker.join();
    outcome?;
    info!("Done.");
    Ok(())
}

fn pulse(t: Duration, _base: &TransferFn, _event: Option<()>) -> Frame {
    let legs = t.as_micros() as f32 / LEG.as_micros() as f32;
    let leg = legs.floor();
    let position = legs - leg;
    let from = (leg as usize) % (EXPONENTS.len() - 1);
    let exponent = EXPONENTS[from] * (1.0 - position) + EXPONENTS[from + 1] * position;
    Frame::new(TransferFn::power(exponent)).with_exit(t >= PULSE_LENGTH)
}
