//! One-shot curve writes

use myrtio_gamma_composer::{Channel, GammaDevice, GammaSession, TransferFn};
use tracing::info;

use crate::display::TracedDisplay;

pub(crate) fn power(display: TracedDisplay, exponent: f32) -> anyhow::Result<()> {
    apply(display, &TransferFn::power(exponent))
}

pub(crate) fn dim(mut display: TracedDisplay) -> anyhow::Result<()> {
    let mut session = display.open()?;
    let base = session.lookup_table()?.transfer_fn();
    session.set_gamma(&TransferFn::dim(0.5).multiply(&base))?;
    report(&display);
    Ok(())
}

pub(crate) fn bilevel(display: TracedDisplay) -> anyhow::Result<()> {
    apply(display, &TransferFn::bilevel(0.5))
}

pub(crate) fn reset(display: TracedDisplay) -> anyhow::Result<()> {
    apply(display, &TransferFn::identity())
}

fn apply(mut display: TracedDisplay, curve: &TransferFn) -> anyhow::Result<()> {
    let mut session = display.open()?;
    session.set_gamma(curve)?;
    report(&display);
    Ok(())
}

fn report(display: &TracedDisplay) {
    for input in [0.25, 0.5, 0.75] {
        let level = |channel| display.display().sample(0, channel, input).unwrap_or(0.0);
        info!(
            input,
            red = level(Channel::Red),
            green = level(Channel::Green),
            blue = level(Channel::Blue),
            "programmed"
        );
    }
}
