//! Interactive alert

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use futures::executor::block_on;
use myrtio_gamma_composer::{
    AlertAnimation, AlertCommand, AnimationChannels, Animator, AnimatorConfig,
};
use tracing::{info, warn};

use crate::display::TracedDisplay;

static ALERT_CHANNELS: AnimationChannels<AlertCommand> = AnimationChannels::new();

pub(crate) fn run(display: TracedDisplay) -> anyhow::Result<()> {
    let (animator, handle) = Animator::start(
        &ALERT_CHANNELS,
        display,
        AlertAnimation::new(),
        AnimatorConfig::default(),
    );
    let events = handle.events;
    let cancel = handle.cancel;

    // First Ctrl-C fades out, the second one cancels
    let exiting = Arc::new(AtomicBool::new(false));
    ctrlc::set_handler(move || {
        if exiting.swap(true, Ordering::SeqCst) {
            cancel.cancel();
        } else {
            block_on(events.send(AlertCommand::Exit));
        }
    })?;

    info!("Type `s` to strobe, `w` to warble, `q` to exit (Ctrl+C twice cancels)");
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let command = match line.trim() {
                "s" => AlertCommand::Strobe,
                "w" => AlertCommand::Warble,
                "q" => AlertCommand::Exit,
                other => {
                    warn!("unknown command {other:?}");
                    continue;
                }
            };
            block_on(events.send(command));
        }
    });

    let worker = thread::spawn(move || block_on(animator.run()));
    let outcome = block_on(handle.termination.wait());
    let _ = worker.join();
    outcome?;
    info!("Done.");
    Ok(())
}
