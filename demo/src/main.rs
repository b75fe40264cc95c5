//! Demo app for myrtio-gamma-composer
//!
//! Drives a simulated display through the animations and curves of the
//! library. Run with `RUST_LOG=debug` (or `trace`) to follow every write.

mod alert;
mod curves;
mod display;
mod pulse;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use myrtio_gamma_composer::VirtualDisplay;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::display::TracedDisplay;

#[derive(Parser)]
#[command(name = "myrtio-gamma-demo", about = "Animated gamma curves on a simulated display")]
struct Cli {
    /// Number of simulated display controllers
    #[arg(long, default_value_t = 2)]
    controllers: usize,

    /// Lookup table size of every controller
    #[arg(long, default_value_t = 256)]
    size: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Soft red alert; stdin `s` strobes, `w` warbles, `q` or Ctrl-C exits
    Alert,
    /// Make the screen pulse for 12 seconds
    Pulse,
    /// Apply a power law curve
    Power {
        /// Exponent of the curve
        exponent: f32,
    },
    /// Dim the current curve by 50%
    Dim,
    /// Make all the channels bilevel
    Bilevel,
    /// Reset the curve to identity
    Reset,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let display = TracedDisplay::new(VirtualDisplay::new(cli.controllers, cli.size));

    let result = match cli.command {
        Command::Alert => alert::run(display),
        Command::Pulse => pulse::run(display),
        Command::Power { exponent } => curves::power(display, exponent),
        Command::Dim => curves::dim(display),
        Command::Bilevel => curves::bilevel(display),
        Command::Reset => curves::reset(display),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
