//! pwrcap-sim command line

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::error;
use pwrcap_core::config::CaptureMode;
use pwrcap_sim::{logger, run, SimFile};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Disabled,
    InitOnly,
    Continuous,
    Burst,
}

impl From<Mode> for CaptureMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Disabled => CaptureMode::Disabled,
            Mode::InitOnly => CaptureMode::InitOnly,
            Mode::Continuous => CaptureMode::Continuous,
            Mode::Burst => CaptureMode::Burst,
        }
    }
}

/// Simulate the low-power capture loop on the host
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Capture config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulated run time in seconds
    #[arg(short, long)]
    seconds: Option<u32>,

    /// Capture mode
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// Transfers per burst
    #[arg(short, long)]
    burst_size: Option<u32>,

    /// Timer period in reference ticks
    #[arg(short, long)]
    period_ticks: Option<u32>,

    /// Reference ticks one transfer takes
    #[arg(short, long)]
    transfer_ticks: Option<u32>,

    /// Log every main loop event
    #[arg(long)]
    trace: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn apply(&self, file: &mut SimFile) {
        let capture = &mut file.capture.capture;
        if let Some(mode) = self.mode {
            capture.mode = mode.into();
        }
        if let Some(n) = self.burst_size {
            capture.burst_size = n;
        }
        if let Some(n) = self.period_ticks {
            capture.timer_period_ticks = n;
        }
        if let Some(n) = self.seconds {
            file.sim.seconds = n;
        }
        if let Some(n) = self.transfer_ticks {
            file.sim.transfer_ticks = n;
        }
        if self.trace {
            file.capture.debug.print_enabled = true;
            file.capture.debug.print_in_loop = true;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let mut file = match &cli.config {
        Some(path) => match SimFile::load(path) {
            Ok(file) => file,
            Err(e) => {
                error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => SimFile::default(),
    };
    cli.apply(&mut file);

    match run(&file) {
        Ok(report) => {
            print!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
