//! CLI argument definitions and shared statics.

use bench_core::ModeKind;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::buttons::Press;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "bench", version, about = "Motor test bench")]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/bench.toml")]
    pub config: PathBuf,

    /// Calibration CSV (headers raw,volts); overrides [calibration]
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// JSON output and JSON log lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a measurement mode against the rig
    Run {
        /// free-run | torque-ladder | ride-sim | speed-check
        #[arg(long, default_value = "free-run")]
        mode: ModeKind,
        /// Stop after this many milliseconds (default: until Ctrl-C)
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
        /// Scripted button press, e.g. 1500:long (primary|secondary|long|next)
        #[arg(long, value_name = "MS:EVENT")]
        press: Vec<Press>,
        /// Zero the current channel from idle samples before starting
        #[arg(long, action = ArgAction::SetTrue)]
        zero_current: bool,
    },
    /// Print the calibration curve
    Table {
        /// Raw-count step between rows
        #[arg(long, default_value_t = 256, value_parser = clap::value_parser!(u32).range(1..=4096))]
        step: u32,
    },
    /// Read a few samples and report the sense taps
    SelfCheck {
        #[arg(long, default_value_t = 32, value_parser = clap::value_parser!(u32).range(1..))]
        samples: u32,
    },
}
