#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Measurement and mode state machine for the motor test bench
//! (hardware-agnostic).
//!
//! All hardware goes through the `bench_traits` seams. One cooperative loop
//! feeds raw samples into the active controller's counters and checks two
//! periodic gates; everything else happens on those tick boundaries.
//!
//! ## Architecture
//!
//! - **Conversion**: piecewise-linear ADC→volts table and current scaling
//!   (`calibration`), rising-edge rotation counting (`pulse`), per-channel
//!   averaging (`averager`).
//! - **Pacing**: fast and slow `PeriodicGate`s (`gate`).
//! - **Controllers**: free-run, torque ladder, ride simulation and speed
//!   check behind one `ModeController` contract (`modes`).
//! - **Glue**: `Bench` owns the controllers and gates and writes power once
//!   per fast tick; `runner` drives it from the seams.

pub mod actuation;
pub mod averager;
pub mod bench;
pub mod builder;
pub mod calibration;
pub mod channels;
pub mod config;
pub mod conversions;
pub mod error;
pub mod gate;
pub mod hw_error;
pub mod mocks;
pub mod modes;
pub mod profile;
pub mod pulse;
pub mod runner;
pub mod snapshot;
pub mod util;

pub use actuation::PowerMap;
pub use bench::{Bench, StepReport};
pub use builder::BenchBuilder;
pub use calibration::{AboveRange, CalibrationPoint, CalibrationTable, SenseScaling};
pub use channels::{Instrument, SenseChannels};
pub use error::{BenchError, BuildError, Result};
pub use gate::PeriodicGate;
pub use modes::{Mode, ModeController, ModeKind};
pub use profile::{PowerProfile, ProfileStep};
pub use runner::{Ports, RunParams, RunSummary, run};
pub use snapshot::{Measurement, RunAccumulator};
