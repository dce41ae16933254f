//! Mode controllers: one state machine per bench mode behind a shared
//! contract, selected through the `Mode` enum.
//!
//! Button handlers only latch flags. Transitions happen on the next fast or
//! slow tick so a measurement window never straddles a state change.

use std::fmt;
use std::str::FromStr;

use bench_traits::Display;

use crate::channels::SenseChannels;
use crate::snapshot::Measurement;

pub mod free_run;
pub mod ride_sim;
pub mod speed_check;
pub mod torque_ladder;

pub use free_run::FreeRun;
pub use ride_sim::{RideSimulation, RideState};
pub use speed_check::SpeedCheck;
pub use torque_ladder::{LadderState, TorqueLadder};

pub trait ModeController {
    fn kind(&self) -> ModeKind;

    /// Counters fed by the driver loop on every sample.
    fn channels(&mut self) -> &mut SenseChannels;

    /// Fast cadence: apply latched flags, integrate, render, settle the
    /// desired power level.
    fn on_fast_tick(&mut self, now_ms: f64, display: &mut dyn Display);

    /// Slow cadence: close the measurement window and step discrete state.
    fn on_slow_tick(&mut self, now_ms: f64, display: &mut dyn Display);

    fn on_button_primary(&mut self);
    fn on_button_secondary(&mut self);
    fn on_button_secondary_long(&mut self);

    /// Back to the initial state: counters, snapshots, indices, flags.
    fn reset(&mut self);

    /// Output duty the controller wants this frame.
    fn power_level(&self) -> u8;

    /// True when no sweep or run is in progress.
    fn is_idle(&self) -> bool {
        true
    }

    /// Most recent closed window.
    fn snapshot(&self) -> Measurement;

    /// Set when the controller started a fresh sequence and wants the slow
    /// window to restart from now. Cleared by reading.
    fn take_window_restart(&mut self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    FreeRun,
    TorqueLadder,
    RideSim,
    SpeedCheck,
}

impl ModeKind {
    pub const ALL: [ModeKind; 4] = [
        ModeKind::FreeRun,
        ModeKind::TorqueLadder,
        ModeKind::RideSim,
        ModeKind::SpeedCheck,
    ];

    /// Mode selected by the next-mode button.
    pub fn next(self) -> Self {
        match self {
            ModeKind::FreeRun => ModeKind::TorqueLadder,
            ModeKind::TorqueLadder => ModeKind::RideSim,
            ModeKind::RideSim => ModeKind::SpeedCheck,
            ModeKind::SpeedCheck => ModeKind::FreeRun,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ModeKind::FreeRun => "free-run",
            ModeKind::TorqueLadder => "torque-ladder",
            ModeKind::RideSim => "ride-sim",
            ModeKind::SpeedCheck => "speed-check",
        }
    }

    pub(crate) fn position(self) -> usize {
        match self {
            ModeKind::FreeRun => 0,
            ModeKind::TorqueLadder => 1,
            ModeKind::RideSim => 2,
            ModeKind::SpeedCheck => 3,
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModeKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown mode '{s}'"))
    }
}

/// The four controllers as a closed set.
#[derive(Debug)]
pub enum Mode {
    FreeRun(FreeRun),
    TorqueLadder(TorqueLadder),
    RideSim(RideSimulation),
    SpeedCheck(SpeedCheck),
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        self.controller().kind()
    }

    pub fn controller(&self) -> &dyn ModeController {
        match self {
            Mode::FreeRun(c) => c,
            Mode::TorqueLadder(c) => c,
            Mode::RideSim(c) => c,
            Mode::SpeedCheck(c) => c,
        }
    }

    pub fn controller_mut(&mut self) -> &mut dyn ModeController {
        match self {
            Mode::FreeRun(c) => c,
            Mode::TorqueLadder(c) => c,
            Mode::RideSim(c) => c,
            Mode::SpeedCheck(c) => c,
        }
    }
}

// Character-cell layout shared by the measurement rows.
pub(crate) const COL_RPM: u8 = 3;
pub(crate) const WIDTH_RPM: u8 = 6;
pub(crate) const COL_VOLTS: u8 = 10;
pub(crate) const WIDTH_VOLTS: u8 = 4;
pub(crate) const COL_AMPS: u8 = 15;
pub(crate) const WIDTH_AMPS: u8 = 5;

/// One rpm/volts/amps row. Current is clamped for display only.
pub(crate) fn draw_measurement(display: &mut dyn Display, m: &Measurement, row: u8) {
    display.draw_int(m.rpm, COL_RPM, row, WIDTH_RPM);
    display.draw_float(m.volts, COL_VOLTS, row, WIDTH_VOLTS);
    display.draw_float(m.display_amps(), COL_AMPS, row, WIDTH_AMPS);
}

/// Cyclic cursor over a list of power-map indices with a latched advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LevelCycle {
    steps: Vec<usize>,
    index: usize,
    pending: bool,
}

impl LevelCycle {
    pub(crate) fn new(steps: Vec<usize>) -> Self {
        Self {
            steps,
            index: 0,
            pending: false,
        }
    }

    pub(crate) fn request_next(&mut self) {
        self.pending = true;
    }

    /// Apply a latched advance. Returns true when the level changed.
    pub(crate) fn apply_pending(&mut self) -> bool {
        if !std::mem::take(&mut self.pending) || self.steps.is_empty() {
            return false;
        }
        self.index = (self.index + 1) % self.steps.len();
        true
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// Power-map index of the current level.
    pub(crate) fn power_index(&self) -> usize {
        self.steps.get(self.index).copied().unwrap_or(0)
    }

    pub(crate) fn reset(&mut self) {
        self.index = 0;
        self.pending = false;
    }
}
