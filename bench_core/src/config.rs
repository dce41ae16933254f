//! Runtime configuration for the bench and its mode controllers.
//!
//! Separate from the TOML schema in `bench_config`; see `conversions` for
//! the mapping.

use bench_traits::WakeTrigger;

use crate::modes::ModeKind;
use crate::profile::PowerProfile;
use crate::util::interval_ms_for_hz;

/// Fast/slow gate intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct CadenceCfg {
    /// Display refresh and integration frame.
    pub fast_ms: f64,
    pub free_run_slow_ms: f64,
    pub ladder_slow_ms: f64,
    pub ride_slow_ms: f64,
    pub speed_check_slow_ms: f64,
}

impl Default for CadenceCfg {
    fn default() -> Self {
        Self {
            fast_ms: interval_ms_for_hz(15.0),
            free_run_slow_ms: 1000.0,
            ladder_slow_ms: 2000.0,
            ride_slow_ms: 2000.0,
            speed_check_slow_ms: 1000.0,
        }
    }
}

impl CadenceCfg {
    pub fn slow_ms_for(&self, kind: ModeKind) -> f64 {
        match kind {
            ModeKind::FreeRun => self.free_run_slow_ms,
            ModeKind::TorqueLadder => self.ladder_slow_ms,
            ModeKind::RideSim => self.ride_slow_ms,
            ModeKind::SpeedCheck => self.speed_check_slow_ms,
        }
    }
}

/// Idle power-down policy applied by the bench glue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepCfg {
    /// Seconds without button activity before sleeping; 0 disables.
    pub idle_s: u32,
    pub duration_s: u32,
    pub wake: WakeTrigger,
}

impl Default for SleepCfg {
    fn default() -> Self {
        Self {
            idle_s: 0,
            duration_s: 10,
            wake: WakeTrigger::GpioHigh(2),
        }
    }
}

/// Power-map indices the free-run and speed-check modes step through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelCfg {
    pub steps: Vec<usize>,
}

impl Default for LevelCfg {
    fn default() -> Self {
        Self {
            steps: (0..7).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderCfg {
    /// Power-map index of each rung, in sweep order.
    pub rungs: Vec<usize>,
    pub calc_slots: usize,
}

impl Default for LadderCfg {
    fn default() -> Self {
        Self {
            rungs: vec![0, 3, 6],
            calc_slots: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RideCfg {
    pub profiles: Vec<PowerProfile>,
    /// Nominal pack voltage for the mAh readout.
    pub pack_volts: f32,
}

impl Default for RideCfg {
    fn default() -> Self {
        Self {
            profiles: vec![PowerProfile::sprint(), PowerProfile::steady()],
            pack_volts: 2.4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_and_ride_close_windows_every_two_seconds() {
        let c = CadenceCfg::default();
        assert_eq!(c.slow_ms_for(ModeKind::TorqueLadder), 2000.0);
        assert_eq!(c.slow_ms_for(ModeKind::RideSim), 2000.0);
        assert_eq!(c.slow_ms_for(ModeKind::FreeRun), 1000.0);
    }
}
