//! `From`/`TryFrom` implementations bridging `bench_config` types to
//! `bench_core` types, plus a builder seeded from a whole `Config`.

use std::path::Path;

use bench_traits::WakeTrigger;

use crate::actuation::PowerMap;
use crate::builder::BenchBuilder;
use crate::calibration::{AboveRange, CalibrationPoint, CalibrationTable, SenseScaling};
use crate::config::{CadenceCfg, LadderCfg, LevelCfg, RideCfg, SleepCfg};
use crate::error::{BuildError, Result};
use crate::profile::{PowerProfile, ProfileStep};
use crate::pulse::{Drivetrain, Hysteresis};
use crate::util::interval_ms_for_hz;

// ── Sensor / drivetrain / sense ─────────────────────────────────────────────

impl From<&bench_config::Sensor> for Hysteresis {
    fn from(c: &bench_config::Sensor) -> Self {
        Self {
            midpoint: c.midpoint,
            guard_band: c.guard_band,
        }
    }
}

impl From<&bench_config::Drivetrain> for Drivetrain {
    fn from(c: &bench_config::Drivetrain) -> Self {
        Self {
            motor_poles: c.motor_poles,
            gear_ratio: c.gear_ratio,
            wheel_reduction: c.wheel_reduction,
            wheel_diameter_mm: c.wheel_diameter_mm,
        }
    }
}

impl From<&bench_config::Sense> for SenseScaling {
    fn from(c: &bench_config::Sense) -> Self {
        Self {
            current_amps_per_volt: c.current_amps_per_volt,
            current_divider: c.current_divider,
            current_offset_volts: c.current_offset_volts,
        }
    }
}

// ── Cadence / sleep ─────────────────────────────────────────────────────────

impl From<&bench_config::Cadence> for CadenceCfg {
    fn from(c: &bench_config::Cadence) -> Self {
        Self {
            fast_ms: interval_ms_for_hz(c.fast_hz),
            free_run_slow_ms: c.free_run_slow_ms as f64,
            ladder_slow_ms: c.ladder_slow_ms as f64,
            ride_slow_ms: c.ride_slow_ms as f64,
            speed_check_slow_ms: c.speed_check_slow_ms as f64,
        }
    }
}

impl From<&bench_config::Sleep> for SleepCfg {
    fn from(c: &bench_config::Sleep) -> Self {
        Self {
            idle_s: c.idle_s,
            duration_s: c.duration_s,
            wake: c.wake_pin.map_or(WakeTrigger::Timer, WakeTrigger::GpioHigh),
        }
    }
}

// ── Power tables ────────────────────────────────────────────────────────────

impl From<&bench_config::Power> for LevelCfg {
    fn from(c: &bench_config::Power) -> Self {
        Self {
            steps: c.free_run_steps.clone(),
        }
    }
}

impl From<&bench_config::Power> for LadderCfg {
    fn from(c: &bench_config::Power) -> Self {
        Self {
            rungs: c.ladder_rungs.clone(),
            calc_slots: c.calc_slots,
        }
    }
}

impl TryFrom<&bench_config::Power> for PowerMap {
    type Error = BuildError;
    fn try_from(c: &bench_config::Power) -> std::result::Result<Self, Self::Error> {
        PowerMap::new(c.map.clone())
    }
}

// ── Profiles ────────────────────────────────────────────────────────────────

impl TryFrom<&bench_config::Profile> for PowerProfile {
    type Error = BuildError;
    fn try_from(c: &bench_config::Profile) -> std::result::Result<Self, Self::Error> {
        let steps = c
            .steps
            .iter()
            .map(|&(trigger_m, power_index)| ProfileStep::new(trigger_m, power_index))
            .collect();
        PowerProfile::new(c.name.clone(), steps, c.cycle_meters, c.cycles)
    }
}

// ── Calibration ─────────────────────────────────────────────────────────────

impl From<bench_config::AboveRange> for AboveRange {
    fn from(c: bench_config::AboveRange) -> Self {
        match c {
            bench_config::AboveRange::Zero => AboveRange::Zero,
            bench_config::AboveRange::Clamp => AboveRange::Clamp,
        }
    }
}

impl TryFrom<&[bench_config::CalibrationRow]> for CalibrationTable {
    type Error = BuildError;
    fn try_from(rows: &[bench_config::CalibrationRow]) -> std::result::Result<Self, Self::Error> {
        CalibrationTable::new(
            rows.iter()
                .map(|r| CalibrationPoint::new(r.raw, r.volts))
                .collect(),
        )
    }
}

/// Resolve the calibration source: CSV path, then inline points, then the
/// built-in table. Relative CSV paths resolve against `base_dir`.
pub fn calibration_from_config(
    c: &bench_config::CalibrationCfg,
    base_dir: Option<&Path>,
) -> Result<CalibrationTable> {
    let table = if let Some(csv) = &c.csv {
        let path = match base_dir {
            Some(dir) if Path::new(csv).is_relative() => dir.join(csv),
            _ => Path::new(csv).to_path_buf(),
        };
        let rows = bench_config::load_calibration_csv(&path)?;
        CalibrationTable::try_from(rows.as_slice())?
    } else if let Some(rows) = c.rows() {
        CalibrationTable::try_from(rows.as_slice())?
    } else {
        CalibrationTable::default()
    };
    Ok(table.with_above_range(c.above_range.into()))
}

impl BenchBuilder {
    /// Seed every builder field from a validated config.
    pub fn from_config(cfg: &bench_config::Config, base_dir: Option<&Path>) -> Result<Self> {
        let profiles = cfg
            .profiles
            .iter()
            .map(|p| PowerProfile::try_from(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(BenchBuilder::default()
            .with_calibration(calibration_from_config(&cfg.calibration, base_dir)?)
            .with_sense(SenseScaling::from(&cfg.sense))
            .with_drivetrain(Drivetrain::from(&cfg.drivetrain))
            .with_hysteresis(Hysteresis::from(&cfg.sensor))
            .with_power_map(PowerMap::try_from(&cfg.power)?)
            .with_cadence(CadenceCfg::from(&cfg.cadence))
            .with_sleep(SleepCfg::from(&cfg.sleep))
            .with_levels(LevelCfg::from(&cfg.power))
            .with_ladder(LadderCfg::from(&cfg.power))
            .with_ride(RideCfg {
                profiles,
                pack_volts: cfg.ride.pack_volts,
            }))
    }
}
