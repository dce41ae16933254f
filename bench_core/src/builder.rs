//! Builder for `Bench`: collects the instrument, cadence and per-mode
//! configuration, validates cross-references, and wires the controllers.

use std::sync::Arc;

use crate::actuation::PowerMap;
use crate::bench::Bench;
use crate::calibration::{CalibrationTable, SenseScaling};
use crate::channels::Instrument;
use crate::config::{CadenceCfg, LadderCfg, LevelCfg, RideCfg, SleepCfg};
use crate::error::{BuildError, Result};
use crate::modes::{FreeRun, Mode, ModeKind, RideSimulation, SpeedCheck, TorqueLadder};
use crate::pulse::{Drivetrain, Hysteresis};

#[derive(Debug, Clone, Default)]
pub struct BenchBuilder {
    calibration: Option<CalibrationTable>,
    sense: Option<SenseScaling>,
    drivetrain: Option<Drivetrain>,
    hysteresis: Option<Hysteresis>,
    power_map: Option<PowerMap>,
    cadence: Option<CadenceCfg>,
    sleep: Option<SleepCfg>,
    free_run: Option<LevelCfg>,
    ladder: Option<LadderCfg>,
    ride: Option<RideCfg>,
    initial_mode: Option<ModeKind>,
}

impl BenchBuilder {
    pub fn with_calibration(mut self, table: CalibrationTable) -> Self {
        self.calibration = Some(table);
        self
    }

    pub fn with_sense(mut self, sense: SenseScaling) -> Self {
        self.sense = Some(sense);
        self
    }

    pub fn with_drivetrain(mut self, drivetrain: Drivetrain) -> Self {
        self.drivetrain = Some(drivetrain);
        self
    }

    pub fn with_hysteresis(mut self, hysteresis: Hysteresis) -> Self {
        self.hysteresis = Some(hysteresis);
        self
    }

    pub fn with_power_map(mut self, map: PowerMap) -> Self {
        self.power_map = Some(map);
        self
    }

    pub fn with_cadence(mut self, cadence: CadenceCfg) -> Self {
        self.cadence = Some(cadence);
        self
    }

    pub fn with_sleep(mut self, sleep: SleepCfg) -> Self {
        self.sleep = Some(sleep);
        self
    }

    /// Level table shared by free-run and speed-check.
    pub fn with_levels(mut self, levels: LevelCfg) -> Self {
        self.free_run = Some(levels);
        self
    }

    pub fn with_ladder(mut self, ladder: LadderCfg) -> Self {
        self.ladder = Some(ladder);
        self
    }

    pub fn with_ride(mut self, ride: RideCfg) -> Self {
        self.ride = Some(ride);
        self
    }

    pub fn with_initial_mode(mut self, kind: ModeKind) -> Self {
        self.initial_mode = Some(kind);
        self
    }

    /// Validate and assemble. Missing pieces fall back to their defaults.
    pub fn try_build(self) -> Result<Bench> {
        let power_map = self.power_map.unwrap_or_default();
        let levels = self.free_run.unwrap_or_default();
        let ladder = self.ladder.unwrap_or_default();
        let ride = self.ride.unwrap_or_default();
        let cadence = self.cadence.unwrap_or_default();
        let drivetrain = self.drivetrain.unwrap_or_default();

        if power_map.is_empty() {
            return Err(BuildError::EmptyPowerMap.into());
        }
        if levels.steps.is_empty() {
            return Err(BuildError::InvalidConfig("level table is empty").into());
        }
        power_map.check_indices("level", &levels.steps)?;
        if ladder.rungs.is_empty() {
            return Err(BuildError::InvalidConfig("ladder has no rungs").into());
        }
        power_map.check_indices("ladder rung", &ladder.rungs)?;
        if ladder.calc_slots == 0 {
            return Err(BuildError::InvalidConfig("ladder needs at least one calc slot").into());
        }
        if ride.profiles.is_empty() {
            return Err(BuildError::MissingProfiles.into());
        }
        for profile in &ride.profiles {
            power_map.check_indices("profile step", &profile.power_indices())?;
        }
        if !(cadence.fast_ms.is_finite() && cadence.fast_ms > 0.0) {
            return Err(BuildError::InvalidConfig("fast cadence must be > 0 ms").into());
        }
        if drivetrain.motor_poles < 2 || drivetrain.motor_poles % 2 != 0 {
            return Err(BuildError::InvalidConfig("motor poles must be even and >= 2").into());
        }

        let instrument = Arc::new(Instrument {
            calibration: self.calibration.unwrap_or_default(),
            sense: self.sense.unwrap_or_default(),
            drivetrain,
            hysteresis: self.hysteresis.unwrap_or_default(),
            power_map,
        });

        // order must match ModeKind::position
        let modes = vec![
            Mode::FreeRun(FreeRun::new(Arc::clone(&instrument), &levels)),
            Mode::TorqueLadder(TorqueLadder::new(Arc::clone(&instrument), &ladder)),
            Mode::RideSim(RideSimulation::new(
                Arc::clone(&instrument),
                &ride,
                cadence.fast_ms,
            )),
            Mode::SpeedCheck(SpeedCheck::new(Arc::clone(&instrument), &levels)),
        ];
        debug_assert!(ModeKind::ALL
            .iter()
            .all(|k| modes[k.position()].kind() == *k));

        let initial = self.initial_mode.unwrap_or(ModeKind::FreeRun);
        Ok(Bench::from_parts(
            instrument,
            modes,
            initial,
            cadence,
            self.sleep.unwrap_or_default(),
        ))
    }
}
