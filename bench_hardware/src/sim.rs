//! Simulated motor rig.
//!
//! The power output and the sensor share one duty cell: the square wave on
//! the rotation channel speeds up with duty, the supply sags, and the shunt
//! tap drops below its zero point as current rises.

use crate::error::HwError;
use bench_traits::{PowerOutput, RawSample, SeamError, SensorSource, SleepControl, WakeTrigger};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    pub sample_period_ms: f64,
    /// Rising edges per second on the rotation channel at full duty.
    pub full_scale_edges_per_s: f64,
    pub rotation_high: u32,
    pub rotation_low: u32,
    pub supply_raw: u32,
    pub sag_raw_at_full: u32,
    pub current_zero_raw: u32,
    pub current_raw_at_full: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            sample_period_ms: 1.0,
            full_scale_edges_per_s: 350.0,
            rotation_high: 4000,
            rotation_low: 100,
            // ~4.0 V on the default table
            supply_raw: 2698,
            sag_raw_at_full: 170,
            // 3.0 V at the tap, so a 1.5 V offset reads 0 A
            current_zero_raw: 2011,
            current_raw_at_full: 330,
        }
    }
}

/// Owns the shared duty cell and hands out the two halves of the rig.
#[derive(Debug, Default, Clone)]
pub struct SimulatedRig {
    duty: Rc<Cell<u8>>,
    cfg: SimConfig,
}

impl SimulatedRig {
    pub fn new(cfg: SimConfig) -> Self {
        Self {
            duty: Rc::new(Cell::new(0)),
            cfg,
        }
    }

    pub fn duty(&self) -> u8 {
        self.duty.get()
    }

    pub fn sensor(&self) -> SimSensor {
        SimSensor {
            duty: self.duty.clone(),
            cfg: self.cfg,
            phase: 0.0,
            samples: 0,
            fail_after: None,
        }
    }

    pub fn power(&self) -> SimPower {
        SimPower {
            duty: self.duty.clone(),
        }
    }
}

#[derive(Debug)]
pub struct SimSensor {
    duty: Rc<Cell<u8>>,
    cfg: SimConfig,
    phase: f64,
    samples: u64,
    fail_after: Option<u64>,
}

impl SimSensor {
    /// Every read after the first `n` fails with `HwError::Timeout`.
    pub fn with_timeout_after(mut self, n: u64) -> Self {
        self.fail_after = Some(n);
        self
    }

    fn fraction(&self) -> f64 {
        f64::from(self.duty.get()) / 255.0
    }

    fn scaled(base: u32, drop_at_full: u32, fraction: f64) -> u32 {
        let drop = (f64::from(drop_at_full) * fraction).round() as u32;
        base.saturating_sub(drop)
    }
}

impl SensorSource for SimSensor {
    fn sample(&mut self) -> Result<RawSample, SeamError> {
        if self.fail_after.is_some_and(|n| self.samples >= n) {
            return Err(Box::new(HwError::Timeout));
        }
        self.samples += 1;

        let f = self.fraction();
        let edges_per_ms = self.cfg.full_scale_edges_per_s * f / 1000.0;
        self.phase = (self.phase + edges_per_ms * self.cfg.sample_period_ms).fract();
        let rotation = if f > 0.0 && self.phase < 0.5 {
            self.cfg.rotation_high
        } else {
            self.cfg.rotation_low
        };

        Ok(RawSample::new(
            rotation,
            Self::scaled(self.cfg.supply_raw, self.cfg.sag_raw_at_full, f),
            Self::scaled(self.cfg.current_zero_raw, self.cfg.current_raw_at_full, f),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct SimPower {
    duty: Rc<Cell<u8>>,
}

impl PowerOutput for SimPower {
    fn write_power(&mut self, duty: u8) -> Result<(), SeamError> {
        if self.duty.get() != duty {
            tracing::trace!(duty, "sim power");
        }
        self.duty.set(duty);
        Ok(())
    }
}

/// Sleep backend for hosts without a deep-sleep controller: records the
/// request in the log and returns straight away.
#[derive(Debug, Default)]
pub struct LoggingSleep {
    requests: u32,
}

impl LoggingSleep {
    pub fn requests(&self) -> u32 {
        self.requests
    }
}

impl SleepControl for LoggingSleep {
    fn request_sleep(&mut self, duration_s: u32, wake: WakeTrigger) -> Result<(), SeamError> {
        self.requests += 1;
        tracing::info!(duration_s, ?wake, "sleep requested");
        Ok(())
    }
}
