//! Speed check: free-run variant that reports the wheel, not the motor
//! shaft, for checking the sensor chain against a known wheel diameter.

use std::sync::Arc;

use bench_traits::Display;

use super::{
    COL_AMPS, COL_RPM, COL_VOLTS, LevelCycle, ModeController, ModeKind, WIDTH_AMPS, WIDTH_RPM,
    WIDTH_VOLTS,
};
use crate::channels::{Instrument, SenseChannels};
use crate::config::LevelCfg;
use crate::snapshot::Measurement;

#[derive(Debug)]
pub struct SpeedCheck {
    instrument: Arc<Instrument>,
    channels: SenseChannels,
    levels: LevelCycle,
    now: Measurement,
    best: Measurement,
    clear_best_pending: bool,
}

impl SpeedCheck {
    pub fn new(instrument: Arc<Instrument>, cfg: &LevelCfg) -> Self {
        let channels = SenseChannels::new(&instrument);
        Self {
            instrument,
            channels,
            levels: LevelCycle::new(cfg.steps.clone()),
            now: Measurement::default(),
            best: Measurement::default(),
            clear_best_pending: false,
        }
    }

    pub fn level(&self) -> usize {
        self.levels.index()
    }

    pub fn best(&self) -> Measurement {
        self.best
    }

    /// Linear wheel speed of the last window.
    pub fn kmh(&self) -> f32 {
        self.instrument.drivetrain.wheel_kmh(self.now.rpm as f32)
    }

    fn draw_row(&self, display: &mut dyn Display, m: &Measurement, row: u8) {
        display.draw_int(m.rpm, COL_RPM, row, WIDTH_RPM);
        let kmh = self.instrument.drivetrain.wheel_kmh(m.rpm as f32);
        display.draw_float(kmh, COL_VOLTS, row, WIDTH_VOLTS);
        display.draw_float(m.display_amps(), COL_AMPS, row, WIDTH_AMPS);
    }
}

impl ModeController for SpeedCheck {
    fn kind(&self) -> ModeKind {
        ModeKind::SpeedCheck
    }

    fn channels(&mut self) -> &mut SenseChannels {
        &mut self.channels
    }

    fn on_fast_tick(&mut self, _now_ms: f64, display: &mut dyn Display) {
        if self.levels.apply_pending() {
            self.now.reset();
            self.best.reset();
            self.channels.reset();
            tracing::debug!(level = self.levels.index(), "speed-check level changed");
        }
        if std::mem::take(&mut self.clear_best_pending) {
            self.best.reset();
        }
        display.draw_label("S", 0, 0);
        display.draw_int(self.levels.index() as i32, 1, 0, 1);
        display.draw_label("km/h", COL_VOLTS, 0);
    }

    fn on_slow_tick(&mut self, _now_ms: f64, display: &mut dyn Display) {
        self.now = self
            .channels
            .drain(&self.instrument, self.instrument.drivetrain.wheel_rpm());
        if self.now.rpm > self.best.rpm {
            self.best = self.now;
        }
        tracing::trace!(wheel_rpm = self.now.rpm, kmh = self.kmh(), "speed-check window");
        display.draw_label("now", 0, 1);
        self.draw_row(display, &self.now, 1);
        display.draw_label("max", 0, 2);
        self.draw_row(display, &self.best, 2);
    }

    fn on_button_primary(&mut self) {
        self.clear_best_pending = true;
    }

    fn on_button_secondary(&mut self) {
        self.levels.request_next();
    }

    fn on_button_secondary_long(&mut self) {}

    fn reset(&mut self) {
        self.channels.reset();
        self.levels.reset();
        self.now.reset();
        self.best.reset();
        self.clear_best_pending = false;
    }

    fn power_level(&self) -> u8 {
        self.instrument
            .power_map
            .power_level_for(self.levels.power_index())
    }

    fn snapshot(&self) -> Measurement {
        self.now
    }
}
