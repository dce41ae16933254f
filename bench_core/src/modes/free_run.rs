//! Free-run sweep: hold one power level, report the current window and the
//! best (highest rpm) window seen at that level.

use std::sync::Arc;

use bench_traits::Display;

use super::{LevelCycle, ModeController, ModeKind, draw_measurement};
use crate::channels::{Instrument, SenseChannels};
use crate::config::LevelCfg;
use crate::snapshot::Measurement;

#[derive(Debug)]
pub struct FreeRun {
    instrument: Arc<Instrument>,
    channels: SenseChannels,
    levels: LevelCycle,
    now: Measurement,
    best: Measurement,
    clear_best_pending: bool,
}

impl FreeRun {
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

    /// Position in the level table (not the power-map index).
    pub fn level(&self) -> usize {
        self.levels.index()
    }

    pub fn best(&self) -> Measurement {
        self.best
    }
}

impl ModeController for FreeRun {
    fn kind(&self) -> ModeKind {
        ModeKind::FreeRun
    }

    fn channels(&mut self) -> &mut SenseChannels {
        &mut self.channels
    }

    fn on_fast_tick(&mut self, _now_ms: f64, display: &mut dyn Display) {
        if self.levels.apply_pending() {
            self.now.reset();
            self.best.reset();
            // the old level's transient is not part of the new window
            self.channels.reset();
            tracing::debug!(
                level = self.levels.index(),
                power = self.power_level(),
                "free-run level changed"
            );
        }
        if std::mem::take(&mut self.clear_best_pending) {
            self.best.reset();
        }
        display.draw_label("T", 0, 0);
        display.draw_int(self.levels.index() as i32, 1, 0, 1);
    }

    fn on_slow_tick(&mut self, _now_ms: f64, display: &mut dyn Display) {
        self.now = self
            .channels
            .drain(&self.instrument, self.instrument.drivetrain.motor_rpm());
        if self.now.rpm > self.best.rpm {
            self.best = self.now;
        }
        tracing::trace!(rpm = self.now.rpm, volts = self.now.volts, amps = self.now.amps, "free-run window");
        display.draw_label("now", 0, 1);
        draw_measurement(display, &self.now, 1);
        display.draw_label("max", 0, 2);
        draw_measurement(display, &self.best, 2);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuation::PowerMap;
    use crate::mocks::RecordingDisplay;
    use bench_traits::RawSample;

    fn rig(levels: Vec<i32>) -> FreeRun {
        let instrument = Instrument {
            power_map: PowerMap::new(levels).expect("non-empty"),
            ..Instrument::default()
        };
        let steps = (0..instrument.power_map.len()).collect();
        FreeRun::new(Arc::new(instrument), &LevelCfg { steps })
    }

    #[test]
    fn secondary_waits_for_the_next_fast_tick() {
        let mut fr = rig(vec![30, 95, 100]);
        let mut d = RecordingDisplay::default();
        fr.on_button_secondary();
        assert_eq!(fr.level(), 0);
        fr.on_fast_tick(0.0, &mut d);
        assert_eq!(fr.level(), 1);
        assert_eq!(fr.power_level(), 95);
    }

    #[test]
    fn best_tracks_highest_rpm_window() {
        let mut fr = rig(vec![30, 95, 100]);
        let mut d = RecordingDisplay::default();
        for edges in [7, 3] {
            for _ in 0..edges {
                fr.channels().observe(RawSample::new(4000, 0, 0));
                fr.channels().observe(RawSample::new(0, 0, 0));
            }
            fr.channels().accumulate_elapsed(1000);
            fr.on_slow_tick(0.0, &mut d);
        }
        assert_eq!(fr.snapshot().rpm, 77);
        assert_eq!(fr.best().rpm, 180);

        fr.on_button_primary();
        fr.on_fast_tick(0.0, &mut d);
        assert_eq!(fr.best().rpm, 0);
    }

    #[test]
    fn level_change_drops_snapshots_and_open_window() {
        let mut fr = rig(vec![30, 95, 100]);
        let mut d = RecordingDisplay::default();
        for _ in 0..7 {
            fr.channels().observe(RawSample::new(4000, 0, 0));
            fr.channels().observe(RawSample::new(0, 0, 0));
        }
        fr.channels().accumulate_elapsed(1000);
        fr.on_slow_tick(0.0, &mut d);
        assert_eq!(fr.best().rpm, 180);

        // half a window under the old level
        for _ in 0..4 {
            fr.channels().observe(RawSample::new(4000, 0, 0));
            fr.channels().observe(RawSample::new(0, 0, 0));
        }
        fr.channels().accumulate_elapsed(500);
        assert!(fr.channels().rotation().edges() > 0);

        fr.on_button_secondary();
        fr.on_fast_tick(0.0, &mut d);
        assert_eq!(fr.level(), 1);
        assert_eq!(fr.snapshot(), Measurement::default());
        assert_eq!(fr.best(), Measurement::default());
        assert_eq!(fr.channels().rotation().edges(), 0);
        assert_eq!(fr.channels().rotation().elapsed_ms(), 0);
    }
}
