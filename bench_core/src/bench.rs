//! Mode-switch glue: owns the four controllers and the two gates, and turns
//! one loop iteration (sample + latched buttons) into controller calls.

use std::sync::Arc;

use bench_traits::{ButtonLatch, Display, PowerOutput, RawSample};
use eyre::WrapErr;

use crate::channels::Instrument;
use crate::config::{CadenceCfg, SleepCfg};
use crate::error::Result;
use crate::gate::PeriodicGate;
use crate::hw_error::map_hw_error;
use crate::modes::{Mode, ModeController, ModeKind};
use crate::snapshot::Measurement;

/// What happened during one `Bench::step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub mode: ModeKind,
    pub fast: bool,
    pub slow: bool,
    /// Duty written this step, if the fast gate fired.
    pub power: Option<u8>,
    /// The idle timeout expired; the caller should request sleep.
    pub sleep_due: bool,
}

#[derive(Debug)]
pub struct Bench {
    instrument: Arc<Instrument>,
    modes: Vec<Mode>,
    active: ModeKind,
    cadence: CadenceCfg,
    sleep: SleepCfg,
    fast: PeriodicGate,
    slow: PeriodicGate,
    last_ms: Option<u64>,
    last_activity_ms: u64,
    last_power: u8,
}

impl Bench {
    pub fn builder() -> crate::builder::BenchBuilder {
        crate::builder::BenchBuilder::default()
    }

    pub(crate) fn from_parts(
        instrument: Arc<Instrument>,
        modes: Vec<Mode>,
        initial: ModeKind,
        cadence: CadenceCfg,
        sleep: SleepCfg,
    ) -> Self {
        let fast = PeriodicGate::new(cadence.fast_ms);
        let slow = PeriodicGate::new(cadence.slow_ms_for(initial));
        Self {
            instrument,
            modes,
            active: initial,
            cadence,
            sleep,
            fast,
            slow,
            last_ms: None,
            last_activity_ms: 0,
            last_power: 0,
        }
    }

    pub fn mode(&self) -> ModeKind {
        self.active
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn sleep_cfg(&self) -> SleepCfg {
        self.sleep
    }

    pub fn last_power(&self) -> u8 {
        self.last_power
    }

    pub fn active(&self) -> &Mode {
        &self.modes[self.active.position()]
    }

    pub fn active_mut(&mut self) -> &mut Mode {
        &mut self.modes[self.active.position()]
    }

    pub fn controller(&self) -> &dyn ModeController {
        self.active().controller()
    }

    pub fn snapshot(&self) -> Measurement {
        self.controller().snapshot()
    }

    /// Switch to `kind`, resetting it and starting fresh windows at `now_ms`.
    pub fn select_mode(&mut self, kind: ModeKind, now_ms: u64) {
        let from = self.active;
        self.active = kind;
        self.active_mut().controller_mut().reset();
        self.slow.set_interval(self.cadence.slow_ms_for(kind));
        self.fast.restart(now_ms as f64);
        self.slow.restart(now_ms as f64);
        tracing::info!(from = %from, to = %kind, "mode switched");
    }

    /// Apply a new current-sense zero offset to every controller.
    pub fn set_current_offset(&mut self, offset_volts: f32) {
        for mode in &mut self.modes {
            mode.controller_mut()
                .channels()
                .set_current_offset_volts(offset_volts);
        }
        tracing::debug!(offset_volts, "current offset updated");
    }

    /// Restart the idle timer, e.g. after waking from sleep.
    pub fn note_wake(&mut self, now_ms: u64) {
        self.last_activity_ms = now_ms;
    }

    /// One driver-loop iteration.
    ///
    /// The sample and the time since the previous call go to the active
    /// controller's counters first; buttons are latched; then the gates are
    /// checked. Power is written only on a fast tick.
    pub fn step(
        &mut self,
        now_ms: u64,
        sample: RawSample,
        buttons: ButtonLatch,
        display: &mut dyn Display,
        power: &mut dyn PowerOutput,
    ) -> Result<StepReport> {
        let delta_ms = self.last_ms.map_or(0, |prev| now_ms.saturating_sub(prev));
        self.last_ms = Some(now_ms);
        {
            let channels = self.active_mut().controller_mut().channels();
            channels.observe(sample);
            channels.accumulate_elapsed(delta_ms);
        }

        if buttons.any() {
            self.last_activity_ms = now_ms;
        }
        if buttons.next_mode {
            let next = self.active.next();
            self.select_mode(next, now_ms);
        }
        {
            let ctl = self.active_mut().controller_mut();
            if buttons.primary {
                ctl.on_button_primary();
            }
            if buttons.secondary {
                ctl.on_button_secondary();
            }
            if buttons.secondary_long {
                ctl.on_button_secondary_long();
            }
        }

        let now_f = now_ms as f64;
        let mut report = StepReport {
            mode: self.active,
            fast: false,
            slow: false,
            power: None,
            sleep_due: false,
        };

        if self.fast.try_fire(now_f) {
            report.fast = true;
            let ctl = self.modes[self.active.position()].controller_mut();
            ctl.on_fast_tick(now_f, display);
            if ctl.take_window_restart() {
                self.slow.restart(now_f);
            }
            let level = ctl.power_level();
            power
                .write_power(level)
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                .wrap_err("power write")?;
            if level != self.last_power {
                tracing::debug!(from = self.last_power, to = level, "power level");
            }
            self.last_power = level;
            report.power = Some(level);
            present(display);
        }

        if self.slow.try_fire(now_f) {
            report.slow = true;
            self.modes[self.active.position()]
                .controller_mut()
                .on_slow_tick(now_f, display);
            present(display);
        }

        report.sleep_due = self.sleep_due(now_ms);
        Ok(report)
    }

    fn sleep_due(&self, now_ms: u64) -> bool {
        if self.sleep.idle_s == 0 {
            return false;
        }
        let idle_ms = u64::from(self.sleep.idle_s) * crate::util::MILLIS_PER_SEC;
        self.controller().is_idle()
            && self.last_power == 0
            && now_ms.saturating_sub(self.last_activity_ms) >= idle_ms
    }
}

fn present(display: &mut dyn Display) {
    if let Err(e) = display.present() {
        tracing::warn!(error = %e, "display present failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{RecordingDisplay, SpyPower};

    #[test]
    fn first_step_fires_nothing_until_an_interval_passes() {
        let mut bench = Bench::builder().try_build().expect("defaults");
        let mut d = RecordingDisplay::default();
        let mut p = SpyPower::default();
        let r = bench
            .step(0, RawSample::default(), ButtonLatch::default(), &mut d, &mut p)
            .expect("step");
        assert!(!r.fast && !r.slow);
        assert!(p.writes().is_empty());
    }

    #[test]
    fn next_mode_resets_and_moves_on() {
        let mut bench = Bench::builder().try_build().expect("defaults");
        let mut d = RecordingDisplay::default();
        let mut p = SpyPower::default();
        let press = ButtonLatch {
            next_mode: true,
            ..ButtonLatch::default()
        };
        let r = bench
            .step(10, RawSample::default(), press, &mut d, &mut p)
            .expect("step");
        assert_eq!(r.mode, ModeKind::TorqueLadder);
        assert_eq!(bench.mode(), ModeKind::TorqueLadder);
    }
}
