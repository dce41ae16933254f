//! Ride simulation: integrate distance, energy and time from the live
//! rotation rate while a distance-triggered power profile drives the motor.

use std::sync::Arc;

use bench_traits::Display;

use super::{ModeController, ModeKind, draw_measurement};
use crate::channels::{Instrument, SenseChannels};
use crate::config::RideCfg;
use crate::profile::PowerProfile;
use crate::snapshot::{Measurement, RunAccumulator};

const SECS_PER_HOUR: f64 = 3600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideState {
    Sleep,
    Run,
}

#[derive(Debug, Default)]
struct Flags {
    toggle: bool,
    next_profile: bool,
    clear: bool,
}

#[derive(Debug)]
pub struct RideSimulation {
    instrument: Arc<Instrument>,
    channels: SenseChannels,
    profiles: Vec<PowerProfile>,
    profile: usize,
    status_index: usize,
    state: RideState,
    acc: RunAccumulator,
    now: Measurement,
    pack_volts: f32,
    nominal_frame_s: f64,
    last_fast_ms: Option<f64>,
    flags: Flags,
    window_restart: bool,
}

impl RideSimulation {
    /// `nominal_frame_ms` is the dt used when no previous fast tick is known.
    pub fn new(instrument: Arc<Instrument>, cfg: &RideCfg, nominal_frame_ms: f64) -> Self {
        let channels = SenseChannels::new(&instrument);
        let profiles = if cfg.profiles.is_empty() {
            vec![PowerProfile::sprint()]
        } else {
            cfg.profiles.clone()
        };
        Self {
            instrument,
            channels,
            profiles,
            profile: 0,
            status_index: 0,
            state: RideState::Sleep,
            acc: RunAccumulator::default(),
            now: Measurement::default(),
            pack_volts: cfg.pack_volts,
            nominal_frame_s: nominal_frame_ms / 1000.0,
            last_fast_ms: None,
            flags: Flags::default(),
            window_restart: false,
        }
    }

    pub fn state(&self) -> RideState {
        self.state
    }

    pub fn accumulator(&self) -> RunAccumulator {
        self.acc
    }

    pub fn profile(&self) -> &PowerProfile {
        &self.profiles[self.profile]
    }

    pub fn status_index(&self) -> usize {
        self.status_index
    }

    pub fn charge_mah(&self) -> f64 {
        self.acc.charge_mah(self.pack_volts)
    }

    /// Start a run from zero.
    pub fn start(&mut self) {
        self.state = RideState::Run;
        self.status_index = 0;
        self.acc.reset();
        self.channels.reset();
        self.window_restart = true;
        tracing::info!(
            profile = %self.profile().name(),
            target_m = self.profile().total_meters(),
            "ride run started"
        );
    }

    /// Advance the run by one frame at `rps` output-shaft revolutions per
    /// second. The frame that reaches the target distance lands exactly on it
    /// and contributes energy and time only for the part spent inside the
    /// target; the run then stops.
    pub fn integrate(&mut self, rps: f32, volts: f32, amps: f32, dt_s: f64) {
        if self.state != RideState::Run || dt_s.is_nan() || dt_s <= 0.0 {
            return;
        }
        let target = self.profile().total_meters();
        let diff = f64::from(rps).max(0.0) * self.instrument.drivetrain.meters_per_revolution() * dt_s;
        let old = self.acc.distance_m;
        let new = old + diff;

        let mut fraction = 1.0;
        if new >= target {
            // Energy and time count only the in-target share of the frame,
            // (target - old) / diff, not the overshoot share.
            fraction = if diff > 0.0 {
                ((target - old) / diff).clamp(0.0, 1.0)
            } else {
                0.0
            };
            self.acc.distance_m = target;
            self.state = RideState::Sleep;
        } else {
            self.acc.distance_m = new;
        }

        self.acc.energy_wh += fraction * f64::from(volts) * f64::from(amps) * dt_s / SECS_PER_HOUR;
        self.acc.elapsed_s += fraction * dt_s;

        if self.state == RideState::Sleep {
            tracing::info!(
                distance_m = self.acc.distance_m,
                elapsed_s = self.acc.elapsed_s,
                mah = self.charge_mah(),
                "ride run finished"
            );
        }
    }

    fn advance_status(&mut self) {
        if self.state != RideState::Run {
            return;
        }
        while self.acc.distance_m > self.profile().next_trigger_m(self.status_index) {
            self.status_index += 1;
            tracing::debug!(
                step = self.status_index,
                power_index = self.profile().step_at(self.status_index).power_index,
                "ride profile step"
            );
        }
    }

    fn frame_dt_s(&mut self, now_ms: f64) -> f64 {
        let dt = self
            .last_fast_ms
            .map(|prev| (now_ms - prev) / 1000.0)
            .filter(|dt| *dt > 0.0)
            .unwrap_or(self.nominal_frame_s);
        self.last_fast_ms = Some(now_ms);
        dt
    }

    fn render(&self, display: &mut dyn Display) {
        display.clear_region(0);
        match self.state {
            RideState::Run => {
                display.draw_label("run  ", 0, 0);
                let profile = self.profile();
                display.draw_label("C", 6, 0);
                display.draw_int(profile.cycle_at(self.status_index) as i32, 7, 0, 1);
                display.draw_label("T", 10, 0);
                display.draw_int(profile.step_at(self.status_index).power_index as i32, 11, 0, 1);
            }
            RideState::Sleep => {
                display.draw_label("sleep", 0, 0);
                display.draw_label(self.profile().name(), 6, 0);
            }
        }
        display.draw_float(self.acc.distance_m as f32, 0, 1, 5);
        display.draw_label("m", 5, 1);
        display.draw_float(self.acc.elapsed_s as f32, 6, 1, 5);
        display.draw_label("s", 11, 1);
        display.draw_float(self.charge_mah() as f32, 12, 1, 5);
        display.draw_label("mAh", 17, 1);
        draw_measurement(display, &self.now, 2);
    }
}

impl ModeController for RideSimulation {
    fn kind(&self) -> ModeKind {
        ModeKind::RideSim
    }

    fn channels(&mut self) -> &mut SenseChannels {
        &mut self.channels
    }

    fn on_fast_tick(&mut self, now_ms: f64, display: &mut dyn Display) {
        let dt_s = self.frame_dt_s(now_ms);

        if std::mem::take(&mut self.flags.clear) && self.state == RideState::Sleep {
            self.acc.reset();
        }
        if std::mem::take(&mut self.flags.next_profile) && self.state == RideState::Sleep {
            self.profile = (self.profile + 1) % self.profiles.len();
            tracing::debug!(profile = %self.profile().name(), "ride profile selected");
        }

        if std::mem::take(&mut self.flags.toggle) {
            match self.state {
                RideState::Sleep => self.start(),
                RideState::Run => {
                    self.state = RideState::Sleep;
                    tracing::info!(distance_m = self.acc.distance_m, "ride run stopped");
                }
            }
        } else {
            let (rps, m) = self
                .channels
                .drain_rate(&self.instrument, self.instrument.drivetrain.motor_rps());
            self.now = Measurement {
                rpm: (rps * 60.0) as i32,
                ..m
            };
            self.integrate(rps, m.volts, m.amps, dt_s);
        }

        self.advance_status();
        self.render(display);
    }

    fn on_slow_tick(&mut self, _now_ms: f64, _display: &mut dyn Display) {
        tracing::trace!(
            rpm = self.now.rpm,
            distance_m = self.acc.distance_m,
            energy_wh = self.acc.energy_wh,
            "ride window"
        );
    }

    fn on_button_primary(&mut self) {
        self.flags.next_profile = true;
    }

    fn on_button_secondary(&mut self) {
        self.flags.clear = true;
    }

    fn on_button_secondary_long(&mut self) {
        self.flags.toggle = true;
    }

    fn reset(&mut self) {
        self.channels.reset();
        self.state = RideState::Sleep;
        self.status_index = 0;
        self.acc.reset();
        self.now.reset();
        self.last_fast_ms = None;
        self.flags = Flags::default();
        self.window_restart = false;
    }

    fn power_level(&self) -> u8 {
        match self.state {
            RideState::Sleep => 0,
            RideState::Run => {
                let idx = self.profile().step_at(self.status_index).power_index;
                self.instrument.power_map.power_level_for(idx)
            }
        }
    }

    fn is_idle(&self) -> bool {
        self.state == RideState::Sleep
    }

    fn snapshot(&self) -> Measurement {
        self.now
    }

    fn take_window_restart(&mut self) -> bool {
        std::mem::take(&mut self.window_restart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::RecordingDisplay;

    fn ride() -> RideSimulation {
        RideSimulation::new(Arc::new(Instrument::default()), &RideCfg::default(), 1000.0 / 15.0)
    }

    #[test]
    fn long_press_toggles_without_integrating_that_frame() {
        let mut r = ride();
        let mut d = RecordingDisplay::default();
        r.on_button_secondary_long();
        r.on_fast_tick(100.0, &mut d);
        assert_eq!(r.state(), RideState::Run);
        assert_eq!(r.accumulator().elapsed_s, 0.0);
        assert_eq!(r.power_level(), 105);
        assert!(r.take_window_restart());
    }

    #[test]
    fn profile_cycles_only_while_sleeping() {
        let mut r = ride();
        let mut d = RecordingDisplay::default();
        r.on_button_primary();
        r.on_fast_tick(0.0, &mut d);
        assert_eq!(r.profile().name(), "steady");
        r.start();
        r.on_button_primary();
        r.on_fast_tick(66.0, &mut d);
        assert_eq!(r.profile().name(), "steady");
    }

    #[test]
    fn profile_step_follows_distance() {
        let mut r = ride();
        r.start();
        let mpr = r.instrument.drivetrain.meters_per_revolution();
        // exactly 12 m in one frame
        r.integrate((12.0 / mpr) as f32, 0.0, 0.0, 1.0);
        r.advance_status();
        assert_eq!(r.status_index(), 1);
        assert_eq!(r.power_level(), 95);
    }
}
