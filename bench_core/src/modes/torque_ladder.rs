//! Torque ladder: step through a fixed set of power rungs, let each settle
//! for one window, then capture one window per rung into a calc slot.
//!
//! Sleep --long press--> Wait(0) --slow--> Calc(0) --slow--> Wait(1) ...
//! Calc(last) --slow--> Sleep. A primary press aborts back to Sleep.

use std::sync::Arc;

use bench_traits::Display;

use super::{ModeController, ModeKind, draw_measurement};
use crate::channels::{Instrument, SenseChannels};
use crate::config::LadderCfg;
use crate::snapshot::Measurement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderState {
    Sleep,
    /// Settling at the active rung; the window is discarded.
    Wait,
    /// Measuring at the active rung.
    Calc,
}

impl LadderState {
    fn label(self) -> &'static str {
        match self {
            LadderState::Sleep => "sleep",
            LadderState::Wait => "wait ",
            LadderState::Calc => "calc ",
        }
    }
}

/// rpm below this at rung 0 makes the ratio column meaningless.
const BASE_RPM_FLOOR: i32 = 10;

#[derive(Debug, Default)]
struct Flags {
    start: bool,
    abort: bool,
    next_slot: bool,
}

#[derive(Debug)]
pub struct TorqueLadder {
    instrument: Arc<Instrument>,
    channels: SenseChannels,
    rungs: Vec<usize>,
    slots: Vec<Vec<Measurement>>,
    active_slot: usize,
    rung: usize,
    state: LadderState,
    blink: bool,
    flags: Flags,
    window_restart: bool,
    last: Measurement,
}

impl TorqueLadder {
    pub fn new(instrument: Arc<Instrument>, cfg: &LadderCfg) -> Self {
        let channels = SenseChannels::new(&instrument);
        let slots = vec![vec![Measurement::default(); cfg.rungs.len()]; cfg.calc_slots.max(1)];
        Self {
            instrument,
            channels,
            rungs: cfg.rungs.clone(),
            slots,
            active_slot: 0,
            rung: 0,
            state: LadderState::Sleep,
            blink: false,
            flags: Flags::default(),
            window_restart: false,
            last: Measurement::default(),
        }
    }

    pub fn state(&self) -> LadderState {
        self.state
    }

    pub fn rung(&self) -> usize {
        self.rung
    }

    pub fn active_slot(&self) -> usize {
        self.active_slot
    }

    /// Per-rung results of one calc slot.
    pub fn slot(&self, index: usize) -> Option<&[Measurement]> {
        self.slots.get(index).map(Vec::as_slice)
    }

    /// Each rung's rpm relative to rung 0, in percent (0..=100).
    pub fn ratios(&self) -> Vec<i32> {
        let results = &self.slots[self.active_slot];
        let base = results.first().map_or(0, |m| m.rpm);
        results
            .iter()
            .map(|m| {
                if base > BASE_RPM_FLOOR {
                    ((m.rpm as f32 / base as f32) * 100.0).clamp(0.0, 100.0) as i32
                } else {
                    100
                }
            })
            .collect()
    }

    fn start_sweep(&mut self) {
        self.rung = 0;
        self.slots[self.active_slot].fill(Measurement::default());
        self.channels.reset();
        self.state = LadderState::Wait;
        self.window_restart = true;
        tracing::info!(slot = self.active_slot, rungs = self.rungs.len(), "ladder sweep started");
    }

    fn render(&self, display: &mut dyn Display) {
        display.draw_label(self.state.label(), 0, 0);
        display.draw_label("S", 7, 0);
        display.draw_int(self.active_slot as i32 + 1, 8, 0, 1);

        let ratios = self.ratios();
        for (i, m) in self.slots[self.active_slot].iter().enumerate() {
            let row = u8::try_from(i + 1).unwrap_or(u8::MAX);
            draw_measurement(display, m, row);
            if self.state == LadderState::Sleep {
                display.draw_int(ratios[i], 0, row, 3);
            } else {
                display.draw_label("   ", 0, row);
                if i == self.rung && self.blink {
                    let marker = if self.state == LadderState::Calc { ">" } else { ">>" };
                    display.draw_label(marker, 0, row);
                }
            }
        }
    }
}

impl ModeController for TorqueLadder {
    fn kind(&self) -> ModeKind {
        ModeKind::TorqueLadder
    }

    fn channels(&mut self) -> &mut SenseChannels {
        &mut self.channels
    }

    fn on_fast_tick(&mut self, _now_ms: f64, display: &mut dyn Display) {
        if std::mem::take(&mut self.flags.abort) && self.state != LadderState::Sleep {
            self.state = LadderState::Sleep;
            self.rung = 0;
            tracing::info!("ladder sweep aborted");
        }
        if std::mem::take(&mut self.flags.start) {
            self.start_sweep();
        }
        if std::mem::take(&mut self.flags.next_slot) && self.state == LadderState::Sleep {
            self.active_slot = (self.active_slot + 1) % self.slots.len();
            tracing::debug!(slot = self.active_slot, "ladder calc slot selected");
        }
        self.blink = !self.blink;
        self.render(display);
    }

    fn on_slow_tick(&mut self, _now_ms: f64, _display: &mut dyn Display) {
        match self.state {
            LadderState::Sleep => self.channels.reset(),
            LadderState::Wait => {
                self.channels.reset();
                self.state = LadderState::Calc;
                tracing::debug!(rung = self.rung, "ladder wait -> calc");
            }
            LadderState::Calc => {
                let m = self
                    .channels
                    .drain(&self.instrument, self.instrument.drivetrain.motor_rpm());
                self.slots[self.active_slot][self.rung] = m;
                self.last = m;
                tracing::trace!(rung = self.rung, rpm = m.rpm, volts = m.volts, amps = m.amps, "ladder rung captured");
                if self.rung + 1 >= self.rungs.len() {
                    self.state = LadderState::Sleep;
                    self.rung = 0;
                    tracing::info!(slot = self.active_slot, "ladder sweep finished");
                } else {
                    self.rung += 1;
                    self.state = LadderState::Wait;
                    tracing::debug!(rung = self.rung, "ladder calc -> wait");
                }
            }
        }
    }

    fn on_button_primary(&mut self) {
        self.flags.abort = true;
    }

    fn on_button_secondary(&mut self) {
        self.flags.next_slot = true;
    }

    fn on_button_secondary_long(&mut self) {
        self.flags.start = true;
    }

    fn reset(&mut self) {
        self.channels.reset();
        for slot in &mut self.slots {
            slot.fill(Measurement::default());
        }
        self.active_slot = 0;
        self.rung = 0;
        self.state = LadderState::Sleep;
        self.blink = false;
        self.flags = Flags::default();
        self.window_restart = false;
        self.last.reset();
    }

    fn power_level(&self) -> u8 {
        match self.state {
            LadderState::Sleep => 0,
            LadderState::Wait | LadderState::Calc => self
                .rungs
                .get(self.rung)
                .map_or(0, |&idx| self.instrument.power_map.power_level_for(idx)),
        }
    }

    fn is_idle(&self) -> bool {
        self.state == LadderState::Sleep
    }

    fn snapshot(&self) -> Measurement {
        self.last
    }

    fn take_window_restart(&mut self) -> bool {
        std::mem::take(&mut self.window_restart)
    }
}
