//! Test and helper mocks for bench_core.

use std::collections::VecDeque;

use bench_traits::{
    ButtonLatch, ButtonSource, Display, PowerOutput, RawSample, SeamError, SensorSource,
    SleepControl, WakeTrigger,
};

/// One recorded display call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Label { text: String, col: u8, row: u8 },
    Int { value: i32, col: u8, row: u8, width: u8 },
    Float { value: f32, col: u8, row: u8, width: u8 },
    Clear { row: u8 },
}

/// Display that records every call instead of rendering.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub ops: Vec<DrawOp>,
    pub presents: usize,
    pub fail_present: bool,
}

impl RecordingDisplay {
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn presents(&self) -> usize {
        self.presents
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn has_label(&self, text: &str, col: u8, row: u8) -> bool {
        self.ops.iter().any(|op| {
            matches!(op, DrawOp::Label { text: t, col: c, row: r } if t == text && *c == col && *r == row)
        })
    }

    /// Last integer drawn at a cell, if any.
    pub fn int_at(&self, col: u8, row: u8) -> Option<i32> {
        self.ops.iter().rev().find_map(|op| match op {
            DrawOp::Int { value, col: c, row: r, .. } if *c == col && *r == row => Some(*value),
            _ => None,
        })
    }
}

impl Display for RecordingDisplay {
    fn draw_label(&mut self, text: &str, col: u8, row: u8) {
        self.ops.push(DrawOp::Label {
            text: text.to_owned(),
            col,
            row,
        });
    }

    fn draw_int(&mut self, value: i32, col: u8, row: u8, width: u8) {
        self.ops.push(DrawOp::Int {
            value,
            col,
            row,
            width,
        });
    }

    fn draw_float(&mut self, value: f32, col: u8, row: u8, width: u8) {
        self.ops.push(DrawOp::Float {
            value,
            col,
            row,
            width,
        });
    }

    fn clear_region(&mut self, row: u8) {
        self.ops.push(DrawOp::Clear { row });
    }

    fn present(&mut self) -> Result<(), SeamError> {
        self.presents += 1;
        if self.fail_present {
            return Err(Box::new(std::io::Error::other("display not responding")));
        }
        Ok(())
    }
}

/// Power output that remembers every duty written.
#[derive(Debug, Default)]
pub struct SpyPower {
    pub writes: Vec<u8>,
    /// When set, every write fails with this message.
    pub fail_with: Option<String>,
}

impl SpyPower {
    pub fn writes(&self) -> &[u8] {
        &self.writes
    }

    pub fn last(&self) -> Option<u8> {
        self.writes.last().copied()
    }
}

impl PowerOutput for SpyPower {
    fn write_power(&mut self, duty: u8) -> Result<(), SeamError> {
        if let Some(msg) = &self.fail_with {
            return Err(Box::new(std::io::Error::other(msg.clone())));
        }
        self.writes.push(duty);
        Ok(())
    }
}

/// Sensor that replays a fixed waveform in a loop.
#[derive(Debug)]
pub struct ScriptedSensor {
    samples: Vec<RawSample>,
    pos: usize,
}

impl ScriptedSensor {
    pub fn new(samples: Vec<RawSample>) -> Self {
        Self { samples, pos: 0 }
    }

    /// Square rotation wave: `high` samples at 4000 then `low` at 0, with
    /// constant voltage and current counts.
    pub fn square(high: usize, low: usize, voltage: u32, current: u32) -> Self {
        let mut samples = vec![RawSample::new(4000, voltage, current); high];
        samples.extend(std::iter::repeat_n(RawSample::new(0, voltage, current), low));
        Self::new(samples)
    }
}

impl SensorSource for ScriptedSensor {
    fn sample(&mut self) -> Result<RawSample, SeamError> {
        if self.samples.is_empty() {
            return Err(Box::new(std::io::Error::other("sensor timeout")));
        }
        let s = self.samples[self.pos % self.samples.len()];
        self.pos = self.pos.wrapping_add(1);
        Ok(s)
    }
}

/// Buttons that deliver queued latches one per poll, then nothing.
#[derive(Debug, Default)]
pub struct ScriptedButtons {
    queue: VecDeque<(u64, ButtonLatch)>,
    polls: u64,
}

impl ScriptedButtons {
    /// `presses` are (poll number, latch) pairs; poll numbers start at 0.
    pub fn new(mut presses: Vec<(u64, ButtonLatch)>) -> Self {
        presses.sort_by_key(|(at, _)| *at);
        Self {
            queue: presses.into(),
            polls: 0,
        }
    }
}

impl ButtonSource for ScriptedButtons {
    fn poll(&mut self) -> ButtonLatch {
        let mut latch = ButtonLatch::default();
        while let Some((at, l)) = self.queue.front().copied() {
            if at > self.polls {
                break;
            }
            latch.merge(l);
            self.queue.pop_front();
        }
        self.polls += 1;
        latch
    }
}

/// Sleep controller that only counts requests.
#[derive(Debug, Default)]
pub struct NoopSleep {
    pub requests: Vec<(u32, WakeTrigger)>,
}

impl SleepControl for NoopSleep {
    fn request_sleep(&mut self, duration_s: u32, wake: WakeTrigger) -> Result<(), SeamError> {
        self.requests.push((duration_s, wake));
        Ok(())
    }
}
