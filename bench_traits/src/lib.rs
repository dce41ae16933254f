//! Collaborator seams between the measurement core and the outside world.
//!
//! The core never touches pins, buses or pixels directly. Everything it
//! consumes or drives goes through one of these traits so the same control
//! code runs against the simulated rig, the Raspberry Pi backends, and the
//! test mocks.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

pub type SeamError = Box<dyn std::error::Error + Send + Sync>;

/// One pass over the analog inputs: the digitized rotation sensor level and
/// the raw ADC counts of the voltage and current sense taps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawSample {
    pub rotation: u32,
    pub voltage: u32,
    pub current: u32,
}

impl RawSample {
    pub const fn new(rotation: u32, voltage: u32, current: u32) -> Self {
        Self {
            rotation,
            voltage,
            current,
        }
    }
}

pub trait SensorSource {
    fn sample(&mut self) -> Result<RawSample, SeamError>;
}

/// Actuation sink; `duty` is the full 8-bit power level.
pub trait PowerOutput {
    fn write_power(&mut self, duty: u8) -> Result<(), SeamError>;
}

/// Character-cell display contract. Coordinates are in text cells, not
/// pixels; the renderer owns fonts, geometry and buffering.
pub trait Display {
    fn draw_label(&mut self, text: &str, col: u8, row: u8);
    fn draw_int(&mut self, value: i32, col: u8, row: u8, width: u8);
    fn draw_float(&mut self, value: f32, col: u8, row: u8, width: u8);
    fn clear_region(&mut self, row: u8);
    fn present(&mut self) -> Result<(), SeamError>;
}

/// Edge-triggered button events latched for one loop iteration.
///
/// `next_mode` is consumed by the mode-switch glue; the other three are
/// forwarded to the active controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonLatch {
    pub primary: bool,
    pub secondary: bool,
    pub secondary_long: bool,
    pub next_mode: bool,
}

impl ButtonLatch {
    pub fn any(&self) -> bool {
        self.primary || self.secondary || self.secondary_long || self.next_mode
    }

    /// Fold another latch into this one (logical OR per event).
    pub fn merge(&mut self, other: ButtonLatch) {
        self.primary |= other.primary;
        self.secondary |= other.secondary;
        self.secondary_long |= other.secondary_long;
        self.next_mode |= other.next_mode;
    }
}

pub trait ButtonSource {
    fn poll(&mut self) -> ButtonLatch;
}

/// What brings the instrument back from sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeTrigger {
    /// Wake when the given GPIO goes high.
    GpioHigh(u8),
    /// Wake only when the sleep timer elapses.
    Timer,
}

pub trait SleepControl {
    fn request_sleep(&mut self, duration_s: u32, wake: WakeTrigger) -> Result<(), SeamError>;
}
