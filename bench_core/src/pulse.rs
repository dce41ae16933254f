//! Rotation sensor edge counting and rate conversion.
//!
//! The sensor output is an analog-ish square wave sampled through the ADC;
//! a hysteresis band around the midpoint turns it into a clean digital
//! level before edges are counted.

use std::f32::consts::PI;

/// Thresholds for digitizing the rotation channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hysteresis {
    pub midpoint: u32,
    pub guard_band: u32,
}

impl Default for Hysteresis {
    fn default() -> Self {
        Self {
            midpoint: 2048,
            guard_band: 256,
        }
    }
}

impl Hysteresis {
    #[inline]
    fn high_above(&self) -> u32 {
        self.midpoint.saturating_add(self.guard_band)
    }

    #[inline]
    fn low_below(&self) -> u32 {
        self.midpoint.saturating_sub(self.guard_band)
    }
}

/// Pulses-to-rate scaling: `rate = edges * factor * seconds_per_unit / window_s`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateConversion {
    pub factor: f32,
    pub seconds_per_unit: f32,
}

impl RateConversion {
    pub const fn new(factor: f32, seconds_per_unit: f32) -> Self {
        Self {
            factor,
            seconds_per_unit,
        }
    }
}

/// Edge counter with an elapsed-time window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseCounter {
    hysteresis: Hysteresis,
    edges: u32,
    elapsed_ms: u64,
    level_high: bool,
}

impl Default for PulseCounter {
    fn default() -> Self {
        Self::new(Hysteresis::default())
    }
}

impl PulseCounter {
    pub fn new(hysteresis: Hysteresis) -> Self {
        Self {
            hysteresis,
            edges: 0,
            elapsed_ms: 0,
            level_high: false,
        }
    }

    /// Feed one raw sample. Inside the guard band the previous level holds;
    /// only a low→high transition counts.
    #[inline]
    pub fn observe(&mut self, raw_level: u32) {
        let was_high = self.level_high;
        if raw_level > self.hysteresis.high_above() {
            self.level_high = true;
        } else if raw_level < self.hysteresis.low_below() {
            self.level_high = false;
        }
        if !was_high && self.level_high {
            self.edges = self.edges.saturating_add(1);
        }
    }

    #[inline]
    pub fn accumulate_elapsed(&mut self, delta_ms: u64) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);
    }

    pub fn edges(&self) -> u32 {
        self.edges
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn is_high(&self) -> bool {
        self.level_high
    }

    /// Rate over the current window, then start a new window.
    /// Returns 0 when no time has accumulated.
    pub fn extract_rate_and_reset(&mut self, factor: f32, seconds_per_unit: f32) -> f32 {
        let rate = if self.elapsed_ms > 0 {
            self.edges as f32 * factor * seconds_per_unit * (1000.0 / self.elapsed_ms as f32)
        } else {
            0.0
        };
        self.reset();
        rate
    }

    #[inline]
    pub fn extract(&mut self, conversion: RateConversion) -> f32 {
        self.extract_rate_and_reset(conversion.factor, conversion.seconds_per_unit)
    }

    /// Drop the window's edges and time. The digitized level is kept so the
    /// next window does not count a spurious edge.
    pub fn reset(&mut self) {
        self.edges = 0;
        self.elapsed_ms = 0;
    }
}

/// Mechanical constants between the sensor and the wheel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drivetrain {
    /// Motor magnet count; pulses per motor revolution is half of this.
    pub motor_poles: u32,
    /// Sensor shaft turns per pulse group (24:8 spur set).
    pub gear_ratio: f32,
    /// Wheel turns per output-shaft turn.
    pub wheel_reduction: f32,
    pub wheel_diameter_mm: f32,
}

impl Default for Drivetrain {
    fn default() -> Self {
        Self {
            motor_poles: 14,
            gear_ratio: 24.0 / 8.0,
            wheel_reduction: 1.0 / 4.0,
            wheel_diameter_mm: 23.0,
        }
    }
}

impl Drivetrain {
    /// Output-shaft revolutions per counted edge.
    pub fn revolutions_per_pulse(&self) -> f32 {
        let pole_pairs = (self.motor_poles / 2).max(1);
        self.gear_ratio / pole_pairs as f32
    }

    pub fn motor_rpm(&self) -> RateConversion {
        RateConversion::new(self.revolutions_per_pulse(), 60.0)
    }

    pub fn motor_rps(&self) -> RateConversion {
        RateConversion::new(self.revolutions_per_pulse(), 1.0)
    }

    pub fn wheel_rpm(&self) -> RateConversion {
        RateConversion::new(self.revolutions_per_pulse() * self.wheel_reduction, 60.0)
    }

    /// Distance covered per output-shaft revolution, in meters.
    pub fn meters_per_revolution(&self) -> f64 {
        f64::from(self.wheel_reduction) * f64::from(self.wheel_diameter_mm) * std::f64::consts::PI
            / 1000.0
    }

    /// Linear speed for a wheel rotation rate.
    pub fn wheel_kmh(&self, wheel_rpm: f32) -> f32 {
        let circumference_m = self.wheel_diameter_mm * PI / 1000.0;
        wheel_rpm / 60.0 * circumference_m * 3.6
    }
}
