//! ADC counts to physical units.
//!
//! The voltage taps go through a piecewise-linear table measured against a
//! reference supply; the current channel reuses the same table and then
//! applies the shunt amplifier scaling around an injected zero offset.

use crate::error::BuildError;

/// One measured (raw ADC count, volts) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    pub raw: u32,
    pub volts: f32,
}

impl CalibrationPoint {
    pub const fn new(raw: u32, volts: f32) -> Self {
        Self { raw, volts }
    }
}

/// What `voltage_for` returns for inputs past the last table point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AboveRange {
    /// Out-of-range reads as 0 V, same as below the first point.
    #[default]
    Zero,
    /// Hold the last point's voltage.
    Clamp,
}

const DEFAULT_POINTS: [CalibrationPoint; 13] = [
    CalibrationPoint::new(29, 0.0),
    CalibrationPoint::new(327, 0.5),
    CalibrationPoint::new(658, 1.0),
    CalibrationPoint::new(989, 1.5),
    CalibrationPoint::new(1326, 2.0),
    CalibrationPoint::new(1671, 2.5),
    CalibrationPoint::new(2011, 3.0),
    CalibrationPoint::new(2359, 3.5),
    CalibrationPoint::new(2698, 4.0),
    CalibrationPoint::new(3042, 4.5),
    CalibrationPoint::new(3405, 5.0),
    CalibrationPoint::new(3820, 5.5),
    CalibrationPoint::new(4094, 5.8),
];

/// Piecewise-linear ADC→volts mapper.
///
/// Invariants (checked in `new`): at least two points, raw strictly
/// increasing, volts non-decreasing, first point at 0 V.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    points: Vec<CalibrationPoint>,
    above_range: AboveRange,
}

impl Default for CalibrationTable {
    fn default() -> Self {
        Self {
            points: DEFAULT_POINTS.to_vec(),
            above_range: AboveRange::Zero,
        }
    }
}

impl CalibrationTable {
    pub fn new(points: Vec<CalibrationPoint>) -> Result<Self, BuildError> {
        if points.len() < 2 {
            return Err(BuildError::InvalidConfig(
                "calibration needs at least two points",
            ));
        }
        if points[0].volts != 0.0 {
            return Err(BuildError::InvalidConfig(
                "first calibration point must be 0 V",
            ));
        }
        for w in points.windows(2) {
            if w[1].raw <= w[0].raw {
                return Err(BuildError::InvalidConfig(
                    "calibration raw values must be strictly increasing",
                ));
            }
            if !w[1].volts.is_finite() || w[1].volts < w[0].volts {
                return Err(BuildError::InvalidConfig(
                    "calibration volts must be finite and non-decreasing",
                ));
            }
        }
        Ok(Self {
            points,
            above_range: AboveRange::Zero,
        })
    }

    pub fn with_above_range(mut self, policy: AboveRange) -> Self {
        self.above_range = policy;
        self
    }

    pub fn above_range(&self) -> AboveRange {
        self.above_range
    }

    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    /// Interpolated volts for a raw count.
    ///
    /// For `points[i].raw < raw <= points[i + 1].raw` this interpolates
    /// linearly. At or below the first point the result is 0; above the last
    /// point it follows `AboveRange`.
    pub fn voltage_for(&self, raw: u32) -> f32 {
        for w in self.points.windows(2) {
            let (lo, hi) = (w[0], w[1]);
            if lo.raw < raw && raw <= hi.raw {
                let slope = (hi.volts - lo.volts) / (hi.raw - lo.raw) as f32;
                return lo.volts + slope * (raw - lo.raw) as f32;
            }
        }
        match (self.above_range, self.points.last()) {
            (AboveRange::Clamp, Some(last)) if raw > last.raw => last.volts,
            _ => 0.0,
        }
    }
}

/// Shunt amplifier scaling for the current channel.
///
/// amps = amps_per_volt * (offset_volts - volts(raw) * divider)
///
/// The zero offset is not owned here; each measurement channel carries its
/// own copy so it can be re-zeroed at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SenseScaling {
    pub current_amps_per_volt: f32,
    pub current_divider: f32,
    pub current_offset_volts: f32,
}

impl Default for SenseScaling {
    fn default() -> Self {
        Self {
            // 80 A over a 5 V span, trimmed by 1.22 against a clamp meter
            current_amps_per_volt: (80.0 / 5.0) * 1.22,
            current_divider: 0.5,
            current_offset_volts: 0.0,
        }
    }
}

impl SenseScaling {
    pub fn amps(&self, volts: f32, offset_volts: f32) -> f32 {
        self.current_amps_per_volt * (offset_volts - volts * self.current_divider)
    }

    /// Offset that makes a reading of `volts` come out as exactly 0 A.
    pub fn zero_offset_for(&self, volts: f32) -> f32 {
        volts * self.current_divider
    }
}
