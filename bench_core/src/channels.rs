//! Per-controller measurement channels and the shared conversion context.

use bench_traits::RawSample;

use crate::actuation::PowerMap;
use crate::averager::RollingAverage;
use crate::calibration::{CalibrationTable, SenseScaling};
use crate::pulse::{Drivetrain, Hysteresis, PulseCounter, RateConversion};
use crate::snapshot::Measurement;

/// Read-only conversion context handed to every controller at construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instrument {
    pub calibration: CalibrationTable,
    pub sense: SenseScaling,
    pub drivetrain: Drivetrain,
    pub hysteresis: Hysteresis,
    pub power_map: PowerMap,
}

impl Instrument {
    #[inline]
    pub fn volts(&self, raw: u32) -> f32 {
        self.calibration.voltage_for(raw)
    }

    #[inline]
    pub fn amps(&self, raw: u32, offset_volts: f32) -> f32 {
        self.sense.amps(self.calibration.voltage_for(raw), offset_volts)
    }
}

/// One rotation counter and two analog averages, owned by exactly one
/// controller.
#[derive(Debug, Clone, PartialEq)]
pub struct SenseChannels {
    rotation: PulseCounter,
    voltage: RollingAverage,
    current: RollingAverage,
    current_offset_volts: f32,
}

impl SenseChannels {
    pub fn new(instrument: &Instrument) -> Self {
        Self {
            rotation: PulseCounter::new(instrument.hysteresis),
            voltage: RollingAverage::new(),
            current: RollingAverage::new(),
            current_offset_volts: instrument.sense.current_offset_volts,
        }
    }

    #[inline]
    pub fn observe(&mut self, sample: RawSample) {
        self.rotation.observe(sample.rotation);
        self.voltage.observe(sample.voltage);
        self.current.observe(sample.current);
    }

    #[inline]
    pub fn accumulate_elapsed(&mut self, delta_ms: u64) {
        self.rotation.accumulate_elapsed(delta_ms);
    }

    /// Discard the open window on every channel.
    pub fn reset(&mut self) {
        self.rotation.reset();
        self.voltage.reset();
        self.current.reset();
    }

    pub fn current_offset_volts(&self) -> f32 {
        self.current_offset_volts
    }

    pub fn set_current_offset_volts(&mut self, offset: f32) {
        self.current_offset_volts = offset;
    }

    pub fn rotation(&self) -> &PulseCounter {
        &self.rotation
    }

    /// Close the window: rotation rate in `conversion` units plus averaged
    /// volts and amps. The raw rate is returned alongside the snapshot since
    /// the snapshot truncates it.
    pub fn drain_rate(
        &mut self,
        instrument: &Instrument,
        conversion: RateConversion,
    ) -> (f32, Measurement) {
        let rate = self.rotation.extract(conversion);
        let volts = instrument.volts(self.voltage.extract_and_reset());
        let amps = instrument.amps(self.current.extract_and_reset(), self.current_offset_volts);
        let m = Measurement {
            rpm: rate as i32,
            volts,
            amps,
        };
        (rate, m)
    }

    pub fn drain(&mut self, instrument: &Instrument, conversion: RateConversion) -> Measurement {
        self.drain_rate(instrument, conversion).1
    }
}
