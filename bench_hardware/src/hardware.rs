//! Raspberry Pi backends: hardware PWM for the motor driver, an MCP3208
//! 12-bit ADC on SPI0 for the three analog taps, and GPIO push buttons.

use crate::buttons::{PressEvent, PressTracker};
use crate::error::{HwError, Result};
use bench_traits::{ButtonLatch, ButtonSource, PowerOutput, RawSample, SeamError, SensorSource};
use rppal::gpio::{Gpio, InputPin};
use rppal::pwm::{Channel, Polarity, Pwm};
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use std::time::Instant;

const PWM_FREQUENCY_HZ: f64 = 20_000.0;
const SPI_CLOCK_HZ: u32 = 1_000_000;
const MCP3208_CHANNELS: u8 = 8;

pub struct PwmPower {
    pwm: Pwm,
}

impl PwmPower {
    pub fn new(channel: u8) -> Result<Self> {
        let channel = match channel {
            0 => Channel::Pwm0,
            1 => Channel::Pwm1,
            other => return Err(HwError::Pwm(format!("no pwm channel {other}"))),
        };
        let pwm = Pwm::with_frequency(channel, PWM_FREQUENCY_HZ, 0.0, Polarity::Normal, true)
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        Ok(Self { pwm })
    }
}

impl PowerOutput for PwmPower {
    fn write_power(&mut self, duty: u8) -> std::result::Result<(), SeamError> {
        self.pwm
            .set_duty_cycle(f64::from(duty) / 255.0)
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        Ok(())
    }
}

impl Drop for PwmPower {
    fn drop(&mut self) {
        if let Err(e) = self.pwm.set_duty_cycle(0.0) {
            tracing::warn!(error = %e, "pwm zero on drop failed");
        }
    }
}

pub struct Mcp3208 {
    spi: Spi,
}

impl Mcp3208 {
    pub fn new() -> Result<Self> {
        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, SPI_CLOCK_HZ, Mode::Mode0)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        Ok(Self { spi })
    }

    /// Single-ended conversion on `channel` (0..8), 0..=4095.
    pub fn read(&mut self, channel: u8) -> Result<u32> {
        if channel >= MCP3208_CHANNELS {
            return Err(HwError::Spi(format!("no adc channel {channel}")));
        }
        let tx = [0x06 | (channel >> 2), (channel & 0x03) << 6, 0x00];
        let mut rx = [0u8; 3];
        let n = self
            .spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        if n < rx.len() {
            return Err(HwError::Timeout);
        }
        Ok((u32::from(rx[1] & 0x0F) << 8) | u32::from(rx[2]))
    }
}

pub struct AdcSensor {
    adc: Mcp3208,
    rotation: u8,
    voltage: u8,
    current: u8,
}

impl AdcSensor {
    pub fn new(adc: Mcp3208, rotation: u8, voltage: u8, current: u8) -> Self {
        Self {
            adc,
            rotation,
            voltage,
            current,
        }
    }
}

impl SensorSource for AdcSensor {
    fn sample(&mut self) -> std::result::Result<RawSample, SeamError> {
        Ok(RawSample::new(
            self.adc.read(self.rotation)?,
            self.adc.read(self.voltage)?,
            self.adc.read(self.current)?,
        ))
    }
}

struct Button {
    pin: InputPin,
    tracker: PressTracker,
}

impl Button {
    fn update(&mut self, now_ms: u64) -> PressEvent {
        self.tracker.update(self.pin.is_high(), now_ms)
    }
}

/// Active-high push buttons with pull-downs.
pub struct GpioButtons {
    primary: Button,
    secondary: Button,
    next_mode: Option<Button>,
    epoch: Instant,
}

impl GpioButtons {
    pub fn new(primary: u8, secondary: u8, next_mode: Option<u8>, long_press_ms: u64) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let open = |pin: u8| -> Result<Button> {
            let pin = gpio
                .get(pin)
                .map_err(|e| HwError::Gpio(format!("open pin {pin}: {e}")))?
                .into_input_pulldown();
            Ok(Button {
                pin,
                tracker: PressTracker::new(long_press_ms),
            })
        };
        Ok(Self {
            primary: open(primary)?,
            secondary: open(secondary)?,
            next_mode: next_mode.map(open).transpose()?,
            epoch: Instant::now(),
        })
    }
}

impl ButtonSource for GpioButtons {
    fn poll(&mut self) -> ButtonLatch {
        let now_ms = u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX);
        let secondary = self.secondary.update(now_ms);
        ButtonLatch {
            primary: self.primary.update(now_ms) == PressEvent::Short,
            secondary: secondary == PressEvent::Short,
            secondary_long: secondary == PressEvent::Long,
            next_mode: self
                .next_mode
                .as_mut()
                .is_some_and(|b| b.update(now_ms) == PressEvent::Short),
        }
    }
}
