//! Config loading, logging, bench assembly and backend selection.

use bench_config::Config;
use bench_core::averager::RollingAverage;
use bench_core::error::{BenchError, BuildError};
use bench_core::hw_error::map_hw_error;
use bench_core::{Bench, BenchBuilder, ModeKind, Result};
use bench_traits::{ButtonSource, PowerOutput, RawSample, SeamError, SensorSource, SleepControl};
use eyre::WrapErr;
use std::path::Path;

use crate::cli::FILE_GUARD;

#[cfg(all(feature = "hardware", target_os = "linux"))]
const LONG_PRESS_MS: u64 = 800;

fn config_error(msg: String) -> eyre::Report {
    eyre::Report::new(BenchError::Config(msg))
}

pub fn seam_error(e: SeamError) -> eyre::Report {
    eyre::Report::new(map_hw_error(&*e))
}

pub fn load_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| config_error(format!("read {}: {e}", path.display())))?;
    let cfg = bench_config::load_toml(&text)
        .map_err(|e| config_error(format!("parse {}: {e}", path.display())))?;
    cfg.validate().map_err(|e| config_error(format!("{e:#}")))?;
    Ok(cfg)
}

pub fn init_tracing(json: bool, level: &str, logging: &bench_config::Logging) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

    let directive = logging.level.as_deref().unwrap_or(level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .wrap_err_with(|| format!("invalid log level '{directive}'"))?;

    let console = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file = match logging.file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| config_error(format!("logging.file {} has no file name", path.display())))?;
            let rotation = match logging.rotation.as_deref() {
                Some("daily") => Rotation::DAILY,
                Some("hourly") => Rotation::HOURLY,
                _ => Rotation::NEVER,
            };
            let (writer, guard) =
                tracing_appender::non_blocking(RollingFileAppender::new(rotation, dir, name));
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_writer(writer).boxed())
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}

/// Builder errors pass through typed; anything else from config mapping
/// (e.g. a bad calibration CSV) is reported as a config error.
pub fn build_bench(cfg: &Config, base_dir: Option<&Path>, mode: ModeKind) -> Result<Bench> {
    let builder = BenchBuilder::from_config(cfg, base_dir).map_err(|e| {
        if e.downcast_ref::<BuildError>().is_some() {
            e
        } else {
            config_error(format!("{e:#}"))
        }
    })?;
    builder.with_initial_mode(mode).try_build()
}

pub struct Rig {
    pub sensor: Box<dyn SensorSource>,
    pub power: Box<dyn PowerOutput>,
    pub buttons: Option<Box<dyn ButtonSource>>,
    pub sleep: Box<dyn SleepControl>,
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn open_rig(cfg: &Config) -> Result<Rig> {
    use bench_hardware::{LoggingSleep, SimConfig, SimulatedRig};

    let sim = SimulatedRig::new(SimConfig {
        sample_period_ms: 1000.0 / f64::from(cfg.sensor.sample_rate_hz.max(1)),
        ..SimConfig::default()
    });
    let mut sensor = sim.sensor();
    // Test hook: fail every read after N samples.
    if let Some(n) = std::env::var("BENCH_TEST_SIM_TIMEOUT")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
    {
        sensor = sensor.with_timeout_after(n);
    }
    tracing::info!(backend = "sim", "rig ready");
    Ok(Rig {
        sensor: Box::new(sensor),
        power: Box::new(sim.power()),
        buttons: None,
        sleep: Box::new(LoggingSleep::default()),
    })
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn open_rig(cfg: &Config) -> Result<Rig> {
    use bench_hardware::error::HwError;
    use bench_hardware::{AdcSensor, GpioButtons, LoggingSleep, Mcp3208, PwmPower};

    let hw = |e: HwError| eyre::Report::new(map_hw_error(&e));
    let pins = &cfg.pins;
    let adc = Mcp3208::new().map_err(hw).wrap_err("open adc")?;
    let power = PwmPower::new(pins.power_pwm_channel)
        .map_err(hw)
        .wrap_err("open pwm")?;
    let buttons = GpioButtons::new(
        pins.button_primary,
        pins.button_secondary,
        pins.button_next_mode,
        LONG_PRESS_MS,
    )
    .map_err(hw)
    .wrap_err("open buttons")?;
    tracing::info!(backend = "rpi", "rig ready");
    Ok(Rig {
        sensor: Box::new(AdcSensor::new(
            adc,
            pins.adc_rotation,
            pins.adc_voltage,
            pins.adc_current,
        )),
        power: Box::new(power),
        buttons: Some(Box::new(buttons)),
        sleep: Box::new(LoggingSleep::default()),
    })
}

/// Per-tap raw averages over `samples` reads.
pub fn average_taps(sensor: &mut dyn SensorSource, samples: u32) -> Result<RawSample> {
    let mut rotation = RollingAverage::new();
    let mut voltage = RollingAverage::new();
    let mut current = RollingAverage::new();
    for _ in 0..samples {
        let s = sensor.sample().map_err(seam_error).wrap_err("sensor read")?;
        rotation.observe(s.rotation);
        voltage.observe(s.voltage);
        current.observe(s.current);
    }
    Ok(RawSample::new(
        rotation.extract_and_reset(),
        voltage.extract_and_reset(),
        current.extract_and_reset(),
    ))
}

/// Drive the output to 0, average the current tap and set the offset that
/// makes that reading 0 A. Returns the new offset in volts.
pub fn zero_current(
    bench: &mut Bench,
    sensor: &mut dyn SensorSource,
    power: &mut dyn PowerOutput,
    samples: u32,
) -> Result<f32> {
    power.write_power(0).map_err(seam_error).wrap_err("power write")?;
    let avg = average_taps(sensor, samples)?;
    let instrument = bench.instrument();
    let offset = instrument
        .sense
        .zero_offset_for(instrument.volts(avg.current));
    bench.set_current_offset(offset);
    tracing::info!(offset_volts = offset, samples, "current channel zeroed");
    Ok(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_core::mocks::{ScriptedSensor, SpyPower};

    #[test]
    fn zeroing_cancels_the_idle_reading() {
        let mut bench = BenchBuilder::default().try_build().unwrap();
        let mut sensor = ScriptedSensor::new(vec![RawSample::new(0, 0, 2011); 8]);
        let mut power = SpyPower::default();
        let offset = zero_current(&mut bench, &mut sensor, &mut power, 8).unwrap();
        assert!((offset - 1.5).abs() < 1e-4);
        assert_eq!(power.writes(), &[0]);
        assert!(bench.instrument().amps(2011, offset).abs() < 1e-3);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = load_config(Path::new("/nonexistent/bench.toml")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BenchError>(),
            Some(BenchError::Config(_))
        ));
    }
}
