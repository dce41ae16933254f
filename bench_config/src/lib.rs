#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and calibration parsing for the motor test bench.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The calibration CSV loader enforces headers and the same point rules
//!   as inline `[calibration]` tables.
use serde::Deserialize;

/// Calibration CSV schema.
///
/// Expected headers:
/// raw,volts
///
/// Example:
/// raw,volts
/// 29,0.0
/// 327,0.5
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct CalibrationRow {
    pub raw: u32,
    pub volts: f32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pins {
    pub power_pwm_channel: u8,
    pub button_primary: u8,
    pub button_secondary: u8,
    /// Mode-select button; absent on two-button builds.
    pub button_next_mode: Option<u8>,
    /// SPI ADC channel of each analog input.
    pub adc_rotation: u8,
    pub adc_voltage: u8,
    pub adc_current: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            power_pwm_channel: 0,
            button_primary: 17,
            button_secondary: 27,
            button_next_mode: Some(22),
            adc_rotation: 0,
            adc_voltage: 1,
            adc_current: 2,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Sensor {
    /// Driver loop rate; one sample per iteration.
    pub sample_rate_hz: u32,
    #[serde(default = "default_midpoint")]
    pub midpoint: u32,
    #[serde(default = "default_guard_band")]
    pub guard_band: u32,
}

fn default_midpoint() -> u32 {
    2048
}

fn default_guard_band() -> u32 {
    256
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Drivetrain {
    pub motor_poles: u32,
    pub gear_ratio: f32,
    pub wheel_reduction: f32,
    pub wheel_diameter_mm: f32,
}

impl Default for Drivetrain {
    fn default() -> Self {
        Self {
            motor_poles: 14,
            gear_ratio: 3.0,
            wheel_reduction: 0.25,
            wheel_diameter_mm: 23.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sense {
    pub current_amps_per_volt: f32,
    pub current_divider: f32,
    /// Zero offset of the current channel, in volts after the divider.
    pub current_offset_volts: f32,
}

impl Default for Sense {
    fn default() -> Self {
        Self {
            current_amps_per_volt: 80.0 / 5.0 * 1.22,
            current_divider: 0.5,
            current_offset_volts: 0.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Cadence {
    pub fast_hz: f32,
    pub free_run_slow_ms: u64,
    pub ladder_slow_ms: u64,
    pub ride_slow_ms: u64,
    pub speed_check_slow_ms: u64,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            fast_hz: 15.0,
            free_run_slow_ms: 1000,
            ladder_slow_ms: 2000,
            ride_slow_ms: 2000,
            speed_check_slow_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Power {
    pub map: Vec<i32>,
    pub free_run_steps: Vec<usize>,
    pub ladder_rungs: Vec<usize>,
    pub calc_slots: usize,
}

impl Default for Power {
    fn default() -> Self {
        Self {
            map: vec![30, 95, 100, 105, 110, 120, 250],
            free_run_steps: (0..7).collect(),
            ladder_rungs: vec![0, 3, 6],
            calc_slots: 3,
        }
    }
}

/// One `[[profiles]]` entry. `steps` are `[trigger_m, power_index]` pairs.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub cycle_meters: f64,
    pub cycles: u32,
    pub steps: Vec<(f64, usize)>,
}

fn default_profiles() -> Vec<Profile> {
    vec![
        Profile {
            name: "sprint".into(),
            cycle_meters: 40.0,
            cycles: 5,
            steps: vec![
                (0.0, 3),
                (10.0, 1),
                (15.0, 6),
                (18.0, 1),
                (25.0, 6),
                (28.0, 1),
                (30.0, 2),
            ],
        },
        Profile {
            name: "steady".into(),
            cycle_meters: 20.0,
            cycles: 3,
            steps: vec![(0.0, 2)],
        },
    ]
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Ride {
    /// Nominal pack voltage for the mAh readout.
    pub pack_volts: f32,
}

impl Default for Ride {
    fn default() -> Self {
        Self { pack_volts: 2.4 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AboveRange {
    #[default]
    Zero,
    Clamp,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Inline `[raw, volts]` pairs; the built-in table is used when absent.
    pub points: Option<Vec<(u32, f32)>>,
    /// Path to a `raw,volts` CSV; takes precedence over `points`.
    pub csv: Option<String>,
    pub above_range: AboveRange,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sleep {
    /// Seconds without button activity before sleeping (0 disables).
    pub idle_s: u32,
    pub duration_s: u32,
    /// GPIO that wakes the bench when it goes high; timer-only when absent.
    pub wake_pin: Option<u8>,
}

impl Default for Sleep {
    fn default() -> Self {
        Self {
            idle_s: 0,
            duration_s: 10,
            wake_pin: Some(2),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pins: Pins,
    pub sensor: Sensor,
    #[serde(default)]
    pub drivetrain: Drivetrain,
    #[serde(default)]
    pub sense: Sense,
    #[serde(default)]
    pub cadence: Cadence,
    #[serde(default)]
    pub power: Power,
    #[serde(default = "default_profiles")]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub ride: Ride,
    #[serde(default)]
    pub calibration: CalibrationCfg,
    #[serde(default)]
    pub sleep: Sleep,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Check a calibration point list: at least two points, first at 0 V, raw
/// strictly increasing, volts finite and non-decreasing.
pub fn validate_points(points: &[CalibrationRow]) -> eyre::Result<()> {
    if points.len() < 2 {
        eyre::bail!(
            "calibration requires at least two points, got {}",
            points.len()
        );
    }
    if points[0].volts != 0.0 {
        eyre::bail!("first calibration point must be 0 V, got {}", points[0].volts);
    }
    for i in 1..points.len() {
        if points[i].raw <= points[i - 1].raw {
            eyre::bail!(
                "calibration raw values must be strictly increasing (index {} and {})",
                i - 1,
                i
            );
        }
        if !points[i].volts.is_finite() || points[i].volts < points[i - 1].volts {
            eyre::bail!(
                "calibration volts must be finite and non-decreasing (index {})",
                i
            );
        }
    }
    Ok(())
}

pub fn load_calibration_csv(path: &std::path::Path) -> eyre::Result<Vec<CalibrationRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["raw", "volts"];
    let actual: Vec<String> = headers.iter().map(ToString::to_string).collect();
    if actual != expected {
        eyre::bail!(
            "calibration CSV must have headers 'raw,volts', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<CalibrationRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    validate_points(&rows)?;
    Ok(rows)
}

impl CalibrationCfg {
    /// Inline points as rows, if configured.
    pub fn rows(&self) -> Option<Vec<CalibrationRow>> {
        self.points.as_ref().map(|pts| {
            pts.iter()
                .map(|&(raw, volts)| CalibrationRow { raw, volts })
                .collect()
        })
    }
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sensor
        if self.sensor.sample_rate_hz == 0 {
            eyre::bail!("sensor.sample_rate_hz must be > 0");
        }
        if self.sensor.guard_band >= self.sensor.midpoint {
            eyre::bail!("sensor.guard_band must be smaller than sensor.midpoint");
        }

        // Drivetrain
        let d = &self.drivetrain;
        if d.motor_poles < 2 || d.motor_poles % 2 != 0 {
            eyre::bail!("drivetrain.motor_poles must be even and >= 2");
        }
        if !(d.gear_ratio.is_finite() && d.gear_ratio > 0.0) {
            eyre::bail!("drivetrain.gear_ratio must be > 0");
        }
        if !(d.wheel_reduction.is_finite() && d.wheel_reduction > 0.0) {
            eyre::bail!("drivetrain.wheel_reduction must be > 0");
        }
        if !(d.wheel_diameter_mm.is_finite() && d.wheel_diameter_mm > 0.0) {
            eyre::bail!("drivetrain.wheel_diameter_mm must be > 0");
        }

        // Sense
        if !self.sense.current_amps_per_volt.is_finite() || !self.sense.current_divider.is_finite()
        {
            eyre::bail!("sense scaling must be finite");
        }

        // Cadence
        if !(self.cadence.fast_hz.is_finite() && self.cadence.fast_hz > 0.0) {
            eyre::bail!("cadence.fast_hz must be > 0");
        }
        for (name, ms) in [
            ("free_run_slow_ms", self.cadence.free_run_slow_ms),
            ("ladder_slow_ms", self.cadence.ladder_slow_ms),
            ("ride_slow_ms", self.cadence.ride_slow_ms),
            ("speed_check_slow_ms", self.cadence.speed_check_slow_ms),
        ] {
            if ms == 0 {
                eyre::bail!("cadence.{name} must be >= 1");
            }
        }

        // Power
        let levels = self.power.map.len();
        if levels == 0 {
            eyre::bail!("power.map must not be empty");
        }
        if self.power.free_run_steps.is_empty() {
            eyre::bail!("power.free_run_steps must not be empty");
        }
        if let Some(i) = self.power.free_run_steps.iter().find(|&&i| i >= levels) {
            eyre::bail!("power.free_run_steps index {i} is outside power.map");
        }
        if self.power.ladder_rungs.is_empty() {
            eyre::bail!("power.ladder_rungs must not be empty");
        }
        if let Some(i) = self.power.ladder_rungs.iter().find(|&&i| i >= levels) {
            eyre::bail!("power.ladder_rungs index {i} is outside power.map");
        }
        if self.power.calc_slots == 0 {
            eyre::bail!("power.calc_slots must be >= 1");
        }

        // Profiles
        if self.profiles.is_empty() {
            eyre::bail!("at least one [[profiles]] entry is required");
        }
        for p in &self.profiles {
            let Some(first) = p.steps.first() else {
                eyre::bail!("profile '{}' has no steps", p.name);
            };
            if first.0 != 0.0 {
                eyre::bail!("profile '{}' must start with a step at 0 m", p.name);
            }
            if p.steps.windows(2).any(|w| w[1].0 <= w[0].0) {
                eyre::bail!("profile '{}' step triggers must be strictly increasing", p.name);
            }
            if !(p.cycle_meters.is_finite() && p.cycle_meters > 0.0) {
                eyre::bail!("profile '{}' cycle_meters must be > 0", p.name);
            }
            if p.steps.iter().any(|s| s.0 >= p.cycle_meters) {
                eyre::bail!("profile '{}' step triggers must fall inside one cycle", p.name);
            }
            if p.cycles == 0 {
                eyre::bail!("profile '{}' cycles must be >= 1", p.name);
            }
            if let Some(s) = p.steps.iter().find(|s| s.1 >= levels) {
                eyre::bail!(
                    "profile '{}' power index {} is outside power.map",
                    p.name,
                    s.1
                );
            }
        }

        // Ride
        if !(self.ride.pack_volts.is_finite() && self.ride.pack_volts > 0.0) {
            eyre::bail!("ride.pack_volts must be > 0");
        }

        // Calibration
        if let Some(rows) = self.calibration.rows() {
            validate_points(&rows)?;
        }

        // Sleep
        if self.sleep.idle_s > 0 && self.sleep.duration_s == 0 {
            eyre::bail!("sleep.duration_s must be >= 1 when idle sleep is enabled");
        }

        Ok(())
    }
}
