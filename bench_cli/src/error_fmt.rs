//! Human-readable error descriptions, exit codes and JSON error formatting.

use bench_core::error::{BenchError, BuildError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::EmptyPowerMap => {
                "What happened: The power map is empty.\nLikely causes: [power] map = [] in the config.\nHow to fix: List at least one 0..=255 level in [power] map.".to_string()
            }
            BuildError::MissingProfiles => {
                "What happened: No ride profiles are configured.\nLikely causes: An empty [[profiles]] list.\nHow to fix: Add a [[profiles]] table or remove the key to use the built-in profiles.".to_string()
            }
            BuildError::IndexOutOfRange { table, index } => format!(
                "What happened: A {table} refers to power index {index}, which the power map does not have.\nLikely causes: The power map was shortened without updating steps, rungs or profiles.\nHow to fix: Keep every index below the length of [power] map."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BenchError>() {
        return match be {
            BenchError::Timeout => {
                "What happened: Sensor read timed out.\nLikely causes: ADC not wired correctly, SPI disabled, or no power to the sense board.\nHow to fix: Check the ADC wiring and that SPI is enabled, then rerun.".to_string()
            }
            BenchError::Config(msg) if msg.contains("calibration CSV must have headers") => {
                "Invalid headers in calibration CSV. Expected 'raw,volts'.".to_string()
            }
            BenchError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing [sensor] section or out-of-range values.\nHow to fix: Edit the config file, then rerun."
            ),
            BenchError::Hardware(msg) | BenchError::HardwareFault(msg) => format!(
                "What happened: Hardware error ({msg}).\nLikely causes: Wrong pin or channel numbers, or missing GPIO/SPI permissions.\nHow to fix: Check [pins] in the config and run with access to the GPIO and SPI devices."
            ),
            BenchError::State(msg) => format!(
                "What happened: {msg}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug for more detail."
            ),
        };
    }

    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: config 2, hardware 3, timeout 4, anything else 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    match err.downcast_ref::<BenchError>() {
        Some(BenchError::Config(_)) => 2,
        Some(BenchError::Hardware(_) | BenchError::HardwareFault(_)) => 3,
        Some(BenchError::Timeout) => 4,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    match err.downcast_ref::<BenchError>() {
        Some(BenchError::Config(_)) => "Config",
        Some(BenchError::Hardware(_) | BenchError::HardwareFault(_)) => "Hardware",
        Some(BenchError::Timeout) => "Timeout",
        Some(BenchError::State(_)) => "State",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
