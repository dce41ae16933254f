mod buttons;
mod cli;
mod error_fmt;
mod setup;

use bench_config::Config;
use bench_core::{ModeKind, Ports, RunParams, RunSummary, run};
use bench_hardware::TerminalDisplay;
use bench_traits::MonotonicClock;
use clap::Parser;
use eyre::{Result, WrapErr};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::buttons::{Press, ScheduledButtons, spawn_stdin_reader};
use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

const ZERO_SAMPLES: u32 = 64;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(err) = real_main(cli) {
        tracing::error!(error = %err, "bench failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> Result<()> {
    color_eyre::install()?;
    let mut cfg = setup::load_config(&cli.config)?;
    setup::init_tracing(cli.json, &cli.log_level, &cfg.logging)?;

    // A CSV given on the command line is taken relative to the cwd.
    let base_dir = match &cli.calibration {
        Some(csv) => {
            cfg.calibration.csv = Some(csv.to_string_lossy().into_owned());
            None
        }
        None => cli.config.parent(),
    };

    match cli.cmd {
        Commands::Run {
            mode,
            duration_ms,
            press,
            zero_current,
        } => cmd_run(&cfg, base_dir, cli.json, mode, duration_ms, press, zero_current),
        Commands::Table { step } => cmd_table(&cfg, base_dir, cli.json, step),
        Commands::SelfCheck { samples } => cmd_self_check(&cfg, base_dir, cli.json, samples),
    }
}

fn cmd_run(
    cfg: &Config,
    base_dir: Option<&Path>,
    json: bool,
    mode: ModeKind,
    duration_ms: Option<u64>,
    press: Vec<Press>,
    zero_current: bool,
) -> Result<()> {
    let mut bench = setup::build_bench(cfg, base_dir, mode)?;
    let mut rig = setup::open_rig(cfg)?;
    if zero_current {
        setup::zero_current(
            &mut bench,
            rig.sensor.as_mut(),
            rig.power.as_mut(),
            ZERO_SAMPLES,
        )?;
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "no Ctrl-C handler; run stops only on --duration-ms");
        }
    }

    let clock = MonotonicClock::new();
    let mut buttons = ScheduledButtons::new(clock, press).with_stdin(spawn_stdin_reader());
    if let Some(inner) = rig.buttons.take() {
        buttons = buttons.with_inner(inner);
    }
    let mut display = if json {
        TerminalDisplay::default()
    } else {
        TerminalDisplay::default().with_sink(Box::new(std::io::stdout()))
    };

    let params = RunParams {
        sample_rate_hz: cfg.sensor.sample_rate_hz,
        duration_ms,
    };
    let summary = run(
        &mut bench,
        Ports {
            sensor: rig.sensor.as_mut(),
            power: rig.power.as_mut(),
            display: &mut display,
            buttons: &mut buttons,
            sleep: rig.sleep.as_mut(),
        },
        &clock,
        params,
        Some(&shutdown),
    )?;
    print_summary(&summary, json);
    Ok(())
}

fn print_summary(s: &RunSummary, json: bool) {
    if json {
        let obj = serde_json::json!({
            "mode": s.final_mode.name(),
            "iterations": s.iterations,
            "fast_ticks": s.fast_ticks,
            "slow_ticks": s.slow_ticks,
            "sleeps": s.sleeps,
            "elapsed_ms": s.elapsed_ms,
            "last_power": s.last_power,
            "rpm": s.last.rpm,
            "volts": s.last.volts,
            "amps": s.last.amps,
        });
        println!("{obj}");
    } else {
        println!(
            "run complete: mode={} iterations={} fast_ticks={} slow_ticks={} sleeps={} elapsed_ms={}",
            s.final_mode, s.iterations, s.fast_ticks, s.slow_ticks, s.sleeps, s.elapsed_ms
        );
        println!(
            "last: rpm={} volts={:.2} amps={:.2} power={}",
            s.last.rpm,
            s.last.volts,
            s.last.display_amps(),
            s.last_power
        );
    }
}

fn cmd_table(cfg: &Config, base_dir: Option<&Path>, json: bool, step: u32) -> Result<()> {
    let bench = setup::build_bench(cfg, base_dir, ModeKind::FreeRun)?;
    let table = &bench.instrument().calibration;
    let mut raws: Vec<u32> = (0..=4095).step_by(step as usize).collect();
    if raws.last() != Some(&4095) {
        raws.push(4095);
    }
    if json {
        let rows: Vec<_> = raws
            .iter()
            .map(|&raw| serde_json::json!({ "raw": raw, "volts": table.voltage_for(raw) }))
            .collect();
        println!(
            "{}",
            serde_json::json!({ "above_range": format!("{:?}", table.above_range()), "rows": rows })
        );
    } else {
        println!("raw,volts");
        for raw in raws {
            println!("{raw},{:.3}", table.voltage_for(raw));
        }
    }
    Ok(())
}

fn cmd_self_check(cfg: &Config, base_dir: Option<&Path>, json: bool, samples: u32) -> Result<()> {
    let bench = setup::build_bench(cfg, base_dir, ModeKind::FreeRun)?;
    let mut rig = setup::open_rig(cfg)?;
    rig.power
        .write_power(0)
        .map_err(setup::seam_error)
        .wrap_err("power write")?;
    let avg = setup::average_taps(rig.sensor.as_mut(), samples)?;

    let instrument = bench.instrument();
    let supply_v = instrument.volts(avg.voltage);
    let current_tap_v = instrument.volts(avg.current);
    let zero_offset_v = instrument.sense.zero_offset_for(current_tap_v);
    tracing::info!(samples, supply_v, current_tap_v, "self-check");

    if json {
        println!(
            "{}",
            serde_json::json!({
                "ok": true,
                "samples": samples,
                "raw": { "rotation": avg.rotation, "voltage": avg.voltage, "current": avg.current },
                "supply_v": supply_v,
                "current_tap_v": current_tap_v,
                "zero_offset_v": zero_offset_v,
            })
        );
    } else {
        println!("self-check ok ({samples} samples)");
        println!("supply: raw={} volts={supply_v:.3}", avg.voltage);
        println!("current tap: raw={} volts={current_tap_v:.3}", avg.current);
        println!("zero offset: {zero_offset_v:.3} V");
    }
    Ok(())
}
