//! Drives a `Bench` from the collaborator seams at a fixed loop rate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bench_traits::{ButtonSource, Clock, Display, PowerOutput, SensorSource, SleepControl};
use eyre::WrapErr;

use crate::bench::Bench;
use crate::error::Result;
use crate::hw_error::map_hw_error;
use crate::modes::ModeKind;
use crate::snapshot::Measurement;

/// Everything the loop reads from or writes to.
pub struct Ports<'a> {
    pub sensor: &'a mut dyn SensorSource,
    pub power: &'a mut dyn PowerOutput,
    pub display: &'a mut dyn Display,
    pub buttons: &'a mut dyn ButtonSource,
    pub sleep: &'a mut dyn SleepControl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParams {
    /// Driver loop rate; one sensor sample per iteration.
    pub sample_rate_hz: u32,
    /// Stop after this much clock time. `None` runs until shutdown.
    pub duration_ms: Option<u64>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            sample_rate_hz: 1000,
            duration_ms: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub iterations: u64,
    pub fast_ticks: u64,
    pub slow_ticks: u64,
    pub sleeps: u32,
    pub elapsed_ms: u64,
    pub final_mode: ModeKind,
    pub last_power: u8,
    pub last: Measurement,
}

/// Run until `params.duration_ms` elapses or `shutdown` is raised.
///
/// The output is driven to 0 on every exit path. A sensor or power failure
/// ends the run with the mapped error.
pub fn run(
    bench: &mut Bench,
    mut ports: Ports<'_>,
    clock: &dyn Clock,
    params: RunParams,
    shutdown: Option<&AtomicBool>,
) -> Result<RunSummary> {
    let result = drive(bench, &mut ports, clock, params, shutdown);
    if let Err(e) = ports.power.write_power(0) {
        tracing::warn!(error = %e, "failed to stop output on exit");
    }
    result
}

fn drive(
    bench: &mut Bench,
    ports: &mut Ports<'_>,
    clock: &dyn Clock,
    params: RunParams,
    shutdown: Option<&AtomicBool>,
) -> Result<RunSummary> {
    let period = Duration::from_micros(crate::util::period_us(params.sample_rate_hz));
    let epoch = clock.now();
    let mut summary = RunSummary {
        iterations: 0,
        fast_ticks: 0,
        slow_ticks: 0,
        sleeps: 0,
        elapsed_ms: 0,
        final_mode: bench.mode(),
        last_power: 0,
        last: Measurement::default(),
    };

    tracing::info!(
        mode = %bench.mode(),
        sample_rate_hz = params.sample_rate_hz,
        duration_ms = ?params.duration_ms,
        "run start"
    );

    loop {
        if shutdown.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            tracing::info!("shutdown requested");
            break;
        }
        let now_ms = clock.ms_since(epoch);
        if params.duration_ms.is_some_and(|limit| now_ms >= limit) {
            break;
        }

        let sample = ports
            .sensor
            .sample()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("sensor read")?;
        let buttons = ports.buttons.poll();
        let report = bench.step(now_ms, sample, buttons, &mut *ports.display, &mut *ports.power)?;

        summary.iterations += 1;
        summary.fast_ticks += u64::from(report.fast);
        summary.slow_ticks += u64::from(report.slow);

        if report.sleep_due {
            let cfg = bench.sleep_cfg();
            tracing::info!(duration_s = cfg.duration_s, wake = ?cfg.wake, "idle, requesting sleep");
            if let Err(e) = ports.sleep.request_sleep(cfg.duration_s, cfg.wake) {
                tracing::warn!(error = %e, "sleep request failed");
            }
            summary.sleeps += 1;
            bench.note_wake(clock.ms_since(epoch));
        }

        clock.sleep(period);
    }

    summary.elapsed_ms = clock.ms_since(epoch);
    summary.final_mode = bench.mode();
    summary.last_power = bench.last_power();
    summary.last = bench.snapshot();
    tracing::info!(
        iterations = summary.iterations,
        fast_ticks = summary.fast_ticks,
        slow_ticks = summary.slow_ticks,
        "run stop"
    );
    Ok(summary)
}
