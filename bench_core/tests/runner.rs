use std::sync::atomic::{AtomicBool, Ordering};

use bench_core::config::SleepCfg;
use bench_core::error::BenchError;
use bench_core::mocks::{NoopSleep, RecordingDisplay, ScriptedButtons, ScriptedSensor, SpyPower};
use bench_core::{Bench, ModeKind, Ports, RunParams, run};
use bench_traits::clock::ManualClock;
use bench_traits::{ButtonLatch, WakeTrigger};

struct Rig {
    sensor: ScriptedSensor,
    power: SpyPower,
    display: RecordingDisplay,
    buttons: ScriptedButtons,
    sleep: NoopSleep,
}

impl Rig {
    fn new(buttons: Vec<(u64, ButtonLatch)>) -> Self {
        Self {
            sensor: ScriptedSensor::square(5, 5, 2011, 29),
            power: SpyPower::default(),
            display: RecordingDisplay::default(),
            buttons: ScriptedButtons::new(buttons),
            sleep: NoopSleep::default(),
        }
    }

    fn ports(&mut self) -> Ports<'_> {
        Ports {
            sensor: &mut self.sensor,
            power: &mut self.power,
            display: &mut self.display,
            buttons: &mut self.buttons,
            sleep: &mut self.sleep,
        }
    }
}

#[test]
fn bounded_run_counts_ticks_and_stops_output() {
    let mut bench = Bench::builder().try_build().expect("defaults");
    let mut rig = Rig::new(Vec::new());
    let clock = ManualClock::new();
    let params = RunParams {
        sample_rate_hz: 1000,
        duration_ms: Some(3000),
    };
    let summary = run(&mut bench, rig.ports(), &clock, params, None).expect("run");

    assert_eq!(summary.iterations, 3000);
    assert_eq!(summary.elapsed_ms, 3000);
    assert_eq!(summary.slow_ticks, 2);
    assert!(summary.fast_ticks >= 40);
    assert_eq!(summary.final_mode, ModeKind::FreeRun);
    // 1 rising edge per 10 ms -> 100 Hz * 3/7 rev -> ~2571 rpm
    assert!((2500..2650).contains(&summary.last.rpm), "{:?}", summary.last);
    assert_eq!(rig.power.last(), Some(0));
}

#[test]
fn shutdown_flag_ends_the_run() {
    let mut bench = Bench::builder().try_build().expect("defaults");
    let mut rig = Rig::new(Vec::new());
    let clock = ManualClock::new();
    let stop = AtomicBool::new(true);
    let summary = run(
        &mut bench,
        rig.ports(),
        &clock,
        RunParams::default(),
        Some(&stop),
    )
    .expect("run");
    assert_eq!(summary.iterations, 0);
    stop.store(false, Ordering::Relaxed);
}

#[test]
fn sensor_failure_aborts_with_timeout() {
    let mut bench = Bench::builder().try_build().expect("defaults");
    let mut rig = Rig::new(Vec::new());
    rig.sensor = ScriptedSensor::new(Vec::new());
    let clock = ManualClock::new();
    let err = run(
        &mut bench,
        rig.ports(),
        &clock,
        RunParams {
            sample_rate_hz: 100,
            duration_ms: Some(1000),
        },
        None,
    )
    .expect_err("sensor failure");
    assert!(matches!(
        err.downcast_ref::<BenchError>(),
        Some(BenchError::Timeout)
    ));
    assert_eq!(rig.power.writes(), &[0]);
}

#[test]
fn scripted_presses_drive_a_ladder_sweep() {
    let mut bench = Bench::builder()
        .with_initial_mode(ModeKind::TorqueLadder)
        .try_build()
        .expect("defaults");
    let long = ButtonLatch {
        secondary_long: true,
        ..ButtonLatch::default()
    };
    let mut rig = Rig::new(vec![(100, long)]);
    let clock = ManualClock::new();
    // 6 slow windows of 2 s cover three wait/calc pairs
    let summary = run(
        &mut bench,
        rig.ports(),
        &clock,
        RunParams {
            sample_rate_hz: 1000,
            duration_ms: Some(12_500),
        },
        None,
    )
    .expect("run");
    assert!(bench.controller().is_idle());
    assert!(rig.power.writes().contains(&250));
    assert!(summary.last.rpm > 0);
}

#[test]
fn idle_timeout_requests_sleep() {
    let mut bench = Bench::builder()
        .with_initial_mode(ModeKind::RideSim)
        .with_sleep(SleepCfg {
            idle_s: 1,
            duration_s: 30,
            wake: WakeTrigger::GpioHigh(2),
        })
        .try_build()
        .expect("valid bench");
    let mut rig = Rig::new(Vec::new());
    let clock = ManualClock::new();
    let summary = run(
        &mut bench,
        rig.ports(),
        &clock,
        RunParams {
            sample_rate_hz: 100,
            duration_ms: Some(2500),
        },
        None,
    )
    .expect("run");
    assert_eq!(summary.sleeps, 2);
    assert_eq!(rig.sleep.requests[0], (30, WakeTrigger::GpioHigh(2)));
}
