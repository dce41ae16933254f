use bench_hardware::{LoggingSleep, SimConfig, SimulatedRig};
use bench_traits::{PowerOutput, SensorSource, SleepControl, WakeTrigger};
use rstest::rstest;

fn rising_edges(rig: &SimulatedRig, samples: usize) -> u32 {
    let mut sensor = rig.sensor();
    let cfg = SimConfig::default();
    let mut high = false;
    let mut edges = 0;
    for _ in 0..samples {
        let level = sensor.sample().unwrap().rotation == cfg.rotation_high;
        if level && !high {
            edges += 1;
        }
        high = level;
    }
    edges
}

#[rstest]
#[case(0, 0)]
#[case(255, 350)]
#[case(51, 70)]
fn edge_rate_tracks_duty(#[case] duty: u8, #[case] expected_per_s: u32) {
    let rig = SimulatedRig::default();
    rig.power().write_power(duty).unwrap();
    let edges = rising_edges(&rig, 1000);
    assert!(
        edges.abs_diff(expected_per_s) <= 1,
        "duty {duty}: {edges} edges"
    );
}

#[test]
fn timeout_injection_returns_typed_error() {
    let rig = SimulatedRig::default();
    let mut s = rig.sensor().with_timeout_after(2);
    assert!(s.sample().is_ok());
    assert!(s.sample().is_ok());
    let err = s.sample().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<bench_hardware::error::HwError>(),
        Some(bench_hardware::error::HwError::Timeout)
    ));
}

#[test]
fn logging_sleep_counts_requests() {
    let mut sleep = LoggingSleep::default();
    sleep.request_sleep(10, WakeTrigger::GpioHigh(2)).unwrap();
    sleep.request_sleep(10, WakeTrigger::Timer).unwrap();
    assert_eq!(sleep.requests(), 2);
}
