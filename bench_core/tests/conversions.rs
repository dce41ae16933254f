use std::fs::File;
use std::io::Write;

use bench_core::calibration::AboveRange;
use bench_core::conversions::calibration_from_config;
use bench_core::{BenchBuilder, ModeKind};
use bench_traits::WakeTrigger;

const TOML: &str = r#"
[sensor]
sample_rate_hz = 500
midpoint = 1000
guard_band = 100

[cadence]
fast_hz = 10.0
ladder_slow_ms = 1500

[power]
map = [10, 20, 30]
free_run_steps = [0, 2]
ladder_rungs = [1, 2]
calc_slots = 2

[[profiles]]
name = "flat"
cycle_meters = 5.0
cycles = 1
steps = [[0, 2]]

[calibration]
points = [[0, 0.0], [100, 1.0]]
above_range = "clamp"

[sleep]
idle_s = 60
wake_pin = 4
"#;

#[test]
fn config_seeds_the_builder() {
    let cfg = bench_config::load_toml(TOML).expect("parse TOML");
    cfg.validate().expect("valid");
    let bench = BenchBuilder::from_config(&cfg, None)
        .expect("convert")
        .with_initial_mode(ModeKind::TorqueLadder)
        .try_build()
        .expect("build");

    let inst = bench.instrument();
    assert_eq!(inst.hysteresis.midpoint, 1000);
    assert_eq!(inst.power_map.power_level_for(2), 30);
    assert_eq!(inst.calibration.above_range(), AboveRange::Clamp);
    assert!((inst.volts(50) - 0.5).abs() < 1e-6);
    assert_eq!(inst.volts(500), 1.0);
    assert_eq!(bench.sleep_cfg().wake, WakeTrigger::GpioHigh(4));
    assert_eq!(bench.sleep_cfg().idle_s, 60);
}

#[test]
fn csv_path_resolves_against_config_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut f = File::create(dir.path().join("cal.csv")).expect("create");
    f.write_all(b"raw,volts\n10,0.0\n20,2.0\n").expect("write");

    let cfg = bench_config::load_toml(
        "[sensor]\nsample_rate_hz = 100\n[calibration]\ncsv = \"cal.csv\"\n",
    )
    .expect("parse TOML");
    let table = calibration_from_config(&cfg.calibration, Some(dir.path())).expect("load");
    assert_eq!(table.points().len(), 2);
    assert!((table.voltage_for(15) - 1.0).abs() < 1e-6);
    assert_eq!(table.above_range(), AboveRange::Zero);
}
