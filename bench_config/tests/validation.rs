use bench_config::{AboveRange, load_toml};
use rstest::rstest;

const MINIMAL: &str = r#"
[sensor]
sample_rate_hz = 1000
"#;

fn with(extra: &str) -> String {
    format!("{MINIMAL}\n{extra}")
}

fn rejection(toml: &str) -> String {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    format!("{err}").to_lowercase()
}

#[test]
fn minimal_config_takes_bench_defaults() {
    let cfg = load_toml(MINIMAL).expect("parse TOML");
    cfg.validate().expect("defaults are valid");
    assert_eq!(cfg.sensor.midpoint, 2048);
    assert_eq!(cfg.sensor.guard_band, 256);
    assert_eq!(cfg.power.map, vec![30, 95, 100, 105, 110, 120, 250]);
    assert_eq!(cfg.power.ladder_rungs, vec![0, 3, 6]);
    assert_eq!(cfg.profiles.len(), 2);
    assert_eq!(cfg.profiles[0].name, "sprint");
    assert_eq!(cfg.calibration.above_range, AboveRange::Zero);
    assert_eq!(cfg.sleep.idle_s, 0);
}

#[test]
fn sensor_section_is_required() {
    assert!(load_toml("[power]\ncalc_slots = 2\n").is_err());
}

#[rstest]
#[case("[sensor]\nsample_rate_hz = 0\n", "sample_rate_hz must be > 0")]
#[case("[sensor]\nsample_rate_hz = 10\nguard_band = 4096\n", "guard_band")]
fn rejects_bad_sensor(#[case] toml: &str, #[case] needle: &str) {
    assert!(rejection(toml).contains(needle));
}

#[rstest]
#[case("[drivetrain]\nmotor_poles = 13\n", "motor_poles must be even")]
#[case("[drivetrain]\nmotor_poles = 0\n", "motor_poles must be even")]
#[case("[drivetrain]\ngear_ratio = 0.0\n", "gear_ratio must be > 0")]
#[case("[drivetrain]\nwheel_diameter_mm = -1.0\n", "wheel_diameter_mm must be > 0")]
#[case("[cadence]\nfast_hz = 0.0\n", "fast_hz must be > 0")]
#[case("[cadence]\nladder_slow_ms = 0\n", "ladder_slow_ms must be >= 1")]
#[case("[power]\nmap = []\n", "power.map must not be empty")]
#[case("[power]\nladder_rungs = [0, 9]\n", "ladder_rungs index 9")]
#[case("[power]\nfree_run_steps = [7]\n", "free_run_steps index 7")]
#[case("[power]\ncalc_slots = 0\n", "calc_slots must be >= 1")]
#[case("[ride]\npack_volts = 0.0\n", "pack_volts must be > 0")]
#[case("[sleep]\nidle_s = 30\nduration_s = 0\n", "duration_s must be >= 1")]
fn rejects_out_of_range_sections(#[case] extra: &str, #[case] needle: &str) {
    let msg = rejection(&with(extra));
    assert!(msg.contains(needle), "{msg}");
}

#[rstest]
#[case("steps = []", "has no steps")]
#[case("steps = [[5.0, 1]]", "step at 0 m")]
#[case("steps = [[0.0, 1], [10.0, 2], [10.0, 3]]", "strictly increasing")]
#[case("steps = [[0.0, 1], [45.0, 2]]", "inside one cycle")]
#[case("steps = [[0.0, 12]]", "power index 12")]
fn rejects_bad_profile(#[case] steps: &str, #[case] needle: &str) {
    let toml = with(&format!(
        "[[profiles]]\nname = \"x\"\ncycle_meters = 40.0\ncycles = 2\n{steps}\n"
    ));
    let msg = rejection(&toml);
    assert!(msg.contains(needle), "{msg}");
}

#[test]
fn rejects_zero_cycles() {
    let toml = with("[[profiles]]\nname = \"x\"\ncycle_meters = 40.0\ncycles = 0\nsteps = [[0, 1]]\n");
    assert!(rejection(&toml).contains("cycles must be >= 1"));
}

#[test]
fn profile_steps_accept_integer_triggers() {
    let toml = with(
        "[[profiles]]\nname = \"hill\"\ncycle_meters = 30\ncycles = 1\nsteps = [[0, 6], [20, 0]]\n",
    );
    let cfg = load_toml(&toml).expect("parse TOML");
    cfg.validate().expect("valid profile");
    assert_eq!(cfg.profiles.len(), 1);
    assert_eq!(cfg.profiles[0].steps, vec![(0.0, 6), (20.0, 0)]);
}

#[rstest]
#[case("points = [[0, 0.0]]", "at least two points")]
#[case("points = [[0, 0.5], [10, 1.0]]", "must be 0 v")]
#[case("points = [[0, 0.0], [0, 1.0]]", "strictly increasing")]
#[case("points = [[0, 0.0], [10, 1.0], [20, 0.5]]", "non-decreasing")]
fn rejects_bad_inline_calibration(#[case] points: &str, #[case] needle: &str) {
    let msg = rejection(&with(&format!("[calibration]\n{points}\n")));
    assert!(msg.contains(needle), "{msg}");
}

#[test]
fn above_range_policy_parses() {
    let cfg = load_toml(&with("[calibration]\nabove_range = \"clamp\"\n")).expect("parse TOML");
    assert_eq!(cfg.calibration.above_range, AboveRange::Clamp);
    assert!(load_toml(&with("[calibration]\nabove_range = \"wrap\"\n")).is_err());
}

#[test]
fn shipped_config_is_valid() {
    let cfg = load_toml(include_str!("../../etc/bench.toml")).expect("parse shipped config");
    cfg.validate().expect("shipped config validates");
    assert_eq!(cfg.profiles[1].name, "steady");
    assert_eq!(cfg.pins.button_next_mode, Some(22));
}
