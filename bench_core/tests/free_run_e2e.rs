//! Free-run through the full `Bench` glue: buttons in, duty out.

use bench_core::config::{CadenceCfg, LevelCfg};
use bench_core::mocks::{RecordingDisplay, SpyPower};
use bench_core::{Bench, ModeKind, PowerMap};
use bench_traits::{ButtonLatch, RawSample};

const SECONDARY: ButtonLatch = ButtonLatch {
    primary: false,
    secondary: true,
    secondary_long: false,
    next_mode: false,
};

fn bench() -> Bench {
    Bench::builder()
        .with_power_map(PowerMap::new(vec![30, 95, 100]).expect("non-empty"))
        .with_levels(LevelCfg {
            steps: vec![0, 1, 2],
        })
        .with_cadence(CadenceCfg {
            fast_ms: 50.0,
            ..CadenceCfg::default()
        })
        .try_build()
        .expect("valid bench")
}

#[test]
fn secondary_cycles_levels_and_wraps() {
    let mut b = bench();
    let mut d = RecordingDisplay::default();
    let mut p = SpyPower::default();
    let mut t = 0;
    let mut tick = |b: &mut Bench, buttons: ButtonLatch| {
        t += 60;
        b.step(t, RawSample::default(), buttons, &mut d, &mut p)
            .expect("step")
    };

    assert_eq!(tick(&mut b, ButtonLatch::default()).power, Some(30));
    let mut seen = Vec::new();
    for _ in 0..3 {
        let r = tick(&mut b, SECONDARY);
        seen.push(r.power.expect("fast tick"));
    }
    assert_eq!(seen, vec![95, 100, 30]);
}

#[test]
fn power_is_written_once_per_fast_tick_only() {
    let mut b = bench();
    let mut d = RecordingDisplay::default();
    let mut p = SpyPower::default();
    let mut fast = 0;
    for t in 0..=1000u64 {
        let r = b
            .step(t, RawSample::default(), ButtonLatch::default(), &mut d, &mut p)
            .expect("step");
        fast += usize::from(r.fast);
    }
    assert_eq!(p.writes().len(), fast);
    // strictly-greater gate: fires at 51, 102, ... -> 19 times in one second
    assert_eq!(fast, 19);
    assert!(p.writes().iter().all(|&w| w == 30));
}

#[test]
fn free_run_shows_level_and_window_rows() {
    let mut b = bench();
    let mut d = RecordingDisplay::default();
    let mut p = SpyPower::default();
    for t in 0..=1001u64 {
        let level = if (t / 10) % 2 == 0 { 4000 } else { 0 };
        b.step(t, RawSample::new(level, 2011, 29), ButtonLatch::default(), &mut d, &mut p)
            .expect("step");
    }
    assert_eq!(b.mode(), ModeKind::FreeRun);
    assert!(d.has_label("T", 0, 0));
    assert!(d.has_label("now", 0, 1));
    // rising edges at t = 0, 20, ..., 1000 -> 51 in 1001 ms
    let rpm = d.int_at(3, 1).expect("rpm drawn");
    assert_eq!(rpm, (51.0f32 * (3.0 / 7.0) * 60.0 * (1000.0 / 1001.0)) as i32);
}
