use std::sync::Arc;

use bench_core::config::LadderCfg;
use bench_core::mocks::RecordingDisplay;
use bench_core::modes::{LadderState, ModeController, TorqueLadder};
use bench_core::Instrument;
use bench_traits::RawSample;

fn spin(ladder: &mut TorqueLadder, edges: u32, window_ms: u64) {
    for _ in 0..edges {
        ladder.channels().observe(RawSample::new(4000, 2011, 29));
        ladder.channels().observe(RawSample::new(0, 2011, 29));
    }
    ladder.channels().accumulate_elapsed(window_ms);
}

#[test]
fn full_sweep_visits_every_rung_and_fills_the_slot() {
    let mut l = TorqueLadder::new(Arc::new(Instrument::default()), &LadderCfg::default());
    let mut d = RecordingDisplay::default();
    assert_eq!(l.state(), LadderState::Sleep);

    l.on_button_secondary_long();
    // flag only; nothing moves until a tick
    assert_eq!(l.state(), LadderState::Sleep);
    l.on_fast_tick(0.0, &mut d);
    assert_eq!((l.state(), l.rung()), (LadderState::Wait, 0));

    let mut seen = Vec::new();
    for rung_edges in [14, 10, 7] {
        // settling window is discarded
        spin(&mut l, 50, 2000);
        l.on_slow_tick(0.0, &mut d);
        assert_eq!(l.state(), LadderState::Calc);
        seen.push((l.state(), l.rung()));

        spin(&mut l, rung_edges, 2000);
        l.on_slow_tick(0.0, &mut d);
    }

    assert_eq!(
        seen,
        vec![
            (LadderState::Calc, 0),
            (LadderState::Calc, 1),
            (LadderState::Calc, 2)
        ]
    );
    assert_eq!(l.state(), LadderState::Sleep);
    assert_eq!(l.rung(), 0);

    let slot = l.slot(0).expect("slot 0");
    let rpms: Vec<i32> = slot.iter().map(|m| m.rpm).collect();
    // edges * 3/7 rev * 60 / 2 s
    assert_eq!(rpms, vec![180, 128, 90]);
    assert!(slot.iter().all(|m| (m.volts - 3.0).abs() < 1e-4));
    assert_eq!(l.ratios(), vec![100, 71, 50]);
}

#[test]
fn power_follows_the_rung_through_the_power_map() {
    let mut l = TorqueLadder::new(Arc::new(Instrument::default()), &LadderCfg::default());
    let mut d = RecordingDisplay::default();
    assert_eq!(l.power_level(), 0);
    l.on_button_secondary_long();
    l.on_fast_tick(0.0, &mut d);
    let mut levels = vec![l.power_level()];
    for _ in 0..4 {
        l.on_slow_tick(0.0, &mut d);
        levels.push(l.power_level());
    }
    // rung indices [0, 3, 6] -> map [30, 105, 250]
    assert_eq!(levels, vec![30, 30, 105, 105, 250]);
    l.on_slow_tick(0.0, &mut d);
    l.on_slow_tick(0.0, &mut d);
    assert_eq!(l.power_level(), 0);
    assert!(l.is_idle());
}

#[test]
fn second_slot_keeps_first_slot_results() {
    let mut l = TorqueLadder::new(Arc::new(Instrument::default()), &LadderCfg::default());
    let mut d = RecordingDisplay::default();
    l.on_button_secondary_long();
    l.on_fast_tick(0.0, &mut d);
    for _ in 0..3 {
        l.on_slow_tick(0.0, &mut d);
        spin(&mut l, 7, 1000);
        l.on_slow_tick(0.0, &mut d);
    }
    l.on_button_secondary();
    l.on_fast_tick(0.0, &mut d);
    assert_eq!(l.active_slot(), 1);
    assert!(l.slot(1).expect("slot 1").iter().all(|m| m.rpm == 0));
    assert!(l.slot(0).expect("slot 0").iter().all(|m| m.rpm == 180));
}
