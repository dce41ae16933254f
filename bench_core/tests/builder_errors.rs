use bench_core::config::{LadderCfg, LevelCfg, RideCfg};
use bench_core::error::BuildError;
use bench_core::mocks::{RecordingDisplay, SpyPower};
use bench_core::profile::{PowerProfile, ProfileStep};
use bench_core::pulse::Drivetrain;
use bench_core::{Bench, ModeKind, PowerMap};
use bench_traits::{ButtonLatch, RawSample};
use rstest::rstest;

#[rstest]
fn defaults_build() {
    let bench = Bench::builder().try_build().expect("defaults are valid");
    assert_eq!(bench.instrument().power_map.len(), 7);
}

#[rstest]
fn ladder_rung_outside_map_is_typed() {
    let err = Bench::builder()
        .with_power_map(PowerMap::new(vec![10, 20]).expect("non-empty"))
        .with_levels(LevelCfg { steps: vec![0, 1] })
        .with_ladder(LadderCfg {
            rungs: vec![0, 5],
            calc_slots: 1,
        })
        .try_build()
        .expect_err("rung 5 does not exist");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::IndexOutOfRange { table, index }) => {
            assert_eq!(*table, "ladder rung");
            assert_eq!(*index, 5);
        }
        other => panic!("expected IndexOutOfRange, got: {other:?}"),
    }
}

#[rstest]
fn default_levels_do_not_fit_a_short_map() {
    let err = Bench::builder()
        .with_power_map(PowerMap::new(vec![10, 20]).expect("non-empty"))
        .try_build()
        .expect_err("default levels reach index 6");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::IndexOutOfRange { table: "level", .. })
    ));
}

#[rstest]
fn missing_profiles_is_typed() {
    let err = Bench::builder()
        .with_ride(RideCfg {
            profiles: Vec::new(),
            pack_volts: 2.4,
        })
        .try_build()
        .expect_err("no profiles");
    assert_eq!(
        err.downcast_ref::<BuildError>(),
        Some(&BuildError::MissingProfiles)
    );
}

#[rstest]
#[case(LadderCfg { rungs: vec![], calc_slots: 3 })]
#[case(LadderCfg { rungs: vec![0], calc_slots: 0 })]
fn degenerate_ladders_are_rejected(#[case] ladder: LadderCfg) {
    let err = Bench::builder()
        .with_ladder(ladder)
        .try_build()
        .expect_err("degenerate ladder");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
}

#[rstest]
#[case(0)]
#[case(7)]
fn odd_or_zero_poles_are_rejected(#[case] poles: u32) {
    let err = Bench::builder()
        .with_drivetrain(Drivetrain {
            motor_poles: poles,
            ..Drivetrain::default()
        })
        .try_build()
        .expect_err("bad pole count");
    assert!(err.to_string().contains("motor poles"));
}

#[rstest]
fn stepless_profile_cannot_be_built() {
    let err = PowerProfile::new("empty", Vec::new(), 10.0, 1).expect_err("no steps");
    assert!(matches!(err, BuildError::InvalidConfig(_)));
}

#[rstest]
fn single_step_profile_rides_after_long_press() {
    let profile =
        PowerProfile::new("one", vec![ProfileStep::new(0.0, 2)], 5.0, 1).expect("one step");
    let mut bench = Bench::builder()
        .with_ride(RideCfg {
            profiles: vec![profile],
            pack_volts: 2.4,
        })
        .with_initial_mode(ModeKind::RideSim)
        .try_build()
        .expect("single-step profile is valid");
    let mut display = RecordingDisplay::default();
    let mut power = SpyPower::default();
    let long = ButtonLatch {
        secondary_long: true,
        ..ButtonLatch::default()
    };

    bench
        .step(0, RawSample::default(), long, &mut display, &mut power)
        .expect("step");
    for now_ms in (100..=1000).step_by(100) {
        bench
            .step(
                now_ms,
                RawSample::default(),
                ButtonLatch::default(),
                &mut display,
                &mut power,
            )
            .expect("step");
    }
    assert_eq!(bench.mode(), ModeKind::RideSim);
    assert!(!power.writes().is_empty());
}
