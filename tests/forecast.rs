mod common;

use common::{ClockTrajectory, ConstantPredicate, SinePredicate, approx_eq};
use satellite_tasking::dynamics::{
    GroundLocation, KeplerOrbit, LocationKind, OrbitalElements, SolarEphemeris,
};
use satellite_tasking::env::parse_epoch;
use satellite_tasking::forecast::{
    ElevationMask, ForecastError, ForecastSettings, OpportunityForecaster, VisibilityPredicate,
    WindowLookup,
};

fn site() -> GroundLocation {
    GroundLocation::new("Site", LocationKind::Station, 0.0, 0.0, 0.0, 10.0)
}

fn sine_forecaster(horizon_s: f64) -> OpportunityForecaster {
    scripted_forecaster(Box::new(SinePredicate { period_s: 100.0 }), horizon_s)
}

fn scripted_forecaster(
    predicate: Box<dyn VisibilityPredicate>,
    horizon_s: f64,
) -> OpportunityForecaster {
    OpportunityForecaster::new(
        Box::new(ClockTrajectory),
        predicate,
        vec![site()],
        ForecastSettings {
            coarse_step_s: 7.0,
            tolerance_s: 0.01,
            horizon_s,
        },
    )
    .expect("valid settings")
}

fn leo_forecaster() -> OpportunityForecaster {
    let epoch = parse_epoch("2024-03-20T12:00:00Z").expect("epoch");
    let ephemeris = SolarEphemeris::new(epoch);
    let orbit = KeplerOrbit::new(
        OrbitalElements {
            semi_major_axis_km: 6878.0,
            eccentricity: 0.0,
            inclination_deg: 0.0,
            raan_deg: 0.0,
            arg_perigee_deg: 0.0,
            mean_anomaly_deg: 0.0,
        },
        ephemeris.gmst_rad(0.0),
    );
    OpportunityForecaster::new(
        Box::new(orbit),
        Box::new(ElevationMask),
        vec![
            site(),
            GroundLocation::new("East", LocationKind::Station, 0.0, 90.0, 0.0, 10.0),
        ],
        ForecastSettings {
            coarse_step_s: 30.0,
            tolerance_s: 0.5,
            horizon_s: 6.0 * 3600.0,
        },
    )
    .expect("valid settings")
}

#[test]
fn boundaries_are_refined_to_tolerance() {
    let forecaster = sine_forecaster(1000.0);
    let windows = forecaster.windows(0, 60.0, 3).expect("windows");
    assert_eq!(windows.len(), 3);
    for (window, expected_open) in windows.iter().zip([100.0, 200.0, 300.0]) {
        assert!(
            approx_eq(window.open_time, expected_open, 0.011),
            "open {} vs {expected_open}",
            window.open_time
        );
        assert!(
            approx_eq(window.close_time, expected_open + 50.0, 0.011),
            "close {} vs {}",
            window.close_time,
            expected_open + 50.0
        );
        assert_eq!(window.location_id, 0);
    }
}

#[test]
fn boundaries_report_the_visible_and_invisible_sides() {
    let forecaster = sine_forecaster(1000.0);
    let predicate = SinePredicate { period_s: 100.0 };
    for window in forecaster.windows(0, 60.0, 4).expect("windows") {
        let at_open = predicate.margin(&[window.open_time, 0.0, 0.0], &site());
        let at_close = predicate.margin(&[window.close_time, 0.0, 0.0], &site());
        assert!(at_open > 0.0);
        assert!(at_close <= 0.0);
    }
}

#[test]
fn window_open_at_query_time_is_left_truncated() {
    let forecaster = sine_forecaster(1000.0);
    let windows = forecaster.windows(0, 10.0, 2).expect("windows");
    assert_eq!(windows[0].open_time, 10.0);
    assert!(approx_eq(windows[0].close_time, 50.0, 0.011));
    assert!(approx_eq(windows[1].open_time, 100.0, 0.011));
}

#[test]
fn window_open_at_horizon_is_right_truncated() {
    let forecaster = sine_forecaster(130.0);
    let windows = forecaster.windows(0, 10.0, 5).expect("windows");
    assert_eq!(windows.len(), 2);
    assert_eq!(windows[1].close_time, 140.0);
}

#[test]
fn never_visible_yields_empty_sequence() {
    let forecaster = scripted_forecaster(Box::new(ConstantPredicate(-1.0)), 1000.0);
    assert!(forecaster.windows(0, 0.0, 5).expect("windows").is_empty());
    assert!(
        forecaster
            .active_window(0, 0.0)
            .expect("lookup")
            .is_none()
    );
}

#[test]
fn always_visible_spans_the_horizon() {
    let forecaster = scripted_forecaster(Box::new(ConstantPredicate(1.0)), 500.0);
    let windows = forecaster.windows(0, 25.0, 3).expect("windows");
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].open_time, 25.0);
    assert_eq!(windows[0].close_time, 525.0);
}

#[test]
fn zero_count_is_always_empty() {
    let forecaster = sine_forecaster(1000.0);
    for t in [0.0, 10.0, 75.0, 123.4, 999.0] {
        assert!(forecaster.windows(0, t, 0).expect("windows").is_empty());
    }
}

#[test]
fn unknown_location_is_an_error() {
    let forecaster = sine_forecaster(1000.0);
    let err = forecaster.windows(3, 0.0, 1).expect_err("unknown location");
    assert!(matches!(err, ForecastError::UnknownLocation { id: 3, known: 1 }));
    assert!(forecaster.active_window(3, 0.0).is_err());
}

#[test]
fn invalid_settings_are_rejected() {
    let result = OpportunityForecaster::new(
        Box::new(ClockTrajectory),
        Box::new(ConstantPredicate(1.0)),
        vec![site()],
        ForecastSettings {
            coarse_step_s: 0.0,
            tolerance_s: 0.5,
            horizon_s: 100.0,
        },
    );
    assert!(matches!(result, Err(ForecastError::InvalidSettings(_))));
}

#[test]
fn active_window_reports_close_time() {
    let forecaster = sine_forecaster(1000.0);
    let window = forecaster
        .active_window(0, 120.0)
        .expect("lookup")
        .expect("open window");
    assert_eq!(window.open_time, 120.0);
    assert!(approx_eq(window.close_time, 150.0, 0.011));
    assert!(forecaster.active_window(0, 170.0).expect("lookup").is_none());
}

#[test]
fn iterator_is_lazy_and_restartable() {
    let forecaster = sine_forecaster(1000.0);
    let first: Vec<_> = forecaster
        .window_iter(0, 60.0)
        .expect("iter")
        .take(2)
        .collect::<Result<_, _>>()
        .expect("windows");
    let again = forecaster.windows(0, 60.0, 2).expect("windows");
    assert_eq!(first, again);
}

#[test]
fn orbital_windows_are_deterministic_ordered_and_disjoint() {
    let forecaster = leo_forecaster();
    for location in 0..forecaster.locations().len() {
        let windows = forecaster.windows(location, 0.0, 10).expect("windows");
        assert!(!windows.is_empty(), "equatorial site must see an equatorial orbit");
        for window in &windows {
            assert!(window.close_time > window.open_time);
            assert!(window.duration() < 1200.0, "LEO pass too long: {window:?}");
        }
        for pair in windows.windows(2) {
            assert!(pair[0].close_time <= pair[1].open_time);
            assert!(pair[0].open_time < pair[1].open_time);
        }
        let repeat = forecaster.windows(location, 0.0, 10).expect("windows");
        assert_eq!(windows, repeat);
    }
}

#[test]
fn next_windows_covers_every_location() {
    let forecaster = leo_forecaster();
    let all = forecaster.next_windows(0.0, 2).expect("windows");
    assert_eq!(all.len(), 2);
    for (id, windows) in all.iter().enumerate() {
        assert!(windows.len() <= 2);
        assert!(windows.iter().all(|w| w.location_id == id));
    }
}
