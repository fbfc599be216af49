mod common;

use common::{
    LinearFactory, action, approx_eq, equator_station, fixed, test_env, test_satellite,
};
use satellite_tasking::config::{ActionKindConfig, Distribution, EpochSpec, ParamSpec};
use satellite_tasking::env::{
    EnvError, EpisodeController, HardViolation, NoReward, TerminationReason, TimeObservation,
};
use satellite_tasking::forecast::ForecastError;

fn linear_controller(
    time_limit_s: f64,
    durations: &[f64],
    factory: LinearFactory,
) -> EpisodeController {
    let mut satellite = test_satellite();
    satellite.actions = durations
        .iter()
        .map(|d| action(ActionKindConfig::Drift, *d))
        .collect();
    EpisodeController::new(satellite, test_env(time_limit_s), &[])
        .expect("controller")
        .with_dynamics_factory(Box::new(factory))
        .with_reward(Box::new(NoReward))
}

#[test]
fn step_before_reset_is_rejected() {
    let mut controller = linear_controller(100.0, &[10.0], LinearFactory::new(0.0, 0.0));
    assert!(matches!(controller.step(0), Err(EnvError::NotReset)));
}

#[test]
fn invalid_action_leaves_state_unchanged() {
    let mut controller = linear_controller(100.0, &[10.0, 20.0], LinearFactory::new(0.0, 0.0));
    controller.reset(1).expect("reset");
    controller.step(1).expect("step");
    let before_state = controller.episode_state().cloned();
    let before_snapshot = controller.snapshot();

    let err = controller.step(2).expect_err("out of range");
    assert!(matches!(
        err,
        EnvError::InvalidAction {
            id: 2,
            catalog_len: 2
        }
    ));
    assert_eq!(controller.episode_state().cloned(), before_state);
    assert_eq!(controller.snapshot(), before_snapshot);
}

#[test]
fn truncation_stops_at_the_time_limit() {
    let mut controller = linear_controller(150.0, &[100.0], LinearFactory::new(0.0, 0.0));
    controller.reset(0).expect("reset");

    let first = controller.step(0).expect("first step");
    assert_eq!(first.info.d_ts, 100.0);
    assert!(!first.truncated && !first.terminated);

    let second = controller.step(0).expect("second step");
    assert!(second.truncated);
    assert!(!second.terminated);
    assert!(approx_eq(second.info.d_ts, 150.0 - 100.0, 1e-9));
    assert!(approx_eq(second.info.sim_time, 150.0, 1e-9));
    assert!(second.info.action.time_limit_reached);
    assert_eq!(
        second.info.termination_reason,
        Some(TerminationReason::TimeLimit)
    );

    assert!(matches!(
        controller.step(0),
        Err(EnvError::EpisodeAlreadyEnded)
    ));
}

#[test]
fn uneven_micro_steps_still_truncate_at_the_limit() {
    let mut env = test_env(5000.0);
    env.sim_rate_s = 0.3;
    let mut satellite = test_satellite();
    satellite.actions = vec![action(ActionKindConfig::Drift, 13.7)];
    let mut controller = EpisodeController::new(satellite, env, &[])
        .expect("controller")
        .with_dynamics_factory(Box::new(LinearFactory::new(0.0, 0.0)))
        .with_reward(Box::new(NoReward));
    controller.reset(0).expect("reset");

    let mut steps = 0;
    let last = loop {
        let outcome = controller.step(0).expect("step");
        steps += 1;
        assert!(steps < 400, "episode never reached its limit");
        if outcome.truncated || outcome.terminated {
            break outcome;
        }
        assert!(outcome.info.d_ts > 0.0, "zero-length step at t = {}", outcome.info.sim_time);
    };
    assert!(last.truncated);
    assert!(!last.terminated);
    assert_eq!(last.info.termination_reason, Some(TerminationReason::TimeLimit));
    assert!(approx_eq(last.info.sim_time, 5000.0, 1e-6));
    let state = controller.episode_state().expect("episode");
    assert_eq!(state.elapsed_s, state.sim_time_s);
}

#[test]
fn time_limit_can_terminate_instead_of_truncate() {
    let mut satellite = test_satellite();
    satellite.actions = vec![action(ActionKindConfig::Drift, 100.0)];
    let mut env = test_env(50.0);
    env.terminate_on_time_limit = true;
    let mut controller = EpisodeController::new(satellite, env, &[])
        .expect("controller")
        .with_dynamics_factory(Box::new(LinearFactory::new(0.0, 0.0)));
    controller.reset(0).expect("reset");
    let outcome = controller.step(0).expect("step");
    assert!(outcome.terminated);
    assert!(!outcome.truncated);
}

#[test]
fn hard_violation_terminates_with_penalty() {
    // 0.5 charge drained at 1/64 per second empties the battery after 32 s.
    let mut controller = linear_controller(1000.0, &[100.0], LinearFactory::new(0.0, -0.015625));
    controller.reset(0).expect("reset");
    let outcome = controller.step(0).expect("step");
    assert!(outcome.terminated);
    assert!(!outcome.truncated);
    assert_eq!(outcome.reward, -1000.0);
    assert_eq!(outcome.info.action.violation, Some(HardViolation::PowerDepleted));
    assert_eq!(outcome.info.d_ts, 32.0);
    assert_eq!(
        outcome.info.termination_reason,
        Some(TerminationReason::HardViolation(HardViolation::PowerDepleted))
    );
    assert!(matches!(
        controller.step(0),
        Err(EnvError::EpisodeAlreadyEnded)
    ));
}

#[test]
fn orbit_below_the_surface_terminates_with_penalty() {
    let mut satellite = test_satellite();
    satellite.orbit.semi_major_axis_km = fixed(5000.0);
    let mut controller =
        EpisodeController::new(satellite, test_env(1000.0), &[]).expect("controller");
    controller.reset(0).expect("reset");

    let outcome = controller.step(0).expect("drift");
    assert!(outcome.terminated);
    assert!(!outcome.truncated);
    assert_eq!(outcome.reward, -1000.0);
    assert_eq!(outcome.info.d_ts, 1.0);
    assert_eq!(
        outcome.info.termination_reason,
        Some(TerminationReason::HardViolation(HardViolation::Deorbited))
    );
}

#[test]
fn integration_failure_ends_the_episode() {
    let mut factory = LinearFactory::new(0.0, 0.0);
    factory.dynamics.fail_after = Some(15);
    let mut controller = linear_controller(1000.0, &[10.0], factory);
    controller.reset(0).expect("reset");
    controller.step(0).expect("first step");

    let err = controller.step(0).expect_err("integration failure");
    assert!(matches!(err, EnvError::Integration(_)));
    let state = controller.episode_state().expect("episode");
    assert!(state.terminal);
    assert_eq!(
        state.termination_reason,
        Some(TerminationReason::IntegrationFailure)
    );
    assert_eq!(state.sim_time_s, 15.0);
    assert!(matches!(
        controller.step(0),
        Err(EnvError::EpisodeAlreadyEnded)
    ));

    controller.reset(0).expect("reset after failure");
    assert!(!controller.episode_state().expect("episode").terminal);
}

#[test]
fn forecast_failure_after_a_step_ends_the_episode() {
    let mut factory = LinearFactory::new(0.0, 0.0);
    factory.trajectory_fails_from_s = Some(40.0);
    let mut satellite = test_satellite();
    satellite.actions = vec![action(ActionKindConfig::Drift, 60.0)];
    let mut env = test_env(1000.0);
    env.forecast.horizon_s = 20.0;
    env.forecast.coarse_step_s = 5.0;
    let mut controller = EpisodeController::new(satellite, env, &[equator_station("Site", 0.0)])
        .expect("controller")
        .with_dynamics_factory(Box::new(factory))
        .with_reward(Box::new(NoReward));
    // The reset forecast only reaches t = 20 s.
    controller.reset(0).expect("reset");

    let err = controller.step(0).expect_err("forecast failure");
    assert!(matches!(err, EnvError::Forecast(ForecastError::Trajectory(_))));
    let state = controller.episode_state().expect("episode");
    assert!(state.terminal);
    assert_eq!(
        state.termination_reason,
        Some(TerminationReason::IntegrationFailure)
    );
    assert_eq!(state.sim_time_s, 60.0);
    assert_eq!(state.step_count, 0);
    assert!(matches!(
        controller.step(0),
        Err(EnvError::EpisodeAlreadyEnded)
    ));
}

#[test]
fn reset_with_same_seed_reproduces_parameters() {
    let mut satellite = test_satellite();
    satellite.orbit.raan_deg = ParamSpec::Sampled(Distribution::Uniform {
        low: 0.0,
        high: 360.0,
    });
    satellite.initial.stored_charge_fraction = ParamSpec::Sampled(Distribution::Uniform {
        low: 0.4,
        high: 0.9,
    });
    satellite.initial.wheel_speed_rpm = ParamSpec::Sampled(Distribution::Choice {
        values: vec![-500.0, 0.0, 500.0],
    });
    let mut env = test_env(1000.0);
    env.env_args.utc_init = EpochSpec::Choice {
        choices: vec![
            "2024-03-20T12:00:00Z".to_string(),
            "2024-06-21T00:00:00Z".to_string(),
        ],
    };
    let mut controller = EpisodeController::new(satellite, env, &[]).expect("controller");

    controller.reset(42).expect("reset");
    let first = controller.params().cloned().expect("params");
    let first_obs = controller.reset(42).expect("reset");
    let second = controller.params().cloned().expect("params");
    assert_eq!(first, second);
    assert_eq!(controller.reset(42).expect("reset"), first_obs);

    controller.reset(43).expect("reset");
    let other = controller.params().cloned().expect("params");
    assert_ne!(first.elements.raan_deg, other.elements.raan_deg);

    assert!((0.0..=360.0).contains(&first.elements.raan_deg));
    assert!((0.4..=0.9).contains(&first.initial.stored_charge_fraction));
    assert!([-500.0, 0.0, 500.0].contains(&first.initial.wheel_speeds_rpm[0]));
    assert_eq!(first.elements.inclination_deg, 0.0);
}

#[test]
fn invalid_sampled_fraction_fails_reset() {
    let mut satellite = test_satellite();
    satellite.initial.stored_data_fraction = fixed(1.5);
    let mut controller = EpisodeController::new(satellite, test_env(100.0), &[]).expect("controller");
    assert!(matches!(
        controller.reset(0),
        Err(EnvError::Sampling {
            field: "initial.stored_data_fraction",
            ..
        })
    ));
}

#[test]
fn unknown_gating_location_is_rejected() {
    let mut satellite = test_satellite();
    satellite.actions[3].locations = vec!["Nowhere".to_string()];
    let result = EpisodeController::new(satellite, test_env(100.0), &[equator_station("Site", 0.0)]);
    assert!(matches!(result, Err(EnvError::UnknownLocation(name)) if name == "Nowhere"));
}

#[test]
fn step_info_carries_upcoming_windows() {
    let locations = [equator_station("Site", 0.0), equator_station("East", 90.0)];
    let mut controller =
        EpisodeController::new(test_satellite(), test_env(3600.0), &locations).expect("controller");
    let first_obs = controller.reset(7).expect("reset");
    // Six state entries plus one (open, close) pair per location.
    assert_eq!(first_obs.len(), 6 + 2 * locations.len());

    let outcome = controller.step(0).expect("drift");
    assert_eq!(outcome.info.d_ts, 60.0);
    assert_eq!(outcome.info.sim_time, 60.0);
    assert_eq!(outcome.info.upcoming_windows.len(), locations.len());
    for (id, windows) in outcome.info.upcoming_windows.iter().enumerate() {
        assert!(windows.len() <= 1);
        assert!(windows.iter().all(|w| w.location_id == id && w.close_time > 60.0));
    }
    assert_eq!(outcome.observation.len(), first_obs.len());
    assert_eq!(outcome.observation[0], 60.0 / 3600.0);

    let state = controller.episode_state().expect("episode");
    assert_eq!(state.step_count, 1);
    assert_eq!(state.last_action, Some(0));
    assert_eq!(state.last_step_duration_s, 60.0);
}

#[test]
fn observation_builder_is_replaceable() {
    let mut controller = EpisodeController::new(test_satellite(), test_env(600.0), &[])
        .expect("controller")
        .with_observation(Box::new(TimeObservation));
    assert_eq!(controller.reset(0).expect("reset"), vec![0.0]);
    let outcome = controller.step(1).expect("charge");
    assert_eq!(outcome.observation, vec![0.1]);
}
