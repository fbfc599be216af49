#![allow(dead_code)]

use std::f64::consts::TAU;

use satellite_tasking::config::{
    ActionConfig, ActionKindConfig, AttitudeConfig, EnvArgsConfig, EnvConfig, ForecastConfig,
    GroundLocationConfig, InitialStateConfig, LocationKindConfig, MomentumConfig, OrbitConfig,
    ParamSpec, PowerConfig, ResourceConfig, SatelliteConfig, StorageConfig,
};
use satellite_tasking::core::vector::Vector3;
use satellite_tasking::dynamics::{
    ControlMode, Dynamics, GroundLocation, IntegrationError, KeplerOrbit, LocationId, PhysicalState,
    ResourceBounds, ResourceCheck,
};
use satellite_tasking::env::{DynamicsFactory, EpisodeSetup};
use satellite_tasking::forecast::{
    ForecastError, OpportunityWindow, Trajectory, VisibilityPredicate, WindowLookup,
};

pub fn fixed(value: f64) -> ParamSpec {
    ParamSpec::Fixed(value)
}

pub fn action(kind: ActionKindConfig, duration_s: f64) -> ActionConfig {
    ActionConfig {
        kind,
        duration_s,
        locations: Vec::new(),
    }
}

/// Equatorial 500 km circular orbit with quiet wheels and a full action list.
pub fn test_satellite() -> SatelliteConfig {
    SatelliteConfig {
        name: "Test".to_string(),
        orbit: OrbitConfig {
            semi_major_axis_km: fixed(6878.0),
            eccentricity: fixed(0.0),
            inclination_deg: fixed(0.0),
            raan_deg: fixed(0.0),
            arg_perigee_deg: fixed(0.0),
            mean_anomaly_deg: fixed(0.0),
        },
        resources: ResourceConfig {
            data_capacity_mb: 2000.0,
            battery_capacity_wh: 80.0,
            battery_floor_fraction: 0.0,
            max_wheel_speed_rpm: 6000.0,
            attitude_tolerance_deg: 2.0,
        },
        initial: InitialStateConfig {
            stored_data_fraction: fixed(0.1),
            stored_charge_fraction: fixed(0.9),
            wheel_speed_rpm: fixed(0.0),
            pointing_error_deg: fixed(0.0),
        },
        power: PowerConfig {
            panel_power_w: 120.0,
            base_power_w: 20.0,
            instrument_power_w: 30.0,
            transmitter_power_w: 40.0,
            desat_power_w: 15.0,
        },
        storage: StorageConfig {
            imaging_rate_mbit_s: 8.0,
            downlink_rate_mbit_s: 40.0,
        },
        attitude: AttitudeConfig {
            slew_rate_deg_s: 1.0,
        },
        momentum: MomentumConfig {
            disturbance_rpm_s: [0.0; 3],
            desat_rate_rpm_s: 20.0,
        },
        actions: vec![
            action(ActionKindConfig::Drift, 60.0),
            action(ActionKindConfig::Charge, 60.0),
            action(ActionKindConfig::Scan, 60.0),
            action(ActionKindConfig::Downlink, 60.0),
            action(ActionKindConfig::Desaturate, 60.0),
        ],
    }
}

pub fn test_env(time_limit_s: f64) -> EnvConfig {
    EnvConfig {
        sim_rate_s: 1.0,
        time_limit_s,
        max_step_duration_s: None,
        failure_penalty: -1000.0,
        terminate_on_time_limit: false,
        env_args: EnvArgsConfig::default(),
        forecast: ForecastConfig::default(),
    }
}

pub fn equator_station(name: &str, lon_deg: f64) -> GroundLocationConfig {
    GroundLocationConfig {
        name: name.to_string(),
        kind: LocationKindConfig::Station,
        lat_deg: 0.0,
        lon_deg,
        alt_m: 0.0,
        min_elevation_deg: 10.0,
    }
}

pub fn nominal_state() -> PhysicalState {
    PhysicalState {
        position_km: [6878.0, 0.0, 0.0],
        velocity_km_s: [0.0, 7.6, 0.0],
        boresight_eci: [-1.0, 0.0, 0.0],
        pointing_error_deg: 0.0,
        stored_data_fraction: 0.5,
        stored_charge_fraction: 0.5,
        wheel_speeds_rpm: [0.0; 3],
        in_eclipse: false,
        imaging_seconds: 0.0,
        downlinked_mbit: 0.0,
    }
}

pub fn test_bounds() -> ResourceBounds {
    ResourceBounds {
        data_capacity_mb: 2000.0,
        battery_capacity_wh: 80.0,
        battery_floor_fraction: 0.0,
        max_wheel_speed_rpm: 6000.0,
        attitude_tolerance_deg: 2.0,
    }
}

pub const ALL_CHECKS: [ResourceCheck; 4] = [
    ResourceCheck::AttitudeTolerance,
    ResourceCheck::DataCeiling,
    ResourceCheck::WheelCeiling,
    ResourceCheck::PowerFloor,
];

/// Dynamics whose resources change at constant rates; optionally fails after
/// a number of successful propagations.
#[derive(Debug, Clone)]
pub struct LinearDynamics {
    pub mode: ControlMode,
    pub data_rate_per_s: f64,
    pub charge_rate_per_s: f64,
    pub pointing_error_deg: f64,
    pub fail_after: Option<usize>,
    pub calls: usize,
}

impl LinearDynamics {
    pub fn new(data_rate_per_s: f64, charge_rate_per_s: f64) -> Self {
        Self {
            mode: ControlMode::Drift,
            data_rate_per_s,
            charge_rate_per_s,
            pointing_error_deg: 0.0,
            fail_after: None,
            calls: 0,
        }
    }
}

impl Dynamics for LinearDynamics {
    fn set_mode(&mut self, mode: ControlMode) {
        self.mode = mode;
    }

    fn mode(&self) -> ControlMode {
        self.mode
    }

    fn propagate(
        &mut self,
        state: &PhysicalState,
        t_s: f64,
        dt_s: f64,
    ) -> Result<PhysicalState, IntegrationError> {
        if self.fail_after.is_some_and(|limit| self.calls >= limit) {
            return Err(IntegrationError::NonFinite { time_s: t_s + dt_s });
        }
        self.calls += 1;
        let mut next = state.clone();
        next.stored_data_fraction += self.data_rate_per_s * dt_s;
        next.stored_charge_fraction += self.charge_rate_per_s * dt_s;
        next.pointing_error_deg = self.pointing_error_deg;
        if self.mode == ControlMode::NadirScan {
            next.imaging_seconds += dt_s;
        }
        Ok(next)
    }

    fn resource_checks(&self) -> Vec<ResourceCheck> {
        ALL_CHECKS.to_vec()
    }
}

/// Builds [`LinearDynamics`] starting from [`nominal_state`].
#[derive(Debug, Clone)]
pub struct LinearFactory {
    pub dynamics: LinearDynamics,
    pub initial: PhysicalState,
    /// When set, the forecast trajectory fails from this time on.
    pub trajectory_fails_from_s: Option<f64>,
}

impl LinearFactory {
    pub fn new(data_rate_per_s: f64, charge_rate_per_s: f64) -> Self {
        Self {
            dynamics: LinearDynamics::new(data_rate_per_s, charge_rate_per_s),
            initial: nominal_state(),
            trajectory_fails_from_s: None,
        }
    }
}

impl DynamicsFactory for LinearFactory {
    fn build(
        &self,
        _setup: &EpisodeSetup<'_>,
    ) -> Result<(Box<dyn Dynamics>, PhysicalState), IntegrationError> {
        Ok((Box::new(self.dynamics.clone()), self.initial.clone()))
    }

    fn trajectory(&self, setup: &EpisodeSetup<'_>) -> Box<dyn Trajectory> {
        match self.trajectory_fails_from_s {
            Some(fails_from_s) => Box::new(CutoffTrajectory {
                orbit: setup.orbit,
                fails_from_s,
            }),
            None => Box::new(setup.orbit),
        }
    }
}

/// Kepler trajectory that stops producing positions at `fails_from_s`.
pub struct CutoffTrajectory {
    pub orbit: KeplerOrbit,
    pub fails_from_s: f64,
}

impl Trajectory for CutoffTrajectory {
    fn position_ecef(&self, t_s: f64) -> Result<Vector3, IntegrationError> {
        if t_s >= self.fails_from_s {
            return Err(IntegrationError::Collaborator(format!(
                "no ephemeris beyond t = {} s",
                self.fails_from_s
            )));
        }
        self.orbit.position_ecef(t_s)
    }
}

/// Fixed window table standing in for the forecaster.
#[derive(Debug, Clone, Default)]
pub struct ScriptedWindows(pub Vec<OpportunityWindow>);

impl WindowLookup for ScriptedWindows {
    fn active_window(
        &self,
        location: LocationId,
        t_s: f64,
    ) -> Result<Option<OpportunityWindow>, ForecastError> {
        Ok(self
            .0
            .iter()
            .find(|w| w.location_id == location && w.contains(t_s))
            .map(|w| OpportunityWindow {
                location_id: location,
                open_time: t_s,
                close_time: w.close_time,
            }))
    }
}

/// Encodes time in the x coordinate so predicates can be written as functions of time.
pub struct ClockTrajectory;

impl Trajectory for ClockTrajectory {
    fn position_ecef(&self, t_s: f64) -> Result<Vector3, IntegrationError> {
        Ok([t_s, 0.0, 0.0])
    }
}

/// Visible during the first half of every period.
pub struct SinePredicate {
    pub period_s: f64,
}

impl VisibilityPredicate for SinePredicate {
    fn margin(&self, position_ecef: &Vector3, _location: &GroundLocation) -> f64 {
        (TAU * position_ecef[0] / self.period_s).sin()
    }
}

pub struct ConstantPredicate(pub f64);

impl VisibilityPredicate for ConstantPredicate {
    fn margin(&self, _position_ecef: &Vector3, _location: &GroundLocation) -> f64 {
        self.0
    }
}

pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}
