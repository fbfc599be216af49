//! Continuous physical state, immutable resource bounds and control modes.

use serde::Serialize;
use tasking_config::ResourceConfig;
use tasking_core::vector::{self, Vector3};

/// Continuous spacecraft state advanced between micro-steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysicalState {
    /// Inertial position (km).
    pub position_km: Vector3,
    /// Inertial velocity (km/s).
    pub velocity_km_s: Vector3,
    /// Unit boresight direction in the inertial frame. Panels and instrument share it.
    pub boresight_eci: Vector3,
    /// Angle between boresight and the active mode's pointing target (deg).
    pub pointing_error_deg: f64,
    pub stored_data_fraction: f64,
    pub stored_charge_fraction: f64,
    pub wheel_speeds_rpm: [f64; 3],
    pub in_eclipse: bool,
    /// Seconds spent imaging with the attitude inside tolerance, since reset.
    pub imaging_seconds: f64,
    /// Data transmitted to ground since reset (Mbit).
    pub downlinked_mbit: f64,
}

impl PhysicalState {
    /// Largest absolute wheel speed across axes.
    pub fn max_wheel_speed_rpm(&self) -> f64 {
        self.wheel_speeds_rpm
            .iter()
            .fold(0.0_f64, |acc, w| acc.max(w.abs()))
    }

    /// Whether every continuous quantity is finite.
    pub fn is_finite(&self) -> bool {
        vector::is_finite(&self.position_km)
            && vector::is_finite(&self.velocity_km_s)
            && vector::is_finite(&self.boresight_eci)
            && self.pointing_error_deg.is_finite()
            && self.stored_data_fraction.is_finite()
            && self.stored_charge_fraction.is_finite()
            && self.wheel_speeds_rpm.iter().all(|w| w.is_finite())
    }
}

/// Resource limits fixed at satellite construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResourceBounds {
    pub data_capacity_mb: f64,
    pub battery_capacity_wh: f64,
    pub battery_floor_fraction: f64,
    pub max_wheel_speed_rpm: f64,
    pub attitude_tolerance_deg: f64,
}

impl From<&ResourceConfig> for ResourceBounds {
    fn from(config: &ResourceConfig) -> Self {
        Self {
            data_capacity_mb: config.data_capacity_mb,
            battery_capacity_wh: config.battery_capacity_wh,
            battery_floor_fraction: config.battery_floor_fraction,
            max_wheel_speed_rpm: config.max_wheel_speed_rpm,
            attitude_tolerance_deg: config.attitude_tolerance_deg,
        }
    }
}

/// Underlying flight software modes an action can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    /// Hold the current inertial attitude.
    Drift,
    /// Point panels at the sun.
    SunPoint,
    /// Point the instrument at nadir and record.
    NadirScan,
    /// Point at the best visible ground station and transmit.
    GroundLink,
    /// Hold attitude and dump wheel momentum.
    Desaturate,
}

impl ControlMode {
    /// Modes whose payload only works with the attitude inside tolerance.
    pub fn requires_accurate_pointing(self) -> bool {
        matches!(self, ControlMode::NadirScan | ControlMode::GroundLink)
    }
}

/// Resource bound a capability asks the constraint monitor to enforce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceCheck {
    /// The orbit radius must stay above the Earth's equatorial radius.
    AltitudeFloor,
    DataCeiling,
    PowerFloor,
    WheelCeiling,
    AttitudeTolerance,
}

/// Failure reported by a dynamics collaborator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrationError {
    #[error("Kepler solver did not converge (mean anomaly {mean_anomaly_rad} rad)")]
    KeplerDivergence { mean_anomaly_rad: f64 },
    #[error("state became non-finite at t = {time_s} s")]
    NonFinite { time_s: f64 },
    #[error("invalid integration step {dt_s} s")]
    InvalidStep { dt_s: f64 },
    #[error("dynamics collaborator failed: {0}")]
    Collaborator(String),
}
