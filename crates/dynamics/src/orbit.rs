//! Two-body Keplerian orbit propagation.

use std::f64::consts::TAU;

use serde::Serialize;
use tasking_core::constants::{MU_EARTH_KM3_S2, OMEGA_EARTH_RAD_S};
use tasking_core::units::deg_to_rad;
use tasking_core::vector::Vector3;

use crate::state::IntegrationError;

const KEPLER_MAX_ITERATIONS: usize = 50;
const KEPLER_TOLERANCE: f64 = 1e-12;

/// Classical orbital elements at the episode epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrbitalElements {
    pub semi_major_axis_km: f64,
    pub eccentricity: f64,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub arg_perigee_deg: f64,
    pub mean_anomaly_deg: f64,
}

impl OrbitalElements {
    /// Orbital period in seconds.
    pub fn period_s(&self) -> f64 {
        let a = self.semi_major_axis_km;
        TAU * (a * a * a / MU_EARTH_KM3_S2).sqrt()
    }

    /// Mean motion (rad/s).
    pub fn mean_motion_rad_s(&self) -> f64 {
        let a = self.semi_major_axis_km;
        (MU_EARTH_KM3_S2 / (a * a * a)).sqrt()
    }
}

/// Inertial position/velocity pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    pub position_km: Vector3,
    pub velocity_km_s: Vector3,
}

/// Analytic orbit together with the Earth orientation at the epoch.
///
/// Time arguments are seconds since the episode epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeplerOrbit {
    pub elements: OrbitalElements,
    /// Greenwich sidereal angle at the epoch (rad).
    pub gmst0_rad: f64,
}

impl KeplerOrbit {
    pub fn new(elements: OrbitalElements, gmst0_rad: f64) -> Self {
        Self {
            elements,
            gmst0_rad,
        }
    }

    /// Inertial state at `t_s` seconds after the epoch.
    pub fn state_eci(&self, t_s: f64) -> Result<OrbitState, IntegrationError> {
        let el = &self.elements;
        let a = el.semi_major_axis_km;
        let e = el.eccentricity;

        let mean_anomaly = (deg_to_rad(el.mean_anomaly_deg) + el.mean_motion_rad_s() * t_s) % TAU;
        let ecc_anom = solve_kepler(mean_anomaly, e)?;

        let (sin_e, cos_e) = ecc_anom.sin_cos();
        let nu = ((1.0 - e * e).sqrt() * sin_e).atan2(cos_e - e);
        let p = a * (1.0 - e * e);
        let r = a * (1.0 - e * cos_e);

        let (sin_nu, cos_nu) = nu.sin_cos();
        let r_pf = [r * cos_nu, r * sin_nu, 0.0];
        let v_scale = (MU_EARTH_KM3_S2 / p).sqrt();
        let v_pf = [-v_scale * sin_nu, v_scale * (e + cos_nu), 0.0];

        let q = perifocal_to_eci(
            deg_to_rad(el.raan_deg),
            deg_to_rad(el.inclination_deg),
            deg_to_rad(el.arg_perigee_deg),
        );
        Ok(OrbitState {
            position_km: mat_vec(&q, &r_pf),
            velocity_km_s: mat_vec(&q, &v_pf),
        })
    }

    /// Earth-fixed position at `t_s`.
    pub fn position_ecef(&self, t_s: f64) -> Result<Vector3, IntegrationError> {
        let state = self.state_eci(t_s)?;
        Ok(eci_to_ecef(&state.position_km, self.earth_rotation_rad(t_s)))
    }

    /// Earth rotation angle at `t_s`.
    pub fn earth_rotation_rad(&self, t_s: f64) -> f64 {
        self.gmst0_rad + OMEGA_EARTH_RAD_S * t_s
    }
}

/// Rotate an inertial vector into the Earth-fixed frame.
pub fn eci_to_ecef(v: &Vector3, theta_rad: f64) -> Vector3 {
    let (sin_t, cos_t) = theta_rad.sin_cos();
    [
        v[0] * cos_t + v[1] * sin_t,
        -v[0] * sin_t + v[1] * cos_t,
        v[2],
    ]
}

/// Rotate an Earth-fixed vector into the inertial frame.
pub fn ecef_to_eci(v: &Vector3, theta_rad: f64) -> Vector3 {
    eci_to_ecef(v, -theta_rad)
}

fn solve_kepler(mean_anomaly: f64, e: f64) -> Result<f64, IntegrationError> {
    let mut ecc_anom = if e > 0.8 { std::f64::consts::PI } else { mean_anomaly };
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let delta = (ecc_anom - e * ecc_anom.sin() - mean_anomaly) / (1.0 - e * ecc_anom.cos());
        ecc_anom -= delta;
        if delta.abs() < KEPLER_TOLERANCE {
            return Ok(ecc_anom);
        }
    }
    Err(IntegrationError::KeplerDivergence {
        mean_anomaly_rad: mean_anomaly,
    })
}

fn perifocal_to_eci(raan: f64, inc: f64, argp: f64) -> [[f64; 3]; 3] {
    let (so, co) = raan.sin_cos();
    let (si, ci) = inc.sin_cos();
    let (sw, cw) = argp.sin_cos();
    [
        [co * cw - so * sw * ci, -co * sw - so * cw * ci, so * si],
        [so * cw + co * sw * ci, -so * sw + co * cw * ci, -co * si],
        [sw * si, cw * si, ci],
    ]
}

fn mat_vec(m: &[[f64; 3]; 3], v: &Vector3) -> Vector3 {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}
