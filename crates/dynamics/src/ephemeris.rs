//! Low-precision sun direction and Earth orientation derived from a UTC epoch.

use chrono::{DateTime, Utc};
use tasking_core::constants::{R_EARTH_KM, SECONDS_PER_DAY};
use tasking_core::time::seconds_to_days;
use tasking_core::units::deg_to_rad;
use tasking_core::vector::{self, Vector3};

/// Unix timestamp of J2000.0 (2000-01-01T12:00:00Z).
const J2000_UNIX_S: i64 = 946_728_000;

/// Sun and Earth-rotation model anchored at an episode's start epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarEphemeris {
    epoch: DateTime<Utc>,
    /// Days from J2000 to the epoch.
    epoch_days: f64,
}

impl SolarEphemeris {
    pub fn new(epoch: DateTime<Utc>) -> Self {
        let seconds = (epoch.timestamp() - J2000_UNIX_S) as f64
            + f64::from(epoch.timestamp_subsec_millis()) / 1_000.0;
        Self {
            epoch,
            epoch_days: seconds / SECONDS_PER_DAY,
        }
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    /// Greenwich mean sidereal angle at `t_s` seconds after the epoch (rad).
    pub fn gmst_rad(&self, t_s: f64) -> f64 {
        let n = self.epoch_days + seconds_to_days(t_s);
        deg_to_rad((280.460_618_37 + 360.985_647_366_29 * n).rem_euclid(360.0))
    }

    /// Unit vector from Earth to the sun in the inertial frame.
    pub fn sun_direction_eci(&self, t_s: f64) -> Vector3 {
        let n = self.epoch_days + seconds_to_days(t_s);
        let mean_longitude = 280.460 + 0.985_647_4 * n;
        let mean_anomaly = deg_to_rad(357.528 + 0.985_600_3 * n);
        let ecliptic_longitude = deg_to_rad(
            mean_longitude + 1.915 * mean_anomaly.sin() + 0.020 * (2.0 * mean_anomaly).sin(),
        );
        let obliquity = deg_to_rad(23.439 - 0.000_000_4 * n);
        let (sin_l, cos_l) = ecliptic_longitude.sin_cos();
        vector::normalize(&[cos_l, obliquity.cos() * sin_l, obliquity.sin() * sin_l])
    }
}

/// Cylindrical Earth-shadow test.
pub fn in_earth_shadow(position_km: &Vector3, sun_dir: &Vector3) -> bool {
    let along = vector::dot(position_km, sun_dir);
    if along >= 0.0 {
        return false;
    }
    let perpendicular = vector::sub(position_km, &vector::scale(sun_dir, along));
    vector::norm(&perpendicular) < R_EARTH_KM
}
