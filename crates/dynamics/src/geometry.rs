//! Fixed ground locations and topocentric geometry.

use serde::Serialize;
use tasking_config::{GroundLocationConfig, LocationKindConfig};
use tasking_core::constants::{EARTH_FLATTENING, R_EARTH_KM};
use tasking_core::units::{deg_to_rad, m_to_km, rad_to_deg};
use tasking_core::vector::{self, Vector3};

/// Index of a location in the episode's ground catalog.
pub type LocationId = usize;

/// Whether a location receives downlinks or is an imaging target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Station,
    Target,
}

/// A fixed point on the WGS-84 ellipsoid with an elevation mask.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroundLocation {
    pub name: String,
    pub kind: LocationKind,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_m: f64,
    pub min_elevation_deg: f64,
    ecef_km: Vector3,
}

impl GroundLocation {
    pub fn new(
        name: impl Into<String>,
        kind: LocationKind,
        lat_deg: f64,
        lon_deg: f64,
        alt_m: f64,
        min_elevation_deg: f64,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            lat_deg,
            lon_deg,
            alt_m,
            min_elevation_deg,
            ecef_km: geodetic_to_ecef(lat_deg, lon_deg, alt_m),
        }
    }

    /// Earth-fixed position (km).
    pub fn ecef_km(&self) -> Vector3 {
        self.ecef_km
    }

    /// Elevation of `sat_ecef` above the local horizon (deg).
    pub fn elevation_deg(&self, sat_ecef: &Vector3) -> f64 {
        let range = vector::sub(sat_ecef, &self.ecef_km);
        let lat = deg_to_rad(self.lat_deg);
        let lon = deg_to_rad(self.lon_deg);
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();

        let east = -sin_lon * range[0] + cos_lon * range[1];
        let north = -sin_lat * cos_lon * range[0] - sin_lat * sin_lon * range[1] + cos_lat * range[2];
        let up = cos_lat * cos_lon * range[0] + cos_lat * sin_lon * range[1] + sin_lat * range[2];

        rad_to_deg(up.atan2((east * east + north * north).sqrt()))
    }

    /// Elevation above this location's mask (deg); positive means visible.
    pub fn elevation_margin_deg(&self, sat_ecef: &Vector3) -> f64 {
        self.elevation_deg(sat_ecef) - self.min_elevation_deg
    }
}

impl From<&GroundLocationConfig> for GroundLocation {
    fn from(config: &GroundLocationConfig) -> Self {
        let kind = match config.kind {
            LocationKindConfig::Station => LocationKind::Station,
            LocationKindConfig::Target => LocationKind::Target,
        };
        GroundLocation::new(
            config.name.clone(),
            kind,
            config.lat_deg,
            config.lon_deg,
            config.alt_m,
            config.min_elevation_deg,
        )
    }
}

fn geodetic_to_ecef(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Vector3 {
    let lat = deg_to_rad(lat_deg);
    let lon = deg_to_rad(lon_deg);
    let alt_km = m_to_km(alt_m);
    let e2 = 2.0 * EARTH_FLATTENING - EARTH_FLATTENING * EARTH_FLATTENING;
    let (sin_lat, cos_lat) = lat.sin_cos();
    let n = R_EARTH_KM / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    [
        (n + alt_km) * cos_lat * lon.cos(),
        (n + alt_km) * cos_lat * lon.sin(),
        (n * (1.0 - e2) + alt_km) * sin_lat,
    ]
}
