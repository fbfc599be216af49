//! Collaborator seams consumed by the forecaster.

use tasking_core::vector::Vector3;
use tasking_dynamics::{GroundLocation, IntegrationError, KeplerOrbit};

/// Source of forecast satellite positions.
pub trait Trajectory: Send {
    /// Earth-fixed position (km) at `t_s` seconds after the episode epoch.
    fn position_ecef(&self, t_s: f64) -> Result<Vector3, IntegrationError>;
}

impl Trajectory for KeplerOrbit {
    fn position_ecef(&self, t_s: f64) -> Result<Vector3, IntegrationError> {
        KeplerOrbit::position_ecef(self, t_s)
    }
}

/// Geometry test between the satellite and a ground location.
///
/// The sign of the margin encodes visibility: strictly positive means visible.
pub trait VisibilityPredicate: Send {
    fn margin(&self, position_ecef: &Vector3, location: &GroundLocation) -> f64;
}

/// Elevation above the location's own minimum elevation (deg).
#[derive(Debug, Clone, Copy, Default)]
pub struct ElevationMask;

impl VisibilityPredicate for ElevationMask {
    fn margin(&self, position_ecef: &Vector3, location: &GroundLocation) -> f64 {
        location.elevation_margin_deg(position_ecef)
    }
}
