//! Opportunity forecasting: when does each ground location become visible?

pub mod predicate;
pub mod window;

use tasking_dynamics::{IntegrationError, LocationId};
use thiserror::Error;

pub use predicate::{ElevationMask, Trajectory, VisibilityPredicate};
pub use window::{ForecastSettings, OpportunityForecaster, OpportunityWindow, WindowIter, WindowLookup};

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("unknown location id {id} ({known} locations known)")]
    UnknownLocation { id: LocationId, known: usize },
    #[error("invalid forecast settings: {0}")]
    InvalidSettings(String),
    #[error("trajectory forecast failed: {0}")]
    Trajectory(#[from] IntegrationError),
}
