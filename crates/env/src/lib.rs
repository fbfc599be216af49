//! Discrete tasking on top of continuous spacecraft dynamics.
//!
//! [`EpisodeController`] owns one episode at a time. Each `step` hands an action
//! from the [`ActionCatalog`] to the [`ActionScheduler`], which advances the
//! [`StateStore`] in micro-steps while the [`ConstraintMonitor`] watches the
//! resource bounds and the forecaster gates window-dependent actions.

pub mod actions;
pub mod clock;
pub mod constraints;
pub mod episode;
pub mod observation;
pub mod reward;
pub mod sampling;
pub mod scheduler;

use tasking_config::ConfigError;
use tasking_dynamics::IntegrationError;
use tasking_forecast::ForecastError;
use thiserror::Error;

pub use actions::{ActionCatalog, ActionKind, ActionSpec, Gating};
pub use clock::{Snapshot, StateStore};
pub use constraints::{ConstraintMonitor, ConstraintVerdict, HardViolation, SoftViolation};
pub use episode::{
    DynamicsFactory, EpisodeController, EpisodeSetup, EpisodeState, ReferenceDynamics, StepInfo,
    StepOutcome, TerminationReason,
};
pub use observation::{ObservationBuilder, StandardObservation, StepView, TimeObservation};
pub use reward::{ImagingTimeReward, NoReward, RewardModel};
pub use sampling::{EpisodeParams, ParamSampler, draw_episode_params, parse_epoch};
pub use scheduler::{ActionResult, ActionScheduler, MicroStep};

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("action id {id} is out of range (catalog has {catalog_len} actions)")]
    InvalidAction { id: usize, catalog_len: usize },
    #[error("episode has ended; reset before stepping again")]
    EpisodeAlreadyEnded,
    #[error("episode has not been reset")]
    NotReset,
    #[error("integration failed: {0}")]
    Integration(#[from] IntegrationError),
    #[error("forecast failed: {0}")]
    Forecast(#[from] ForecastError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid sampled parameter `{field}`: {reason}")]
    Sampling { field: &'static str, reason: String },
    #[error("unknown ground location `{0}`")]
    UnknownLocation(String),
    #[error("action catalog is empty")]
    EmptyCatalog,
}
