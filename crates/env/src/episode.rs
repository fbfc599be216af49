//! Episode lifecycle: reset, step, termination and truncation.

use serde::Serialize;
use tasking_config::{EnvConfig, GroundLocationConfig, SatelliteConfig};
use tasking_core::time::reached;
use tasking_dynamics::{
    Dynamics, GroundLocation, IntegrationError, KeplerOrbit, LocationKind, PhysicalState,
    ResourceBounds, SolarEphemeris, SpacecraftModel,
};
use tasking_forecast::{
    ElevationMask, ForecastError, ForecastSettings, OpportunityForecaster, OpportunityWindow,
    Trajectory,
};

use crate::EnvError;
use crate::actions::ActionCatalog;
use crate::clock::{Snapshot, StateStore};
use crate::constraints::{ConstraintMonitor, HardViolation};
use crate::observation::{ObservationBuilder, StandardObservation, StepView};
use crate::reward::{ImagingTimeReward, RewardModel};
use crate::sampling::{EpisodeParams, draw_episode_params};
use crate::scheduler::{ActionResult, ActionScheduler, MicroStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    HardViolation(HardViolation),
    TimeLimit,
    IntegrationFailure,
}

/// Episode bookkeeping, mutated once per step.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EpisodeState {
    pub sim_time_s: f64,
    pub elapsed_s: f64,
    pub terminal: bool,
    pub truncated: bool,
    pub last_action: Option<usize>,
    pub termination_reason: Option<TerminationReason>,
    pub step_count: u64,
    pub last_step_duration_s: f64,
}

impl EpisodeState {
    pub fn is_over(&self) -> bool {
        self.terminal || self.truncated
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepInfo {
    /// Simulated seconds spent in this step.
    pub d_ts: f64,
    pub sim_time: f64,
    pub action: ActionResult,
    pub termination_reason: Option<TerminationReason>,
    /// Next windows per location, indexed by location id.
    pub upcoming_windows: Vec<Vec<OpportunityWindow>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub observation: Vec<f64>,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

/// Inputs available when building the dynamics for a new episode.
#[derive(Debug, Clone, Copy)]
pub struct EpisodeSetup<'a> {
    pub satellite: &'a SatelliteConfig,
    pub params: &'a EpisodeParams,
    pub orbit: KeplerOrbit,
    pub ephemeris: SolarEphemeris,
    pub locations: &'a [GroundLocation],
}

/// Builds the dynamics collaborator and its initial state at every reset.
pub trait DynamicsFactory: Send {
    fn build(
        &self,
        setup: &EpisodeSetup<'_>,
    ) -> Result<(Box<dyn Dynamics>, PhysicalState), IntegrationError>;

    /// Trajectory the forecaster samples. Defaults to the episode's Kepler orbit.
    fn trajectory(&self, setup: &EpisodeSetup<'_>) -> Box<dyn Trajectory> {
        Box::new(setup.orbit)
    }
}

/// Builds the reduced-order [`SpacecraftModel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceDynamics;

impl DynamicsFactory for ReferenceDynamics {
    fn build(
        &self,
        setup: &EpisodeSetup<'_>,
    ) -> Result<(Box<dyn Dynamics>, PhysicalState), IntegrationError> {
        let stations = setup
            .locations
            .iter()
            .filter(|loc| loc.kind == LocationKind::Station)
            .cloned()
            .collect();
        let model =
            SpacecraftModel::from_config(setup.satellite, setup.orbit, setup.ephemeris, stations);
        let initial = model.initial_state(&setup.params.initial)?;
        Ok((Box::new(model), initial))
    }
}

struct ActiveEpisode {
    params: EpisodeParams,
    store: StateStore,
    monitor: ConstraintMonitor,
    forecaster: OpportunityForecaster,
    bounds: ResourceBounds,
    state: EpisodeState,
}

/// Drives episodes of one satellite over a fixed ground catalog.
pub struct EpisodeController {
    satellite: SatelliteConfig,
    env: EnvConfig,
    locations: Vec<GroundLocation>,
    catalog: ActionCatalog,
    scheduler: ActionScheduler,
    factory: Box<dyn DynamicsFactory>,
    observer: Box<dyn ObservationBuilder>,
    reward: Box<dyn RewardModel>,
    episode: Option<ActiveEpisode>,
}

impl EpisodeController {
    pub fn new(
        satellite: SatelliteConfig,
        env: EnvConfig,
        locations: &[GroundLocationConfig],
    ) -> Result<Self, EnvError> {
        satellite.validate()?;
        env.validate()?;
        let locations: Vec<GroundLocation> = locations.iter().map(GroundLocation::from).collect();
        let catalog = ActionCatalog::from_config(&satellite.actions, &locations)?;
        let scheduler =
            ActionScheduler::new(env.sim_rate_s, env.time_limit_s, env.max_step_duration_s);
        Ok(Self {
            satellite,
            env,
            locations,
            catalog,
            scheduler,
            factory: Box::new(ReferenceDynamics),
            observer: Box::new(StandardObservation),
            reward: Box::new(ImagingTimeReward::default()),
            episode: None,
        })
    }

    pub fn with_dynamics_factory(mut self, factory: Box<dyn DynamicsFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_observation(mut self, observer: Box<dyn ObservationBuilder>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_reward(mut self, reward: Box<dyn RewardModel>) -> Self {
        self.reward = reward;
        self
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn locations(&self) -> &[GroundLocation] {
        &self.locations
    }

    pub fn satellite(&self) -> &SatelliteConfig {
        &self.satellite
    }

    pub fn env_config(&self) -> &EnvConfig {
        &self.env
    }

    pub fn episode_state(&self) -> Option<&EpisodeState> {
        self.episode.as_ref().map(|episode| &episode.state)
    }

    pub fn params(&self) -> Option<&EpisodeParams> {
        self.episode.as_ref().map(|episode| &episode.params)
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.episode.as_ref().map(|episode| episode.store.snapshot())
    }

    pub fn bounds(&self) -> Option<&ResourceBounds> {
        self.episode.as_ref().map(|episode| &episode.bounds)
    }

    pub fn forecaster(&self) -> Option<&OpportunityForecaster> {
        self.episode.as_ref().map(|episode| &episode.forecaster)
    }

    /// Start a new episode and return its first observation.
    pub fn reset(&mut self, seed: u64) -> Result<Vec<f64>, EnvError> {
        let params = draw_episode_params(&self.satellite, &self.env, seed)?;
        let ephemeris = SolarEphemeris::new(params.epoch);
        let orbit = KeplerOrbit::new(params.elements, ephemeris.gmst_rad(0.0));
        let setup = EpisodeSetup {
            satellite: &self.satellite,
            params: &params,
            orbit,
            ephemeris,
            locations: &self.locations,
        };
        let (dynamics, initial) = self.factory.build(&setup)?;
        let trajectory = self.factory.trajectory(&setup);
        let store = StateStore::new(dynamics, initial);
        let monitor = ConstraintMonitor::new(store.resource_checks());
        let forecaster = OpportunityForecaster::new(
            trajectory,
            Box::new(ElevationMask),
            self.locations.clone(),
            ForecastSettings::from(&self.env.forecast),
        )?;
        log::info!(
            "reset {} with seed {seed}: epoch {}, period {:.0} s",
            self.satellite.name,
            params.epoch.format("%Y-%m-%dT%H:%M:%SZ"),
            params.elements.period_s()
        );

        self.reward.reset();
        let episode = self.episode.insert(ActiveEpisode {
            params,
            store,
            monitor,
            forecaster,
            bounds: ResourceBounds::from(&self.satellite.resources),
            state: EpisodeState::default(),
        });
        let windows = episode
            .forecaster
            .next_windows(0.0, self.env.forecast.windows_per_location)?;
        Ok(observe(
            self.observer.as_ref(),
            episode,
            &windows,
            &self.env,
        ))
    }

    pub fn step(&mut self, action_id: usize) -> Result<StepOutcome, EnvError> {
        self.step_with(action_id, |_| {})
    }

    /// Run one action, reporting every micro-step to `on_micro_step`.
    pub fn step_with<F>(&mut self, action_id: usize, on_micro_step: F) -> Result<StepOutcome, EnvError>
    where
        F: FnMut(&MicroStep<'_>),
    {
        let episode = self.episode.as_mut().ok_or(EnvError::NotReset)?;
        if episode.state.is_over() {
            return Err(EnvError::EpisodeAlreadyEnded);
        }
        let spec = self
            .catalog
            .get(action_id)
            .ok_or(EnvError::InvalidAction {
                id: action_id,
                catalog_len: self.catalog.len(),
            })?;

        let before = episode.store.snapshot();
        let run = self.scheduler.run_with(
            spec,
            &mut episode.store,
            &episode.monitor,
            &episode.bounds,
            &episode.forecaster,
            on_micro_step,
        );
        let run = run.and_then(|result| {
            let windows = episode.forecaster.next_windows(
                episode.store.time_s(),
                self.env.forecast.windows_per_location,
            )?;
            Ok((result, windows))
        });
        let (result, windows) = match run {
            Ok(run) => run,
            Err(err) => {
                if matches!(
                    err,
                    EnvError::Integration(_) | EnvError::Forecast(ForecastError::Trajectory(_))
                ) {
                    let state = &mut episode.state;
                    state.sim_time_s = episode.store.time_s();
                    state.elapsed_s = state.sim_time_s;
                    state.terminal = true;
                    state.termination_reason = Some(TerminationReason::IntegrationFailure);
                    log::error!("episode aborted at t = {:.1} s: {err}", state.sim_time_s);
                }
                return Err(err);
            }
        };

        let state = &mut episode.state;
        state.sim_time_s = episode.store.time_s();
        // The store clock starts at zero, so it is the elapsed time.
        state.elapsed_s = state.sim_time_s;
        state.step_count += 1;
        state.last_action = Some(action_id);
        state.last_step_duration_s = result.elapsed_time;
        if let Some(violation) = result.violation {
            state.terminal = true;
            state.termination_reason = Some(TerminationReason::HardViolation(violation));
        } else if result.time_limit_reached || reached(state.elapsed_s, self.env.time_limit_s) {
            if self.env.terminate_on_time_limit {
                state.terminal = true;
            } else {
                state.truncated = true;
            }
            state.termination_reason = Some(TerminationReason::TimeLimit);
        }
        if state.is_over() {
            log::info!(
                "episode ended after {} steps at t = {:.1} s ({:?})",
                state.step_count,
                state.sim_time_s,
                state.termination_reason
            );
        }

        let after = episode.store.snapshot();
        let mut reward = self.reward.reward(&before, &after, &result);
        if result.violation.is_some() {
            reward += self.env.failure_penalty;
        }

        let observation = observe(self.observer.as_ref(), episode, &windows, &self.env);
        Ok(StepOutcome {
            observation,
            reward,
            terminated: episode.state.terminal,
            truncated: episode.state.truncated,
            info: StepInfo {
                d_ts: result.elapsed_time,
                sim_time: episode.state.sim_time_s,
                termination_reason: episode.state.termination_reason,
                action: result,
                upcoming_windows: windows,
            },
        })
    }
}

fn observe(
    observer: &dyn ObservationBuilder,
    episode: &ActiveEpisode,
    windows: &[Vec<OpportunityWindow>],
    env: &EnvConfig,
) -> Vec<f64> {
    let snapshot = episode.store.snapshot();
    observer.observe(&StepView {
        snapshot: &snapshot,
        bounds: &episode.bounds,
        episode: &episode.state,
        windows,
        windows_per_location: env.forecast.windows_per_location,
        time_limit_s: env.time_limit_s,
        horizon_s: env.forecast.horizon_s,
    })
}
