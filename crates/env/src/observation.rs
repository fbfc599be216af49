//! Observation collaborators.

use tasking_dynamics::ResourceBounds;
use tasking_forecast::OpportunityWindow;

use crate::clock::Snapshot;
use crate::episode::EpisodeState;

/// What an observation builder may look at after reset or a step.
#[derive(Debug, Clone, Copy)]
pub struct StepView<'a> {
    pub snapshot: &'a Snapshot,
    pub bounds: &'a ResourceBounds,
    pub episode: &'a EpisodeState,
    /// Upcoming windows, indexed by location id.
    pub windows: &'a [Vec<OpportunityWindow>],
    pub windows_per_location: usize,
    pub time_limit_s: f64,
    pub horizon_s: f64,
}

pub trait ObservationBuilder: Send {
    fn observe(&self, view: &StepView<'_>) -> Vec<f64>;
}

/// Normalized time, resources, pointing, eclipse and window timing.
///
/// Each location contributes `windows_per_location` pairs of
/// `(open - now, close - now) / horizon`; missing windows read as `(1, 1)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardObservation;

impl ObservationBuilder for StandardObservation {
    fn observe(&self, view: &StepView<'_>) -> Vec<f64> {
        let state = &view.snapshot.state;
        let now = view.snapshot.time_s;
        let mut obs = vec![
            now / view.time_limit_s,
            state.stored_data_fraction,
            state.stored_charge_fraction,
            state.max_wheel_speed_rpm() / view.bounds.max_wheel_speed_rpm,
            state.pointing_error_deg / 180.0,
            if state.in_eclipse { 1.0 } else { 0.0 },
        ];
        for windows in view.windows {
            for slot in 0..view.windows_per_location {
                match windows.get(slot) {
                    Some(window) => {
                        obs.push((window.open_time - now) / view.horizon_s);
                        obs.push((window.close_time - now) / view.horizon_s);
                    }
                    None => obs.extend([1.0, 1.0]),
                }
            }
        }
        obs
    }
}

/// Only the normalized simulation time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeObservation;

impl ObservationBuilder for TimeObservation {
    fn observe(&self, view: &StepView<'_>) -> Vec<f64> {
        vec![view.snapshot.time_s / view.time_limit_s]
    }
}
