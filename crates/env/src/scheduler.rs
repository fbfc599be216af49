//! Turns one discrete action into a run of clipped micro-steps.

use serde::Serialize;
use tasking_core::time::{TIME_EPSILON_S, reached};
use tasking_dynamics::{PhysicalState, ResourceBounds};
use tasking_forecast::WindowLookup;

use crate::EnvError;
use crate::actions::{ActionSpec, Gating};
use crate::clock::StateStore;
use crate::constraints::{ConstraintMonitor, ConstraintVerdict, HardViolation};

/// Outcome of running one action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    pub action_id: usize,
    pub start_time: f64,
    pub elapsed_time: f64,
    pub terminal: bool,
    pub violation: Option<HardViolation>,
    /// Time spent with a soft violation active.
    pub soft_violation_seconds: f64,
    pub window_closed_early: bool,
    pub time_limit_reached: bool,
}

/// State after one micro-step, handed to observers of [`ActionScheduler::run_with`].
#[derive(Debug, Clone, Copy)]
pub struct MicroStep<'a> {
    pub time_s: f64,
    pub dt_s: f64,
    pub state: &'a PhysicalState,
    pub verdict: ConstraintVerdict,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionScheduler {
    micro_step_s: f64,
    time_limit_s: f64,
    max_step_duration_s: Option<f64>,
}

impl ActionScheduler {
    pub fn new(micro_step_s: f64, time_limit_s: f64, max_step_duration_s: Option<f64>) -> Self {
        Self {
            micro_step_s,
            time_limit_s,
            max_step_duration_s,
        }
    }

    pub fn micro_step_s(&self) -> f64 {
        self.micro_step_s
    }

    pub fn time_limit_s(&self) -> f64 {
        self.time_limit_s
    }

    /// Target duration after applying the configured cap.
    pub fn effective_target(&self, spec: &ActionSpec) -> f64 {
        match self.max_step_duration_s {
            Some(cap) => spec.target_duration_s.min(cap),
            None => spec.target_duration_s,
        }
    }

    pub fn run(
        &self,
        spec: &ActionSpec,
        store: &mut StateStore,
        monitor: &ConstraintMonitor,
        bounds: &ResourceBounds,
        windows: &dyn WindowLookup,
    ) -> Result<ActionResult, EnvError> {
        self.run_with(spec, store, monitor, bounds, windows, |_| {})
    }

    /// Run `spec` to completion, calling `on_micro_step` after every micro-step.
    ///
    /// Stops on the first of: window closure, target reached, hard violation, time
    /// limit. A window closing in the same micro-step as the target is reported as
    /// `window_closed_early`.
    ///
    /// A gated action started outside every window is not cut short: the mode is held
    /// for the full target, so the clock always moves unless the time limit is reached.
    pub fn run_with<F>(
        &self,
        spec: &ActionSpec,
        store: &mut StateStore,
        monitor: &ConstraintMonitor,
        bounds: &ResourceBounds,
        windows: &dyn WindowLookup,
        mut on_micro_step: F,
    ) -> Result<ActionResult, EnvError>
    where
        F: FnMut(&MicroStep<'_>),
    {
        store.set_mode(spec.required_mode);
        let start_time = store.time_s();
        let target = self.effective_target(spec);
        let mut result = ActionResult {
            action_id: spec.id,
            start_time,
            elapsed_time: 0.0,
            terminal: false,
            violation: None,
            soft_violation_seconds: 0.0,
            window_closed_early: false,
            time_limit_reached: false,
        };

        let window_close = match &spec.gating {
            Gating::None => None,
            Gating::Windows(locations) => {
                let mut close: Option<f64> = None;
                for location in locations {
                    if let Some(window) = windows.active_window(*location, start_time)? {
                        close = Some(close.map_or(window.close_time, |c| c.max(window.close_time)));
                    }
                }
                if close.is_none() {
                    log::warn!(
                        "action {} ({}) has no open window at t = {start_time:.1} s, holding mode for the full target",
                        spec.id,
                        spec.kind
                    );
                }
                close
            }
        };
        log::debug!(
            "action {} ({}) entering at t = {start_time:.1} s, target {target:.1} s",
            spec.id,
            spec.kind
        );

        loop {
            let now = store.time_s();
            let to_close = window_close.map(|close| close - now);
            if to_close.is_some_and(|remaining| remaining <= TIME_EPSILON_S) {
                result.window_closed_early = true;
                break;
            }
            let to_target = target - result.elapsed_time;
            if to_target <= TIME_EPSILON_S {
                break;
            }
            let to_limit = self.time_limit_s - now;
            if to_limit <= TIME_EPSILON_S {
                break;
            }

            let mut dt = self.micro_step_s.min(to_target).min(to_limit);
            if let Some(remaining) = to_close {
                dt = dt.min(remaining);
            }
            store.advance(dt)?;
            result.elapsed_time += dt;

            let verdict = monitor.check(store.state(), bounds, spec.required_mode);
            on_micro_step(&MicroStep {
                time_s: store.time_s(),
                dt_s: dt,
                state: store.state(),
                verdict,
            });
            match verdict {
                ConstraintVerdict::Hard(violation) => {
                    log::warn!(
                        "action {} aborted at t = {:.1} s: {violation}",
                        spec.id,
                        store.time_s()
                    );
                    result.terminal = true;
                    result.violation = Some(violation);
                    break;
                }
                ConstraintVerdict::Soft(_) => result.soft_violation_seconds += dt,
                ConstraintVerdict::Ok => {}
            }
        }

        result.time_limit_reached = reached(store.time_s(), self.time_limit_s);
        log::debug!(
            "action {} exiting after {:.1} s (window closed early: {}, time limit: {})",
            spec.id,
            result.elapsed_time,
            result.window_closed_early,
            result.time_limit_reached
        );
        Ok(result)
    }
}
