//! Simulation clock and sole owner of the physical state.

use serde::Serialize;
use tasking_dynamics::{ControlMode, Dynamics, IntegrationError, PhysicalState, ResourceCheck};

/// Immutable copy of the state at a point in simulation time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub time_s: f64,
    pub state: PhysicalState,
}

/// Advances time and state together through the dynamics collaborator.
pub struct StateStore {
    dynamics: Box<dyn Dynamics>,
    state: PhysicalState,
    time_s: f64,
}

impl StateStore {
    pub fn new(dynamics: Box<dyn Dynamics>, initial: PhysicalState) -> Self {
        Self {
            dynamics,
            state: initial,
            time_s: 0.0,
        }
    }

    /// Move time forward by exactly `dt_s`.
    ///
    /// On failure the previous state and time are kept.
    pub fn advance(&mut self, dt_s: f64) -> Result<(), IntegrationError> {
        if !(dt_s > 0.0) || !dt_s.is_finite() {
            return Err(IntegrationError::InvalidStep { dt_s });
        }
        let next = self.dynamics.propagate(&self.state, self.time_s, dt_s)?;
        self.state = next;
        self.time_s += dt_s;
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            time_s: self.time_s,
            state: self.state.clone(),
        }
    }

    pub fn state(&self) -> &PhysicalState {
        &self.state
    }

    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    pub fn set_mode(&mut self, mode: ControlMode) {
        self.dynamics.set_mode(mode);
    }

    pub fn mode(&self) -> ControlMode {
        self.dynamics.mode()
    }

    pub fn resource_checks(&self) -> Vec<ResourceCheck> {
        self.dynamics.resource_checks()
    }
}
