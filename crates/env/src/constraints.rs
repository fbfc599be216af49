//! Resource-bound evaluation after every micro-step.

use std::fmt;

use serde::Serialize;
use tasking_core::{constants::R_EARTH_KM, vector};
use tasking_dynamics::{ControlMode, PhysicalState, ResourceBounds, ResourceCheck};

/// Bound breach that ends the episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HardViolation {
    Deorbited,
    DataOverflow,
    PowerDepleted,
    WheelSaturated,
}

impl fmt::Display for HardViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HardViolation::Deorbited => "satellite deorbited",
            HardViolation::DataOverflow => "data buffer overflow",
            HardViolation::PowerDepleted => "battery depleted",
            HardViolation::WheelSaturated => "reaction wheel saturated",
        };
        f.write_str(label)
    }
}

/// Degraded but recoverable condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoftViolation {
    AttitudeError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConstraintVerdict {
    Ok,
    Soft(SoftViolation),
    Hard(HardViolation),
}

impl ConstraintVerdict {
    pub fn is_hard(&self) -> bool {
        matches!(self, ConstraintVerdict::Hard(_))
    }
}

/// Runs the checks registered by the dynamics' capabilities, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ConstraintMonitor {
    checks: Vec<ResourceCheck>,
}

impl ConstraintMonitor {
    pub fn new(checks: Vec<ResourceCheck>) -> Self {
        Self { checks }
    }

    pub fn checks(&self) -> &[ResourceCheck] {
        &self.checks
    }

    /// First hard violation wins, then the first soft one.
    pub fn check(
        &self,
        state: &PhysicalState,
        bounds: &ResourceBounds,
        mode: ControlMode,
    ) -> ConstraintVerdict {
        let mut soft = None;
        for check in &self.checks {
            match evaluate(*check, state, bounds, mode) {
                ConstraintVerdict::Hard(violation) => return ConstraintVerdict::Hard(violation),
                ConstraintVerdict::Soft(violation) if soft.is_none() => soft = Some(violation),
                _ => {}
            }
        }
        soft.map_or(ConstraintVerdict::Ok, ConstraintVerdict::Soft)
    }
}

fn evaluate(
    check: ResourceCheck,
    state: &PhysicalState,
    bounds: &ResourceBounds,
    mode: ControlMode,
) -> ConstraintVerdict {
    match check {
        ResourceCheck::AltitudeFloor if vector::norm(&state.position_km) <= R_EARTH_KM => {
            ConstraintVerdict::Hard(HardViolation::Deorbited)
        }
        ResourceCheck::DataCeiling if state.stored_data_fraction > 1.0 => {
            ConstraintVerdict::Hard(HardViolation::DataOverflow)
        }
        ResourceCheck::PowerFloor
            if state.stored_charge_fraction <= bounds.battery_floor_fraction =>
        {
            ConstraintVerdict::Hard(HardViolation::PowerDepleted)
        }
        ResourceCheck::WheelCeiling if state.max_wheel_speed_rpm() > bounds.max_wheel_speed_rpm => {
            ConstraintVerdict::Hard(HardViolation::WheelSaturated)
        }
        ResourceCheck::AttitudeTolerance
            if mode.requires_accurate_pointing()
                && state.pointing_error_deg > bounds.attitude_tolerance_deg =>
        {
            ConstraintVerdict::Soft(SoftViolation::AttitudeError)
        }
        _ => ConstraintVerdict::Ok,
    }
}
