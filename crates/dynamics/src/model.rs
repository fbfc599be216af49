//! The dynamics collaborator trait and the reduced-order reference spacecraft.

use tasking_config::SatelliteConfig;
use tasking_core::vector::{self, Vector3};

use crate::capability::{
    AttitudeControl, Capability, Imager, PowerLedger, PowerSystem, ReactionWheels, StepContext,
    Transmitter,
};
use crate::ephemeris::{SolarEphemeris, in_earth_shadow};
use crate::geometry::GroundLocation;
use crate::orbit::KeplerOrbit;
use crate::state::{ControlMode, IntegrationError, PhysicalState, ResourceBounds, ResourceCheck};

/// Integrator and mode-control collaborator driven by the state store.
///
/// Implementations must be deterministic: identical inputs give identical outputs.
pub trait Dynamics: Send {
    /// Switch the underlying flight software mode. No time elapses.
    fn set_mode(&mut self, mode: ControlMode);

    fn mode(&self) -> ControlMode;

    /// Advance `state` from `t_s` to `t_s + dt_s`.
    fn propagate(
        &mut self,
        state: &PhysicalState,
        t_s: f64,
        dt_s: f64,
    ) -> Result<PhysicalState, IntegrationError>;

    /// Resource checks contributed by the attached capabilities.
    fn resource_checks(&self) -> Vec<ResourceCheck>;
}

/// Initial-state values resolved at reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialConditions {
    pub stored_data_fraction: f64,
    pub stored_charge_fraction: f64,
    pub wheel_speeds_rpm: [f64; 3],
    /// Boresight offset from nadir, tilted toward the velocity direction.
    pub pointing_error_deg: f64,
}

/// Reference spacecraft: an analytic orbit with capability modules layered on top.
pub struct SpacecraftModel {
    orbit: KeplerOrbit,
    ephemeris: SolarEphemeris,
    bounds: ResourceBounds,
    mode: ControlMode,
    capabilities: Vec<Box<dyn Capability>>,
    power: PowerSystem,
}

impl SpacecraftModel {
    /// Assemble the standard capability stack for a configured satellite.
    pub fn from_config(
        config: &SatelliteConfig,
        orbit: KeplerOrbit,
        ephemeris: SolarEphemeris,
        stations: Vec<GroundLocation>,
    ) -> Self {
        let bounds = ResourceBounds::from(&config.resources);
        let capabilities: Vec<Box<dyn Capability>> = vec![
            Box::new(AttitudeControl::new(&config.attitude, stations.clone())),
            Box::new(Imager::new(&config.storage, &config.power, &bounds)),
            Box::new(Transmitter::new(
                &config.storage,
                &config.power,
                &bounds,
                stations,
            )),
            Box::new(ReactionWheels::new(&config.momentum, &config.power)),
        ];
        Self::with_capabilities(
            orbit,
            ephemeris,
            bounds,
            capabilities,
            PowerSystem::new(&config.power, &bounds),
        )
    }

    /// Compose a model from an arbitrary capability set. The power system always runs last.
    pub fn with_capabilities(
        orbit: KeplerOrbit,
        ephemeris: SolarEphemeris,
        bounds: ResourceBounds,
        capabilities: Vec<Box<dyn Capability>>,
        power: PowerSystem,
    ) -> Self {
        log::debug!(
            "spacecraft model with capabilities [{}]",
            capabilities
                .iter()
                .map(|c| c.name())
                .chain(std::iter::once(power.name()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Self {
            orbit,
            ephemeris,
            bounds,
            mode: ControlMode::Drift,
            capabilities,
            power,
        }
    }

    pub fn orbit(&self) -> &KeplerOrbit {
        &self.orbit
    }

    pub fn bounds(&self) -> &ResourceBounds {
        &self.bounds
    }

    /// Build the state at `t = 0` from resolved initial conditions.
    pub fn initial_state(
        &self,
        initial: &InitialConditions,
    ) -> Result<PhysicalState, IntegrationError> {
        let orbit = self.orbit.state_eci(0.0)?;
        let sun = self.ephemeris.sun_direction_eci(0.0);
        let nadir = vector::scale(&vector::normalize(&orbit.position_km), -1.0);
        let boresight = tilt(&nadir, &orbit.velocity_km_s, initial.pointing_error_deg);

        let state = PhysicalState {
            position_km: orbit.position_km,
            velocity_km_s: orbit.velocity_km_s,
            boresight_eci: boresight,
            pointing_error_deg: initial.pointing_error_deg,
            stored_data_fraction: initial.stored_data_fraction,
            stored_charge_fraction: initial.stored_charge_fraction,
            wheel_speeds_rpm: initial.wheel_speeds_rpm,
            in_eclipse: in_earth_shadow(&orbit.position_km, &sun),
            imaging_seconds: 0.0,
            downlinked_mbit: 0.0,
        };
        if !state.is_finite() {
            return Err(IntegrationError::NonFinite { time_s: 0.0 });
        }
        Ok(state)
    }
}

impl Dynamics for SpacecraftModel {
    fn set_mode(&mut self, mode: ControlMode) {
        self.mode = mode;
    }

    fn mode(&self) -> ControlMode {
        self.mode
    }

    fn propagate(
        &mut self,
        state: &PhysicalState,
        t_s: f64,
        dt_s: f64,
    ) -> Result<PhysicalState, IntegrationError> {
        if !(dt_s > 0.0) || !dt_s.is_finite() {
            return Err(IntegrationError::InvalidStep { dt_s });
        }
        let t_end = t_s + dt_s;
        let orbit = self.orbit.state_eci(t_end)?;
        let sun_eci = self.ephemeris.sun_direction_eci(t_end);
        let in_eclipse = in_earth_shadow(&orbit.position_km, &sun_eci);
        let ctx = StepContext {
            mode: self.mode,
            t_s: t_end,
            dt_s,
            orbit,
            sun_eci,
            earth_rotation_rad: self.orbit.earth_rotation_rad(t_end),
            in_eclipse,
            bounds: &self.bounds,
        };

        let mut next = state.clone();
        next.position_km = orbit.position_km;
        next.velocity_km_s = orbit.velocity_km_s;
        next.in_eclipse = in_eclipse;

        let mut ledger = PowerLedger::default();
        for capability in &self.capabilities {
            capability.update(&ctx, &mut next, &mut ledger);
        }
        self.power.update(&ctx, &mut next, &mut ledger);

        if !next.is_finite() {
            return Err(IntegrationError::NonFinite { time_s: t_end });
        }
        Ok(next)
    }

    /// The orbit's altitude floor first, then the capability checks in attach order.
    fn resource_checks(&self) -> Vec<ResourceCheck> {
        let mut checks = vec![ResourceCheck::AltitudeFloor];
        for check in self
            .capabilities
            .iter()
            .flat_map(|c| c.checks().iter())
            .chain(self.power.checks().iter())
        {
            if !checks.contains(check) {
                checks.push(*check);
            }
        }
        checks
    }
}

fn tilt(nadir: &Vector3, velocity: &Vector3, angle_deg: f64) -> Vector3 {
    let along = vector::scale(nadir, vector::dot(nadir, velocity));
    let forward = vector::normalize(&vector::sub(velocity, &along));
    let (sin_a, cos_a) = angle_deg.to_radians().sin_cos();
    vector::normalize(&[
        nadir[0] * cos_a + forward[0] * sin_a,
        nadir[1] * cos_a + forward[1] * sin_a,
        nadir[2] * cos_a + forward[2] * sin_a,
    ])
}
