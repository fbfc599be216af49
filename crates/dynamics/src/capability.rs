//! Capability modules composed onto a single spacecraft state.
//!
//! Each module owns one physical concern, updates its slice of [`PhysicalState`]
//! during a micro-step and declares the resource checks the constraint monitor
//! must run on its behalf.

use tasking_config::{AttitudeConfig, MomentumConfig, PowerConfig, StorageConfig};
use tasking_core::units::{deg_to_rad, mb_to_mbit, rad_to_deg, wh_to_j};
use tasking_core::vector::{self, Vector3};

use crate::geometry::{GroundLocation, LocationKind};
use crate::orbit::{OrbitState, ecef_to_eci, eci_to_ecef};
use crate::state::{ControlMode, PhysicalState, ResourceBounds, ResourceCheck};

/// Everything a capability may read while advancing one micro-step.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub mode: ControlMode,
    /// Time at the end of the micro-step.
    pub t_s: f64,
    pub dt_s: f64,
    pub orbit: OrbitState,
    pub sun_eci: Vector3,
    pub earth_rotation_rad: f64,
    pub in_eclipse: bool,
    pub bounds: &'a ResourceBounds,
}

impl StepContext<'_> {
    /// Satellite position in the Earth-fixed frame.
    pub fn position_ecef(&self) -> Vector3 {
        eci_to_ecef(&self.orbit.position_km, self.earth_rotation_rad)
    }

    /// Whether the attitude is accurate enough for the payload.
    pub fn pointing_ok(&self, state: &PhysicalState) -> bool {
        state.pointing_error_deg <= self.bounds.attitude_tolerance_deg
    }
}

/// Electrical power produced and consumed during one micro-step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PowerLedger {
    pub load_w: f64,
}

/// A physical subsystem attached to the spacecraft state.
pub trait Capability: Send {
    fn name(&self) -> &'static str;

    /// Advance this capability's part of `state` by `ctx.dt_s`.
    fn update(&self, ctx: &StepContext<'_>, state: &mut PhysicalState, ledger: &mut PowerLedger);

    /// Bounds this capability relies on.
    fn checks(&self) -> &'static [ResourceCheck];
}

/// Station with the highest elevation margin above its mask, if any is visible.
pub fn best_visible_station<'a>(
    stations: &'a [GroundLocation],
    sat_ecef: &Vector3,
) -> Option<&'a GroundLocation> {
    stations
        .iter()
        .filter(|loc| loc.kind == LocationKind::Station)
        .map(|loc| (loc, loc.elevation_margin_deg(sat_ecef)))
        .filter(|(_, margin)| *margin > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(loc, _)| loc)
}

/// Slews the boresight toward the active mode's target at a bounded rate.
pub struct AttitudeControl {
    slew_rate_deg_s: f64,
    stations: Vec<GroundLocation>,
}

impl AttitudeControl {
    pub fn new(config: &AttitudeConfig, stations: Vec<GroundLocation>) -> Self {
        Self {
            slew_rate_deg_s: config.slew_rate_deg_s,
            stations,
        }
    }

    fn target(&self, ctx: &StepContext<'_>, boresight: &Vector3) -> Vector3 {
        let nadir = vector::scale(&vector::normalize(&ctx.orbit.position_km), -1.0);
        match ctx.mode {
            ControlMode::SunPoint => ctx.sun_eci,
            ControlMode::NadirScan => nadir,
            ControlMode::GroundLink => {
                match best_visible_station(&self.stations, &ctx.position_ecef()) {
                    Some(station) => {
                        let station_eci = ecef_to_eci(&station.ecef_km(), ctx.earth_rotation_rad);
                        vector::normalize(&vector::sub(&station_eci, &ctx.orbit.position_km))
                    }
                    None => nadir,
                }
            }
            ControlMode::Drift | ControlMode::Desaturate => *boresight,
        }
    }
}

impl Capability for AttitudeControl {
    fn name(&self) -> &'static str {
        "attitude"
    }

    fn update(&self, ctx: &StepContext<'_>, state: &mut PhysicalState, _ledger: &mut PowerLedger) {
        let target = self.target(ctx, &state.boresight_eci);
        let max_step = deg_to_rad(self.slew_rate_deg_s * ctx.dt_s);
        state.boresight_eci = rotate_toward(&state.boresight_eci, &target, max_step);
        state.pointing_error_deg = rad_to_deg(angle_between(&state.boresight_eci, &target));
    }

    fn checks(&self) -> &'static [ResourceCheck] {
        &[ResourceCheck::AttitudeTolerance]
    }
}

/// Records data while scanning nadir with an accurate attitude.
pub struct Imager {
    rate_mbit_s: f64,
    instrument_power_w: f64,
    capacity_mbit: f64,
}

impl Imager {
    pub fn new(storage: &StorageConfig, power: &PowerConfig, bounds: &ResourceBounds) -> Self {
        Self {
            rate_mbit_s: storage.imaging_rate_mbit_s,
            instrument_power_w: power.instrument_power_w,
            capacity_mbit: mb_to_mbit(bounds.data_capacity_mb),
        }
    }
}

impl Capability for Imager {
    fn name(&self) -> &'static str {
        "imager"
    }

    fn update(&self, ctx: &StepContext<'_>, state: &mut PhysicalState, ledger: &mut PowerLedger) {
        if ctx.mode != ControlMode::NadirScan {
            return;
        }
        ledger.load_w += self.instrument_power_w;
        if ctx.pointing_ok(state) {
            // Not clamped: an overfull buffer is a hard violation.
            state.stored_data_fraction += self.rate_mbit_s * ctx.dt_s / self.capacity_mbit;
            state.imaging_seconds += ctx.dt_s;
        }
    }

    fn checks(&self) -> &'static [ResourceCheck] {
        &[ResourceCheck::DataCeiling]
    }
}

/// Empties the buffer toward a visible ground station.
pub struct Transmitter {
    rate_mbit_s: f64,
    transmitter_power_w: f64,
    capacity_mbit: f64,
    stations: Vec<GroundLocation>,
}

impl Transmitter {
    pub fn new(
        storage: &StorageConfig,
        power: &PowerConfig,
        bounds: &ResourceBounds,
        stations: Vec<GroundLocation>,
    ) -> Self {
        Self {
            rate_mbit_s: storage.downlink_rate_mbit_s,
            transmitter_power_w: power.transmitter_power_w,
            capacity_mbit: mb_to_mbit(bounds.data_capacity_mb),
            stations,
        }
    }
}

impl Capability for Transmitter {
    fn name(&self) -> &'static str {
        "transmitter"
    }

    fn update(&self, ctx: &StepContext<'_>, state: &mut PhysicalState, ledger: &mut PowerLedger) {
        if ctx.mode != ControlMode::GroundLink {
            return;
        }
        ledger.load_w += self.transmitter_power_w;
        if !ctx.pointing_ok(state)
            || best_visible_station(&self.stations, &ctx.position_ecef()).is_none()
        {
            return;
        }
        let stored_mbit = state.stored_data_fraction.max(0.0) * self.capacity_mbit;
        let sent = (self.rate_mbit_s * ctx.dt_s).min(stored_mbit);
        state.stored_data_fraction -= sent / self.capacity_mbit;
        state.downlinked_mbit += sent;
    }

    fn checks(&self) -> &'static [ResourceCheck] {
        &[]
    }
}

/// Reaction wheels spun up by environmental torques and unloaded on demand.
pub struct ReactionWheels {
    disturbance_rpm_s: [f64; 3],
    desat_rate_rpm_s: f64,
    desat_power_w: f64,
}

impl ReactionWheels {
    pub fn new(momentum: &MomentumConfig, power: &PowerConfig) -> Self {
        Self {
            disturbance_rpm_s: momentum.disturbance_rpm_s,
            desat_rate_rpm_s: momentum.desat_rate_rpm_s,
            desat_power_w: power.desat_power_w,
        }
    }
}

impl Capability for ReactionWheels {
    fn name(&self) -> &'static str {
        "reaction_wheels"
    }

    fn update(&self, ctx: &StepContext<'_>, state: &mut PhysicalState, ledger: &mut PowerLedger) {
        let desaturating = ctx.mode == ControlMode::Desaturate;
        if desaturating {
            ledger.load_w += self.desat_power_w;
        }
        for (speed, drift) in state.wheel_speeds_rpm.iter_mut().zip(self.disturbance_rpm_s) {
            *speed += drift * ctx.dt_s;
            if desaturating {
                let sign = speed.signum();
                let unload = (self.desat_rate_rpm_s * ctx.dt_s).min(speed.abs());
                *speed -= unload * sign;
            }
        }
    }

    fn checks(&self) -> &'static [ResourceCheck] {
        &[ResourceCheck::WheelCeiling]
    }
}

/// Body-mounted panels and battery. Runs after every other capability so that
/// the ledger holds the full load.
pub struct PowerSystem {
    panel_power_w: f64,
    base_power_w: f64,
    capacity_j: f64,
}

impl PowerSystem {
    pub fn new(power: &PowerConfig, bounds: &ResourceBounds) -> Self {
        Self {
            panel_power_w: power.panel_power_w,
            base_power_w: power.base_power_w,
            capacity_j: wh_to_j(bounds.battery_capacity_wh),
        }
    }

    /// Panel output for the given attitude and illumination.
    pub fn generation_w(&self, boresight: &Vector3, sun: &Vector3, in_eclipse: bool) -> f64 {
        if in_eclipse {
            return 0.0;
        }
        self.panel_power_w * vector::dot(boresight, sun).max(0.0)
    }
}

impl Capability for PowerSystem {
    fn name(&self) -> &'static str {
        "power"
    }

    fn update(&self, ctx: &StepContext<'_>, state: &mut PhysicalState, ledger: &mut PowerLedger) {
        let generation = self.generation_w(&state.boresight_eci, &ctx.sun_eci, ctx.in_eclipse);
        let net_w = generation - ledger.load_w - self.base_power_w;
        // A full battery sheds surplus; depletion is left to the constraint monitor.
        state.stored_charge_fraction =
            (state.stored_charge_fraction + net_w * ctx.dt_s / self.capacity_j).min(1.0);
    }

    fn checks(&self) -> &'static [ResourceCheck] {
        &[ResourceCheck::PowerFloor]
    }
}

/// Angle between two unit vectors (rad).
pub fn angle_between(a: &Vector3, b: &Vector3) -> f64 {
    vector::dot(a, b).clamp(-1.0, 1.0).acos()
}

/// Rotate unit vector `from` toward `to` by at most `max_angle` radians.
pub fn rotate_toward(from: &Vector3, to: &Vector3, max_angle: f64) -> Vector3 {
    let angle = angle_between(from, to);
    if angle <= max_angle {
        return vector::normalize(to);
    }
    let along = vector::scale(from, vector::dot(from, to));
    let mut perpendicular = vector::sub(to, &along);
    if vector::norm(&perpendicular) < 1e-12 {
        // Antiparallel: any axis orthogonal to `from` works.
        let axis = if from[0].abs() < 0.9 { [1.0, 0.0, 0.0] } else { [0.0, 1.0, 0.0] };
        perpendicular = vector::cross(from, &axis);
    }
    let perpendicular = vector::normalize(&perpendicular);
    let (sin_step, cos_step) = max_angle.sin_cos();
    vector::normalize(&[
        from[0] * cos_step + perpendicular[0] * sin_step,
        from[1] * cos_step + perpendicular[1] * sin_step,
        from[2] * cos_step + perpendicular[2] * sin_step,
    ])
}
