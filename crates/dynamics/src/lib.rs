//! Physical state, orbit geometry and the reduced-order spacecraft model.

pub mod capability;
pub mod ephemeris;
pub mod geometry;
pub mod model;
pub mod orbit;
pub mod state;

pub use capability::{Capability, PowerLedger, StepContext};
pub use ephemeris::SolarEphemeris;
pub use geometry::{GroundLocation, LocationId, LocationKind};
pub use model::{Dynamics, InitialConditions, SpacecraftModel};
pub use orbit::{KeplerOrbit, OrbitState, OrbitalElements};
pub use state::{
    ControlMode, IntegrationError, PhysicalState, ResourceBounds, ResourceCheck,
};
