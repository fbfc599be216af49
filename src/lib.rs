//! Satellite tasking core: discrete actions over continuous spacecraft dynamics.
//!
//! The workspace crates are re-exported here so front-ends and tests can depend
//! on a single crate.

pub use tasking_config as config;
pub use tasking_core as core;
pub use tasking_dynamics as dynamics;
pub use tasking_env as env;
pub use tasking_export as export;
pub use tasking_forecast as forecast;

/// Returns the version of the library for smoke tests.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
