//! Deterministic per-episode parameter draws.
//!
//! Every draw comes from one ChaCha8 stream seeded at reset, in a fixed order, so a
//! seed fully determines the episode's parameters.

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tasking_config::{Distribution, EnvConfig, EpochSpec, ParamSpec, SatelliteConfig};
use tasking_dynamics::{InitialConditions, OrbitalElements};

use crate::EnvError;

/// Parameters resolved at reset.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeParams {
    pub seed: u64,
    pub epoch: DateTime<Utc>,
    pub elements: OrbitalElements,
    pub initial: InitialConditions,
}

/// Resolves [`ParamSpec`]s from a seeded stream. Constants consume no randomness.
pub struct ParamSampler {
    rng: ChaCha8Rng,
}

impl ParamSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn sample(&mut self, field: &'static str, spec: &ParamSpec) -> Result<f64, EnvError> {
        match spec {
            ParamSpec::Fixed(value) => Ok(*value),
            ParamSpec::Sampled(Distribution::Uniform { low, high }) => {
                if !low.is_finite() || !high.is_finite() || low > high {
                    return Err(EnvError::Sampling {
                        field,
                        reason: format!("uniform range [{low}, {high}] is not ordered"),
                    });
                }
                if low == high {
                    return Ok(*low);
                }
                Ok(self.rng.gen_range(*low..=*high))
            }
            ParamSpec::Sampled(Distribution::Choice { values }) => {
                if values.is_empty() {
                    return Err(EnvError::Sampling {
                        field,
                        reason: "choice list is empty".to_string(),
                    });
                }
                Ok(values[self.rng.gen_range(0..values.len())])
            }
        }
    }

    /// Draw a value that must lie in `[0, 1]`.
    pub fn sample_fraction(
        &mut self,
        field: &'static str,
        spec: &ParamSpec,
    ) -> Result<f64, EnvError> {
        let value = self.sample(field, spec)?;
        if !(0.0..=1.0).contains(&value) {
            return Err(EnvError::Sampling {
                field,
                reason: format!("{value} is outside [0, 1]"),
            });
        }
        Ok(value)
    }

    pub fn sample_epoch(&mut self, spec: &EpochSpec) -> Result<DateTime<Utc>, EnvError> {
        let text = match spec {
            EpochSpec::Fixed(text) => text,
            EpochSpec::Choice { choices } => {
                if choices.is_empty() {
                    return Err(EnvError::Sampling {
                        field: "env_args.utc_init",
                        reason: "choice list is empty".to_string(),
                    });
                }
                &choices[self.rng.gen_range(0..choices.len())]
            }
        };
        parse_epoch(text)
    }
}

/// Parse an RFC 3339 UTC epoch such as `2024-03-20T12:00:00Z`.
pub fn parse_epoch(text: &str) -> Result<DateTime<Utc>, EnvError> {
    DateTime::parse_from_rfc3339(text)
        .map(|epoch| epoch.with_timezone(&Utc))
        .map_err(|err| EnvError::Sampling {
            field: "env_args.utc_init",
            reason: format!("`{text}` is not an RFC 3339 timestamp: {err}"),
        })
}

/// Resolve env args, orbit and initial state for one episode.
pub fn draw_episode_params(
    satellite: &SatelliteConfig,
    env: &EnvConfig,
    seed: u64,
) -> Result<EpisodeParams, EnvError> {
    let mut sampler = ParamSampler::new(seed);
    let epoch = sampler.sample_epoch(&env.env_args.utc_init)?;

    let orbit = &satellite.orbit;
    let elements = OrbitalElements {
        semi_major_axis_km: sampler.sample("orbit.semi_major_axis_km", &orbit.semi_major_axis_km)?,
        eccentricity: sampler.sample("orbit.eccentricity", &orbit.eccentricity)?,
        inclination_deg: sampler.sample("orbit.inclination_deg", &orbit.inclination_deg)?,
        raan_deg: sampler.sample("orbit.raan_deg", &orbit.raan_deg)?,
        arg_perigee_deg: sampler.sample("orbit.arg_perigee_deg", &orbit.arg_perigee_deg)?,
        mean_anomaly_deg: sampler.sample("orbit.mean_anomaly_deg", &orbit.mean_anomaly_deg)?,
    };
    if !(0.0..1.0).contains(&elements.eccentricity) {
        return Err(EnvError::Sampling {
            field: "orbit.eccentricity",
            reason: format!("{} is not an elliptical orbit", elements.eccentricity),
        });
    }
    if !(elements.semi_major_axis_km > 0.0) {
        return Err(EnvError::Sampling {
            field: "orbit.semi_major_axis_km",
            reason: format!("{} must be positive", elements.semi_major_axis_km),
        });
    }

    let initial = &satellite.initial;
    let stored_data_fraction =
        sampler.sample_fraction("initial.stored_data_fraction", &initial.stored_data_fraction)?;
    let stored_charge_fraction = sampler.sample_fraction(
        "initial.stored_charge_fraction",
        &initial.stored_charge_fraction,
    )?;
    let mut wheel_speeds_rpm = [0.0; 3];
    for speed in &mut wheel_speeds_rpm {
        *speed = sampler.sample("initial.wheel_speed_rpm", &initial.wheel_speed_rpm)?;
    }
    let pointing_error_deg =
        sampler.sample("initial.pointing_error_deg", &initial.pointing_error_deg)?;

    Ok(EpisodeParams {
        seed,
        epoch,
        elements,
        initial: InitialConditions {
            stored_data_fraction,
            stored_charge_fraction,
            wheel_speeds_rpm,
            pointing_error_deg,
        },
    })
}
