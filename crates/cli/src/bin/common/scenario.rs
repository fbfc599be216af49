//! Scenario loading shared by the CLI binaries.

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use chrono::{DateTime, TimeDelta, Utc};
use clap::Args;
use satellite_tasking::config::{
    EnvConfig, GroundLocationConfig, SatelliteConfig, load_env_config, load_ground_locations,
    load_satellites,
};

#[derive(Args, Debug)]
pub struct ScenarioArgs {
    /// Satellite catalog (TOML/YAML file or directory of TOML files)
    #[arg(long, default_value = "configs/satellites")]
    pub satellites: PathBuf,

    /// Ground stations and targets
    #[arg(long, default_value = "configs/locations.yaml")]
    pub locations: PathBuf,

    /// Environment settings
    #[arg(long, default_value = "configs/env.toml")]
    pub env: PathBuf,

    /// Satellite name (case-insensitive, defaults to the first in the catalog)
    #[arg(long)]
    pub satellite: Option<String>,

    /// Episode seed
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

pub struct Scenario {
    pub satellite: SatelliteConfig,
    pub env: EnvConfig,
    pub locations: Vec<GroundLocationConfig>,
}

impl ScenarioArgs {
    pub fn load(&self) -> anyhow::Result<Scenario> {
        let satellites = load_satellites(&self.satellites)
            .with_context(|| format!("loading {}", self.satellites.display()))?;
        let satellite = match &self.satellite {
            Some(name) => satellites
                .into_iter()
                .find(|sat| sat.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| anyhow!("satellite '{name}' not found in catalog"))?,
            None => satellites
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("satellite catalog is empty"))?,
        };
        let env = load_env_config(&self.env)
            .with_context(|| format!("loading {}", self.env.display()))?;
        let locations = load_ground_locations(&self.locations)
            .with_context(|| format!("loading {}", self.locations.display()))?;
        Ok(Scenario {
            satellite,
            env,
            locations,
        })
    }
}

/// Format an episode-relative time as a UTC timestamp.
pub fn utc_at(epoch: DateTime<Utc>, t_s: f64) -> String {
    let offset = TimeDelta::milliseconds((t_s * 1_000.0).round() as i64);
    (epoch + offset).format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
