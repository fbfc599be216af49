//! Configuration models and loaders for the satellite tasking workspace.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// A scalar parameter that is either a constant or drawn once per episode.
///
/// In TOML a constant is written as a bare number (`eccentricity = 0.001`) and a
/// sampled value as an inline table
/// (`raan_deg = { distribution = "uniform", low = 0.0, high = 360.0 }`).
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ParamSpec {
    Fixed(f64),
    Sampled(Distribution),
}

impl ParamSpec {
    /// Returns the constant value, if this parameter is not randomized.
    pub fn fixed_value(&self) -> Option<f64> {
        match self {
            ParamSpec::Fixed(value) => Some(*value),
            ParamSpec::Sampled(_) => None,
        }
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        match self {
            ParamSpec::Fixed(value) if !value.is_finite() => Err(ConfigError::Invalid {
                field,
                reason: "constant must be finite".to_string(),
            }),
            ParamSpec::Fixed(_) => Ok(()),
            ParamSpec::Sampled(distribution) => distribution.validate(field),
        }
    }
}

/// Distributions available for randomized parameters.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "distribution", rename_all = "snake_case")]
pub enum Distribution {
    Uniform { low: f64, high: f64 },
    Choice { values: Vec<f64> },
}

impl Distribution {
    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        match self {
            Distribution::Uniform { low, high } => {
                if !low.is_finite() || !high.is_finite() || low > high {
                    return Err(ConfigError::Invalid {
                        field,
                        reason: format!("uniform range [{low}, {high}] is not ordered"),
                    });
                }
            }
            Distribution::Choice { values } => {
                if values.is_empty() {
                    return Err(ConfigError::Invalid {
                        field,
                        reason: "choice list is empty".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// UTC start epoch, either fixed or picked from a list each episode.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum EpochSpec {
    Fixed(String),
    Choice { choices: Vec<String> },
}

impl Default for EpochSpec {
    fn default() -> Self {
        EpochSpec::Fixed(DEFAULT_UTC_INIT.to_string())
    }
}

/// Default start epoch (RFC 3339).
pub const DEFAULT_UTC_INIT: &str = "2024-03-20T12:00:00Z";

/// Orbital elements of the spacecraft, each possibly randomized.
#[derive(Debug, Deserialize, Clone)]
pub struct OrbitConfig {
    pub semi_major_axis_km: ParamSpec,
    #[serde(default = "zero")]
    pub eccentricity: ParamSpec,
    pub inclination_deg: ParamSpec,
    #[serde(default = "zero")]
    pub raan_deg: ParamSpec,
    #[serde(default = "zero")]
    pub arg_perigee_deg: ParamSpec,
    #[serde(default = "zero")]
    pub mean_anomaly_deg: ParamSpec,
}

/// Immutable resource limits of a satellite.
#[derive(Debug, Deserialize, Clone)]
pub struct ResourceConfig {
    pub data_capacity_mb: f64,
    pub battery_capacity_wh: f64,
    #[serde(default)]
    pub battery_floor_fraction: f64,
    pub max_wheel_speed_rpm: f64,
    pub attitude_tolerance_deg: f64,
}

/// Initial-state parameters drawn at reset.
#[derive(Debug, Deserialize, Clone)]
pub struct InitialStateConfig {
    pub stored_data_fraction: ParamSpec,
    pub stored_charge_fraction: ParamSpec,
    /// Applied independently to each wheel axis.
    #[serde(default = "zero")]
    pub wheel_speed_rpm: ParamSpec,
    /// Initial angle between boresight and nadir.
    #[serde(default = "zero")]
    pub pointing_error_deg: ParamSpec,
}

/// Power generation and per-mode loads.
#[derive(Debug, Deserialize, Clone)]
pub struct PowerConfig {
    pub panel_power_w: f64,
    pub base_power_w: f64,
    #[serde(default)]
    pub instrument_power_w: f64,
    #[serde(default)]
    pub transmitter_power_w: f64,
    #[serde(default)]
    pub desat_power_w: f64,
}

/// Onboard data production and transmission rates.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub imaging_rate_mbit_s: f64,
    pub downlink_rate_mbit_s: f64,
}

/// Attitude control parameters.
#[derive(Debug, Deserialize, Clone)]
pub struct AttitudeConfig {
    pub slew_rate_deg_s: f64,
}

/// Reaction-wheel momentum model.
#[derive(Debug, Deserialize, Clone)]
pub struct MomentumConfig {
    /// Per-axis wheel speed growth from environmental torques (rpm/s).
    pub disturbance_rpm_s: [f64; 3],
    /// Wheel speed reduction while desaturating (rpm/s).
    pub desat_rate_rpm_s: f64,
}

/// Discrete task kinds a satellite can be commanded with.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionKindConfig {
    Drift,
    Charge,
    Scan,
    Downlink,
    Desaturate,
}

/// One entry of the satellite's ordered action list.
#[derive(Debug, Deserialize, Clone)]
pub struct ActionConfig {
    pub kind: ActionKindConfig,
    pub duration_s: f64,
    /// Ground location names gating this action. Empty means every station.
    #[serde(default)]
    pub locations: Vec<String>,
}

/// Satellite definition parsed from scenario catalogs.
#[derive(Debug, Deserialize, Clone)]
pub struct SatelliteConfig {
    pub name: String,
    pub orbit: OrbitConfig,
    pub resources: ResourceConfig,
    pub initial: InitialStateConfig,
    pub power: PowerConfig,
    pub storage: StorageConfig,
    pub attitude: AttitudeConfig,
    pub momentum: MomentumConfig,
    pub actions: Vec<ActionConfig>,
}

impl SatelliteConfig {
    /// Check ranges and catalog consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let orbit = &self.orbit;
        orbit.semi_major_axis_km.validate("orbit.semi_major_axis_km")?;
        orbit.eccentricity.validate("orbit.eccentricity")?;
        orbit.inclination_deg.validate("orbit.inclination_deg")?;
        orbit.raan_deg.validate("orbit.raan_deg")?;
        orbit.arg_perigee_deg.validate("orbit.arg_perigee_deg")?;
        orbit.mean_anomaly_deg.validate("orbit.mean_anomaly_deg")?;
        if let Some(e) = orbit.eccentricity.fixed_value() {
            if !(0.0..1.0).contains(&e) {
                return Err(ConfigError::Invalid {
                    field: "orbit.eccentricity",
                    reason: format!("{e} is not an elliptical orbit"),
                });
            }
        }

        let initial = &self.initial;
        initial
            .stored_data_fraction
            .validate("initial.stored_data_fraction")?;
        initial
            .stored_charge_fraction
            .validate("initial.stored_charge_fraction")?;
        initial.wheel_speed_rpm.validate("initial.wheel_speed_rpm")?;
        initial.pointing_error_deg.validate("initial.pointing_error_deg")?;

        let resources = &self.resources;
        positive("resources.data_capacity_mb", resources.data_capacity_mb)?;
        positive("resources.battery_capacity_wh", resources.battery_capacity_wh)?;
        positive("resources.max_wheel_speed_rpm", resources.max_wheel_speed_rpm)?;
        positive(
            "resources.attitude_tolerance_deg",
            resources.attitude_tolerance_deg,
        )?;
        if !(0.0..1.0).contains(&resources.battery_floor_fraction) {
            return Err(ConfigError::Invalid {
                field: "resources.battery_floor_fraction",
                reason: "must lie in [0, 1)".to_string(),
            });
        }
        positive("attitude.slew_rate_deg_s", self.attitude.slew_rate_deg_s)?;

        if self.actions.is_empty() {
            return Err(ConfigError::EmptyActions(self.name.clone()));
        }
        for action in &self.actions {
            positive("actions.duration_s", action.duration_s)?;
        }
        Ok(())
    }
}

/// Role of a ground location.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LocationKindConfig {
    Station,
    Target,
}

/// Fixed ground location parsed from catalogs.
#[derive(Debug, Deserialize, Clone)]
pub struct GroundLocationConfig {
    pub name: String,
    pub kind: LocationKindConfig,
    pub lat_deg: f64,
    pub lon_deg: f64,
    #[serde(default)]
    pub alt_m: f64,
    #[serde(default = "default_min_elevation")]
    pub min_elevation_deg: f64,
}

/// Per-episode environment arguments.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct EnvArgsConfig {
    #[serde(default)]
    pub utc_init: EpochSpec,
}

/// Opportunity forecaster settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    #[serde(default = "default_coarse_step")]
    pub coarse_step_s: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance_s: f64,
    #[serde(default = "default_horizon")]
    pub horizon_s: f64,
    #[serde(default = "default_windows_per_location")]
    pub windows_per_location: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            coarse_step_s: default_coarse_step(),
            tolerance_s: default_tolerance(),
            horizon_s: default_horizon(),
            windows_per_location: default_windows_per_location(),
        }
    }
}

/// Environment-level settings.
#[derive(Debug, Deserialize, Clone)]
pub struct EnvConfig {
    /// Micro-step size used while an action is executing.
    #[serde(default = "default_sim_rate")]
    pub sim_rate_s: f64,
    pub time_limit_s: f64,
    #[serde(default)]
    pub max_step_duration_s: Option<f64>,
    #[serde(default)]
    pub failure_penalty: f64,
    #[serde(default)]
    pub terminate_on_time_limit: bool,
    #[serde(default)]
    pub env_args: EnvArgsConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

impl EnvConfig {
    /// Check step sizes and forecast settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("sim_rate_s", self.sim_rate_s)?;
        positive("time_limit_s", self.time_limit_s)?;
        if let Some(max_step) = self.max_step_duration_s {
            positive("max_step_duration_s", max_step)?;
        }
        positive("forecast.coarse_step_s", self.forecast.coarse_step_s)?;
        positive("forecast.tolerance_s", self.forecast.tolerance_s)?;
        positive("forecast.horizon_s", self.forecast.horizon_s)?;
        if let EpochSpec::Choice { choices } = &self.env_args.utc_init {
            if choices.is_empty() {
                return Err(ConfigError::Invalid {
                    field: "env_args.utc_init",
                    reason: "choice list is empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("satellite `{0}` defines no actions")]
    EmptyActions(String),
}

/// Load satellite definitions from a YAML file, a TOML file or a directory of TOML files.
pub fn load_satellites<P: AsRef<Path>>(path: P) -> Result<Vec<SatelliteConfig>, ConfigError> {
    let satellites: Vec<SatelliteConfig> = load_records(path)?;
    for satellite in &satellites {
        satellite.validate()?;
    }
    Ok(satellites)
}

/// Load ground stations and targets.
pub fn load_ground_locations<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<GroundLocationConfig>, ConfigError> {
    load_records(path)
}

/// Load the environment settings from a single YAML or TOML document.
pub fn load_env_config<P: AsRef<Path>>(path: P) -> Result<EnvConfig, ConfigError> {
    let path = path.as_ref();
    let config: EnvConfig = if is_toml(path) {
        toml::from_str(&std::fs::read_to_string(path)?)?
    } else {
        serde_yaml::from_reader(File::open(path)?)?
    };
    config.validate()?;
    Ok(config)
}

fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_records(path)
    } else if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        let record: T = toml::from_str(&contents)?;
        Ok(vec![record])
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut records = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_toml(path))
        .collect();
    entries.sort();
    for path in entries {
        let contents = std::fs::read_to_string(&path)?;
        let record: T = toml::from_str(&contents)?;
        records.push(record);
    }
    Ok(records)
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|ext| ext == "toml").unwrap_or(false)
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} must be positive"),
        })
    }
}

fn zero() -> ParamSpec {
    ParamSpec::Fixed(0.0)
}

fn default_min_elevation() -> f64 {
    10.0
}

fn default_sim_rate() -> f64 {
    1.0
}

fn default_coarse_step() -> f64 {
    30.0
}

fn default_tolerance() -> f64 {
    0.5
}

fn default_horizon() -> f64 {
    6.0 * 3_600.0
}

fn default_windows_per_location() -> usize {
    1
}
