//! Discrete action catalog exposed to the policy.

use std::fmt;

use serde::Serialize;
use tasking_config::{ActionConfig, ActionKindConfig};
use tasking_dynamics::{ControlMode, GroundLocation, LocationId, LocationKind};

use crate::EnvError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Drift,
    Charge,
    Scan,
    Downlink,
    Desaturate,
}

impl ActionKind {
    pub fn required_mode(self) -> ControlMode {
        match self {
            ActionKind::Drift => ControlMode::Drift,
            ActionKind::Charge => ControlMode::SunPoint,
            ActionKind::Scan => ControlMode::NadirScan,
            ActionKind::Downlink => ControlMode::GroundLink,
            ActionKind::Desaturate => ControlMode::Desaturate,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActionKind::Drift => "drift",
            ActionKind::Charge => "charge",
            ActionKind::Scan => "scan",
            ActionKind::Downlink => "downlink",
            ActionKind::Desaturate => "desaturate",
        };
        f.write_str(label)
    }
}

impl From<ActionKindConfig> for ActionKind {
    fn from(kind: ActionKindConfig) -> Self {
        match kind {
            ActionKindConfig::Drift => ActionKind::Drift,
            ActionKindConfig::Charge => ActionKind::Charge,
            ActionKindConfig::Scan => ActionKind::Scan,
            ActionKindConfig::Downlink => ActionKind::Downlink,
            ActionKindConfig::Desaturate => ActionKind::Desaturate,
        }
    }
}

/// Whether an action needs an open opportunity window to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gating {
    None,
    /// Runs while any of these locations is visible.
    Windows(Vec<LocationId>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionSpec {
    pub id: usize,
    pub kind: ActionKind,
    pub required_mode: ControlMode,
    pub target_duration_s: f64,
    pub gating: Gating,
}

/// Immutable, ordered action list; the position is the discrete action index.
#[derive(Debug, Clone)]
pub struct ActionCatalog {
    actions: Vec<ActionSpec>,
}

impl ActionCatalog {
    pub fn new(actions: Vec<ActionSpec>) -> Result<Self, EnvError> {
        if actions.is_empty() {
            return Err(EnvError::EmptyCatalog);
        }
        Ok(Self { actions })
    }

    /// Resolve configured actions against the ground catalog.
    ///
    /// Downlinks without explicit locations are gated on every station; other kinds
    /// are only gated when locations are listed.
    pub fn from_config(
        configs: &[ActionConfig],
        locations: &[GroundLocation],
    ) -> Result<Self, EnvError> {
        let mut actions = Vec::with_capacity(configs.len());
        for (id, config) in configs.iter().enumerate() {
            let kind = ActionKind::from(config.kind);
            let gating = if !config.locations.is_empty() {
                let ids = config
                    .locations
                    .iter()
                    .map(|name| {
                        locations
                            .iter()
                            .position(|loc| &loc.name == name)
                            .ok_or_else(|| EnvError::UnknownLocation(name.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Gating::Windows(ids)
            } else if kind == ActionKind::Downlink {
                Gating::Windows(
                    locations
                        .iter()
                        .enumerate()
                        .filter(|(_, loc)| loc.kind == LocationKind::Station)
                        .map(|(id, _)| id)
                        .collect(),
                )
            } else {
                Gating::None
            };
            actions.push(ActionSpec {
                id,
                kind,
                required_mode: kind.required_mode(),
                target_duration_s: config.duration_s,
                gating,
            });
        }
        Self::new(actions)
    }

    pub fn get(&self, id: usize) -> Option<&ActionSpec> {
        self.actions.get(id)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionSpec> {
        self.actions.iter()
    }
}
