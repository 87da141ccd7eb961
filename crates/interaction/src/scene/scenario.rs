use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::scene::{
    InteractableConfig, InteractableId, InteractionWorld, InteractorConfig, InteractorId,
};

pub const SCENARIO_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write scenario file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("unsupported scenario version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("duplicate scenario slot '{slot}'")]
    DuplicateSlot { slot: String },
    #[error("dependency references unknown slot '{slot}'")]
    UnknownSlot { slot: String },
}

/// One interactable definition, addressed by a stable slot name so that
/// dependency edges can reference it before ids exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInteractable {
    pub slot: String,
    #[serde(default)]
    pub config: InteractableConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInteractor {
    pub slot: String,
    #[serde(default)]
    pub config: InteractorConfig,
}

/// Directed edge: `dependent` is gated by `master`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioDependency {
    pub dependent: String,
    pub master: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioFile {
    pub scenario_version: u32,
    #[serde(default)]
    pub interactables: Vec<ScenarioInteractable>,
    #[serde(default)]
    pub interactors: Vec<ScenarioInteractor>,
    #[serde(default)]
    pub dependencies: Vec<ScenarioDependency>,
}

#[derive(Debug, Default)]
pub struct SpawnedScenario {
    pub interactables: BTreeMap<String, InteractableId>,
    pub interactors: BTreeMap<String, InteractorId>,
}

impl ScenarioFile {
    pub fn new() -> Self {
        Self {
            scenario_version: SCENARIO_VERSION,
            interactables: Vec::new(),
            interactors: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = serde_json::from_str(raw).map_err(ScenarioError::Parse)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ScenarioError> {
        let raw = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), ScenarioError> {
        let raw = serde_json::to_string_pretty(self).map_err(ScenarioError::Parse)?;
        fs::write(path, raw).map_err(|source| ScenarioError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.scenario_version != SCENARIO_VERSION {
            return Err(ScenarioError::UnsupportedVersion {
                found: self.scenario_version,
                expected: SCENARIO_VERSION,
            });
        }

        let mut seen = BTreeMap::new();
        for entry in &self.interactables {
            if seen.insert(entry.slot.clone(), ()).is_some() {
                return Err(ScenarioError::DuplicateSlot {
                    slot: entry.slot.clone(),
                });
            }
        }
        for entry in &self.interactors {
            if seen.insert(entry.slot.clone(), ()).is_some() {
                return Err(ScenarioError::DuplicateSlot {
                    slot: entry.slot.clone(),
                });
            }
        }

        for edge in &self.dependencies {
            for slot in [&edge.dependent, &edge.master] {
                let known = self
                    .interactables
                    .iter()
                    .any(|entry| &entry.slot == slot);
                if !known {
                    return Err(ScenarioError::UnknownSlot { slot: slot.clone() });
                }
            }
        }

        Ok(())
    }

    /// Spawns everything into the world and wires the dependency edges,
    /// returning the slot-to-id mapping.
    pub fn apply(&self, world: &mut InteractionWorld) -> Result<SpawnedScenario, ScenarioError> {
        self.validate()?;

        let mut spawned = SpawnedScenario::default();
        for entry in &self.interactables {
            let id = world.spawn_interactable(entry.config.clone());
            spawned.interactables.insert(entry.slot.clone(), id);
        }
        for entry in &self.interactors {
            let id = world.spawn_interactor(entry.config.clone());
            spawned.interactors.insert(entry.slot.clone(), id);
        }
        for edge in &self.dependencies {
            if let (Some(&dependent), Some(&master)) = (
                spawned.interactables.get(&edge.dependent),
                spawned.interactables.get(&edge.master),
            ) {
                world.add_dependency(dependent, master);
            }
        }

        info!(
            interactables = self.interactables.len(),
            interactors = self.interactors.len(),
            dependencies = self.dependencies.len(),
            "scenario_applied"
        );
        Ok(spawned)
    }
}

impl Default for ScenarioFile {
    fn default() -> Self {
        Self::new()
    }
}
