use std::collections::BTreeMap;
use std::fs;

use interaction::{
    InteractableConfig, InteractableId, InteractionWorld, InteractorConfig, InteractorId,
    LifecycleMode, ScenarioDependency, ScenarioFile, ScenarioInteractable, ScenarioInteractor,
    SCENARIO_VERSION,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const SCENARIO_ENV_VAR: &str = "INTERACTION_SCENARIO";

pub(crate) struct AppWiring {
    pub(crate) world: InteractionWorld,
    pub(crate) interactables: BTreeMap<String, InteractableId>,
    pub(crate) interactors: BTreeMap<String, InteractorId>,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Interaction Sandbox Startup ===");

    let scenario = load_scenario_from_env().unwrap_or_else(builtin_scenario);

    let mut world = InteractionWorld::new();
    match scenario.apply(&mut world) {
        Ok(spawned) => AppWiring {
            world,
            interactables: spawned.interactables,
            interactors: spawned.interactors,
        },
        Err(err) => {
            error!(error = %err, "scenario_apply_failed");
            let mut world = InteractionWorld::new();
            let spawned = builtin_scenario()
                .apply(&mut world)
                .expect("builtin scenario is valid");
            AppWiring {
                world,
                interactables: spawned.interactables,
                interactors: spawned.interactors,
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_scenario_from_env() -> Option<ScenarioFile> {
    let path = std::env::var(SCENARIO_ENV_VAR).ok()?;
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) => {
            error!(path, error = %err, "scenario_read_failed");
            return None;
        }
    };

    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    match serde_path_to_error::deserialize::<_, ScenarioFile>(&mut deserializer) {
        Ok(scenario) => {
            info!(path, "scenario_loaded");
            Some(scenario)
        }
        Err(err) => {
            error!(path, at = %err.path(), error = %err, "scenario_parse_failed");
            None
        }
    }
}

/// A lever that cycles three times before completing for good, gating a
/// one-shot door, driven by a single auto-activated player.
pub(crate) fn builtin_scenario() -> ScenarioFile {
    ScenarioFile {
        scenario_version: SCENARIO_VERSION,
        interactables: vec![
            ScenarioInteractable {
                slot: "lever".to_string(),
                config: InteractableConfig {
                    display_name: "rusty lever".to_string(),
                    lifecycle_count: 3,
                    interaction_period_seconds: 1.5,
                    cooldown_period_seconds: 3.0,
                    weight: 5,
                    ..InteractableConfig::default()
                },
            },
            ScenarioInteractable {
                slot: "door".to_string(),
                config: InteractableConfig {
                    display_name: "vault door".to_string(),
                    lifecycle_mode: LifecycleMode::OnlyOnce,
                    interaction_period_seconds: 2.0,
                    weight: 5,
                    ..InteractableConfig::default()
                },
            },
        ],
        interactors: vec![ScenarioInteractor {
            slot: "player".to_string(),
            config: InteractorConfig {
                auto_activate: true,
                ..InteractorConfig::default()
            },
        }],
        dependencies: vec![ScenarioDependency {
            dependent: "door".to_string(),
            master: "lever".to_string(),
        }],
    }
}
