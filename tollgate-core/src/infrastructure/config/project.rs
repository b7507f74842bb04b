// tollgate-core/src/infrastructure/config/project.rs

use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::domain::gold::GoldConfig;
use crate::domain::project::configuration::ProjectConfig;
use crate::domain::quality::RuleSet;
use crate::domain::routing::RoutingPolicy;
use crate::infrastructure::error::InfrastructureError;

pub const CONFIG_CANDIDATES: [&str; 2] = ["tollgate.yaml", "tollgate.yml"];

/// Environment overrides, read once by the caller and applied on top of the files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub data_path: Option<String>,
    pub logs_path: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            data_path: std::env::var("TOLLGATE_DATA_PATH").ok(),
            logs_path: std::env::var("TOLLGATE_LOGS_PATH").ok(),
        }
    }
}

// --- LOADER ---

#[instrument(skip(project_dir))]
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    load_project_config_with(project_dir, &EnvOverrides::from_env())
}

pub fn load_project_config_with(
    project_dir: &Path,
    overrides: &EnvOverrides,
) -> Result<ProjectConfig, InfrastructureError> {
    // 1. Main file
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project configuration");
    let mut config: ProjectConfig = load_fragment(&config_path)?;

    // 2. Satellites (rules.yml, routing.yml, gold.yml) override inline sections
    for folder in config.config_paths.clone() {
        let config_dir = project_dir.join(folder);
        if config_dir.is_dir() {
            load_satellite_configs(&mut config, &config_dir)?;
        }
    }

    // 3. Layering ENV (e.g. TOLLGATE_DATA_PATH=/mnt/lake tollgate run)
    apply_env_overrides(&mut config, overrides);

    Ok(config)
}

pub fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    for filename in CONFIG_CANDIDATES {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, CONFIG_CANDIDATES
    )))
}

/// Loads one typed YAML fragment.
fn load_fragment<T: DeserializeOwned>(path: &Path) -> Result<T, InfrastructureError> {
    let content = fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|source| InfrastructureError::Yaml {
        path: path.display().to_string(),
        source,
    })
}

fn load_satellite_configs(
    config: &mut ProjectConfig,
    config_dir: &Path,
) -> Result<(), InfrastructureError> {
    // A. Rules
    let rules_path = config_dir.join("rules.yml");
    if rules_path.exists() {
        config.rules = load_fragment::<RuleSet>(&rules_path)?;
        info!("  ✅ Validation rules loaded");
    }

    // B. Routing
    let routing_path = config_dir.join("routing.yml");
    if routing_path.exists() {
        config.routing = Some(load_fragment::<RoutingPolicy>(&routing_path)?);
        info!("  🔀 Routing policy loaded");
    }

    // C. Gold views
    let gold_path = config_dir.join("gold.yml");
    if gold_path.exists() {
        config.gold = load_fragment::<GoldConfig>(&gold_path)?;
        info!("  🥇 Gold views loaded");
    }

    Ok(())
}

fn apply_env_overrides(config: &mut ProjectConfig, overrides: &EnvOverrides) {
    if let Some(val) = &overrides.data_path {
        info!(old = ?config.data_path, new = ?val, "Overriding data path via ENV");
        config.data_path = val.clone();
    }
    if let Some(val) = &overrides.logs_path {
        info!(old = ?config.logs_path, new = ?val, "Overriding logs path via ENV");
        config.logs_path = val.clone();
    }
}
