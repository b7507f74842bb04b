// src/domain/project/configuration.rs

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::error::DomainError;
use crate::domain::gold::GoldConfig;
use crate::domain::quality::RuleSet;
use crate::domain::routing::RoutingPolicy;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(rename = "data-path", default = "default_data_path")]
    pub data_path: String,

    #[serde(rename = "logs-path", default = "default_logs_path")]
    pub logs_path: String,

    #[serde(rename = "config-paths", default = "default_config_paths")]
    pub config_paths: Vec<String>,

    #[serde(rename = "clean-targets", default = "default_clean_targets")]
    pub clean_targets: Vec<String>,

    /// Batches processed at the same time.
    #[serde(rename = "max-concurrency", default = "default_concurrency")]
    pub max_concurrency: usize,

    #[serde(default)]
    pub rules: RuleSet,

    /// No default: the duplicate-id policy has to be spelled out.
    #[serde(default)]
    pub routing: Option<RoutingPolicy>,

    #[serde(default)]
    pub gold: GoldConfig,
}

fn default_version() -> String {
    "0.1.0".to_string()
}
fn default_data_path() -> String {
    "data".to_string()
}
fn default_logs_path() -> String {
    "logs".to_string()
}
fn default_config_paths() -> Vec<String> {
    vec!["config".to_string()]
}
fn default_clean_targets() -> Vec<String> {
    vec![
        "data/silver".to_string(),
        "data/quarantine".to_string(),
        "data/gold".to_string(),
        "logs".to_string(),
    ]
}
fn default_concurrency() -> usize {
    4
}

/// Resolved tier directories of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub bronze: PathBuf,
    pub silver: PathBuf,
    pub quarantine: PathBuf,
    pub gold: PathBuf,
    pub logs: PathBuf,
}

impl ProjectConfig {
    pub fn routing_policy(&self) -> Result<&RoutingPolicy, DomainError> {
        self.routing.as_ref().ok_or_else(|| {
            DomainError::InvalidRoutingPolicy(
                "no routing section found; `duplicate_ids: keep | keep_first` is required"
                    .to_string(),
            )
        })
    }

    /// Every section checked up front, before any batch is touched.
    pub fn ensure_valid(&self) -> Result<(), DomainError> {
        self.rules.ensure_valid()?;
        self.routing_policy()?.ensure_valid()?;
        self.gold.ensure_valid()?;
        Ok(())
    }

    pub fn layout(&self, project_dir: &Path) -> ProjectLayout {
        let data = project_dir.join(&self.data_path);
        ProjectLayout {
            bronze: data.join("bronze"),
            silver: data.join("silver"),
            quarantine: data.join("quarantine"),
            gold: data.join("gold"),
            logs: project_dir.join(&self.logs_path),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::routing::DuplicateIds;

    #[test]
    fn test_minimal_config_defaults() -> anyhow::Result<()> {
        let config: ProjectConfig = serde_yaml::from_str("name: sales\n")?;
        assert_eq!(config.data_path, "data");
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.gold, GoldConfig::default());
        assert!(config.routing_policy().is_err());

        let layout = config.layout(Path::new("/p"));
        assert_eq!(layout.bronze, PathBuf::from("/p/data/bronze"));
        assert_eq!(layout.logs, PathBuf::from("/p/logs"));
        Ok(())
    }

    #[test]
    fn test_inline_sections() -> anyhow::Result<()> {
        let yaml = r#"
name: sales
data-path: lake
routing:
  duplicate_ids: keep_first
  amount_ceiling: 1000
rules:
  required_columns: [id]
"#;
        let config: ProjectConfig = serde_yaml::from_str(yaml)?;
        config.ensure_valid()?;
        let policy = config.routing_policy()?;
        assert_eq!(policy.duplicate_ids, DuplicateIds::KeepFirst);
        assert_eq!(policy.amount_ceiling, 1000.0);
        assert_eq!(config.rules.required_columns, vec!["id"]);
        Ok(())
    }
}
