// tollgate-core/src/application/clean.rs

use crate::domain::project::ProjectConfig;
use crate::error::TollgateError;
use std::fs;
use std::path::{Component, Path};

/// Removes the configured derived artifacts (silver, quarantine, gold, logs).
/// Bronze input is never a default target. Returns the targets actually removed.
pub fn clean_project(project_dir: &Path, config: &ProjectConfig) -> Result<Vec<String>, TollgateError> {
    tracing::info!("🧹 Initializing tollgate cleanup sequence...");

    // Zero-Trust Path Traversal Guard (checked for every target before deleting anything)
    for target in &config.clean_targets {
        let rel = Path::new(target);
        let escapes = rel.is_absolute()
            || rel
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if escapes || target.trim().is_empty() {
            return Err(TollgateError::UnsafePath(target.clone()));
        }
    }

    let mut removed = Vec::new();
    for target in &config.clean_targets {
        let full_path = project_dir.join(target);
        if !full_path.exists() {
            continue;
        }
        if full_path.is_dir() {
            fs::remove_dir_all(&full_path)?;
        } else {
            fs::remove_file(&full_path)?;
        }
        println!("   🗑️  Artifact removed: {}", target);
        removed.push(target.clone());
    }

    Ok(removed)
}
