// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::errors::AutoscaleError;

const APP_DIR_NAME: &str = "ccslurm";
const CONFIG_FILE_NAME: &str = "ccslurm.json";

/// Connection settings for the cluster manager, persisted as a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    pub cluster_name: String,
    pub username: String,
    pub password: String,
    pub url: String,
}

/// Write the settings file. An existing file is only replaced when `force`
/// is set; otherwise the file is left untouched and the caller is told how
/// to override.
pub fn initialize(path: &Path, settings: &ConnectionSettings, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(AutoscaleError::ReinitNotForced {
            path: path.to_path_buf(),
        }
        .into());
    }
    let contents = serde_json::to_string_pretty(settings)?;
    fs::write(path, contents)
        .with_context(|| format!("failed to write settings file {}", path.display()))?;
    Ok(())
}

pub fn load(path: &Path) -> Result<ConnectionSettings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse settings file {}", path.display()))
}

pub fn resolve_path(path_override: Option<PathBuf>) -> Result<PathBuf> {
    match path_override {
        Some(path) => Ok(path),
        None => {
            let base = dirs::config_dir().context("failed to resolve config directory")?;
            Ok(base.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(suffix: &str) -> ConnectionSettings {
        ConnectionSettings {
            cluster_name: format!("c{suffix}"),
            username: format!("u{suffix}"),
            password: format!("p{suffix}"),
            url: format!("https://url{suffix}"),
        }
    }

    #[test]
    fn initialize_writes_and_loads_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ccslurm.json");

        initialize(&path, &settings("1"), false).unwrap();
        assert_eq!(load(&path).unwrap(), settings("1"));
    }

    #[test]
    fn reinitialize_without_force_fails_and_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ccslurm.json");
        initialize(&path, &settings("1"), false).unwrap();

        let err = initialize(&path, &settings("2"), false).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AutoscaleError>(),
            Some(&AutoscaleError::ReinitNotForced { path: path.clone() })
        );
        // the override flag has to be discoverable from the message
        assert!(err.to_string().contains("--force"));
        assert_eq!(load(&path).unwrap(), settings("1"));
    }

    #[test]
    fn reinitialize_with_force_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ccslurm.json");
        initialize(&path, &settings("1"), false).unwrap();

        initialize(&path, &settings("2"), true).unwrap();
        assert_eq!(load(&path).unwrap(), settings("2"));
    }
}
