// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::airports::DistanceUnit;
use crate::flightplan::LoadOptions;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "aifp.json";
const MASTER_CACHE_FILE: &str = "master_airports_cache.json";

fn default_true() -> bool {
    true
}

/// User settings stored as `aifp.json` in the platform config directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AifpConfig {
    /// Large reference table used for airports missing from a flightplan.
    #[serde(default)]
    pub master_airports: Option<PathBuf>,
    /// Extra manufacturers/types merged ahead of the built-in taxonomy.
    #[serde(default)]
    pub user_taxonomy: Option<PathBuf>,
    #[serde(default)]
    pub distance_unit: DistanceUnit,
    #[serde(default = "default_true")]
    pub include_inactive: bool,
    #[serde(default)]
    pub allow_symbolic_ids: bool,
}

impl Default for AifpConfig {
    fn default() -> Self {
        Self {
            master_airports: None,
            user_taxonomy: None,
            distance_unit: DistanceUnit::default(),
            include_inactive: true,
            allow_symbolic_ids: false,
        }
    }
}

/// Platform config directory, or the working directory when none exists.
pub fn get_config_root() -> PathBuf {
    ProjectDirs::from("org", "aifp", "aifp-oxide")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

impl AifpConfig {
    pub fn default_path() -> PathBuf {
        get_config_root().join(CONFIG_FILE)
    }

    /// Where the parsed master table is persisted between runs.
    pub fn master_cache_path() -> PathBuf {
        get_config_root().join(MASTER_CACHE_FILE)
    }

    /// Loads the config at `path`, or the default location. A missing file
    /// gives the defaults; an unreadable one is logged and also gives the
    /// defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if !path.exists() {
            log::debug!("[Config] No config at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::read(&path) {
            Ok(config) => {
                log::debug!("[Config] Loaded {:?}", path);
                config
            }
            Err(e) => {
                log::warn!("[Config] {:#}; using defaults", e);
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            include_inactive: self.include_inactive,
            allow_symbolic_ids: self.allow_symbolic_ids,
        }
    }
}
