// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::airports::{Airport, AirportTable};
use crate::error::{Diagnostics, FlightplanError, InputFile};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CURRENT_CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MasterEntry {
    mtime: DateTime<Utc>,
    table: AirportTable,
}

/// Parsed master airport table, reparsed only when the source file's
/// modification time changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterAirportCache {
    #[serde(default)]
    version: u32,
    source: PathBuf,
    entry: Option<MasterEntry>,
    #[serde(skip)]
    reloads: u32,
}

impl MasterAirportCache {
    pub fn new<P: Into<PathBuf>>(source: P) -> Self {
        Self {
            version: CURRENT_CACHE_VERSION,
            source: source.into(),
            entry: None,
            reloads: 0,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// How many times the source has been parsed by this instance.
    pub fn reloads(&self) -> u32 {
        self.reloads
    }

    pub fn get(&mut self) -> Result<&AirportTable, FlightplanError> {
        let metadata = match std::fs::metadata(&self.source) {
            Ok(m) if m.is_file() => m,
            _ => {
                self.entry = None;
                return Err(FlightplanError::MasterAirportFileMissing(self.source.clone()));
            }
        };
        let mtime: DateTime<Utc> = metadata.modified()?.into();

        let entry = match self.entry.take() {
            Some(entry) if entry.mtime == mtime => {
                log::debug!("[MasterCache] Using cached table for {:?}", self.source);
                entry
            }
            _ => {
                log::info!("[MasterCache] Parsing master airports {:?}", self.source);
                let (table, errors) = AirportTable::parse_file(&self.source)?;
                if table.is_empty() && (!errors.is_empty() || metadata.len() > 0) {
                    return Err(FlightplanError::MasterAirportFileUnparseable(
                        self.source.clone(),
                    ));
                }
                if !errors.is_empty() {
                    log::warn!(
                        "[MasterCache] Skipped {} malformed lines in {:?}",
                        errors.len(),
                        self.source
                    );
                }
                self.reloads += 1;
                MasterEntry { mtime, table }
            }
        };

        Ok(&self.entry.insert(entry).table)
    }

    /// Reads a persisted cache for `source`. A missing, unreadable,
    /// outdated or foreign cache file yields an empty cache.
    pub fn load(cache_file: &Path, source: &Path) -> Self {
        if let Ok(content) = std::fs::read_to_string(cache_file) {
            match serde_json::from_str::<MasterAirportCache>(&content) {
                Ok(cache) if cache.version == CURRENT_CACHE_VERSION && cache.source == source => {
                    log::debug!("[MasterCache] Loaded persisted cache from {:?}", cache_file);
                    return cache;
                }
                Ok(_) => log::info!("[MasterCache] Discarding stale cache {:?}", cache_file),
                Err(e) => log::warn!("[MasterCache] Unreadable cache {:?}: {}", cache_file, e),
            }
        }
        Self::new(source)
    }

    pub fn save(&self, cache_file: &Path) -> Result<()> {
        if let Some(parent) = cache_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string(self)?;
        std::fs::write(cache_file, content)?;
        Ok(())
    }
}

/// Looks airports up in a flightplan's own table, falling back to the
/// master table. Master hits are copied into the local table.
pub struct AirportResolver<'a> {
    local: &'a mut AirportTable,
    master: Option<&'a mut MasterAirportCache>,
    master_failed: bool,
    imported: Vec<String>,
}

impl<'a> AirportResolver<'a> {
    pub fn new(local: &'a mut AirportTable, master: Option<&'a mut MasterAirportCache>) -> Self {
        Self {
            local,
            master,
            master_failed: false,
            imported: Vec::new(),
        }
    }

    /// A failing master is reported once; later lookups skip it.
    pub fn resolve(&mut self, code: &str, diagnostics: &mut Diagnostics) -> Option<Airport> {
        let code = code.trim().to_uppercase();
        if let Some(airport) = self.local.get(&code) {
            return Some(airport.clone());
        }
        if self.master_failed {
            return None;
        }
        let master = self.master.as_deref_mut()?;

        match master.get() {
            Ok(table) => {
                let mut airport = table.get(&code)?.clone();
                airport.visit_count = 0;
                log::debug!("[MasterCache] Resolved {} from master table", code);
                self.local.insert(airport.clone());
                self.imported.push(code);
                Some(airport)
            }
            Err(err) => {
                log::warn!("[MasterCache] {}", err);
                self.master_failed = true;
                diagnostics.push(InputFile::Master, None, err);
                None
            }
        }
    }

    /// Codes copied from the master table, in resolution order.
    pub fn imported(&self) -> &[String] {
        &self.imported
    }
}
