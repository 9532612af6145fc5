// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod data;
pub mod matcher;

pub use matcher::{DecisionList, MatchCache, SearchTerm, TypeInfo, TypeMatch, TypeMatcher};

#[derive(Error, Debug)]
pub enum TaxonomyError {
    #[error("Invalid pattern '{pattern}' for {owner}: {source}")]
    InvalidPattern {
        owner: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Taxonomy file {path:?} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One aircraft type under a manufacturer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeEntry {
    /// ICAO type designator, e.g. `B738`.
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    /// Literal substrings, or `[regex]` pattern rules.
    #[serde(default)]
    pub search: Vec<String>,
    /// Extra pattern rule tested after all search terms.
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub wingspan: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub name: String,
    #[serde(default)]
    pub search: Vec<String>,
    #[serde(default)]
    pub types: Vec<TypeEntry>,
}

/// Manufacturer → type → search term reference data.
///
/// Declaration order is significant: the first manufacturer/type/term
/// combination that matches a title wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(default)]
    pub manufacturers: Vec<Manufacturer>,
}

impl Taxonomy {
    /// The taxonomy shipped with the crate.
    pub fn builtin() -> Self {
        data::builtin_taxonomy()
    }

    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn load(path: &Path) -> Result<Self, TaxonomyError> {
        log::debug!("[Taxonomy] Loading user taxonomy from: {:?}", path);
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| {
            log::error!("[Taxonomy] JSON parse error for {:?}: {}", path, source);
            TaxonomyError::Json {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Built-in taxonomy with the user file layered on top, or the built-in
    /// one alone when no user file is configured.
    pub fn load_merged(user_path: Option<&Path>) -> Result<Self, TaxonomyError> {
        let builtin = Self::builtin();
        match user_path {
            Some(path) => Ok(builtin.merged_with(Self::load(path)?)),
            None => Ok(builtin),
        }
    }

    /// Layers `user` over `self`.
    ///
    /// User manufacturers come first, in user order. A user manufacturer that
    /// shares a name with an existing one absorbs it: search terms are
    /// unioned (user terms first) and user types precede the remaining
    /// existing types, replacing any with the same code. Manufacturers the
    /// user does not mention keep their relative order after the user's.
    pub fn merged_with(self, user: Taxonomy) -> Taxonomy {
        let mut remaining = self.manufacturers;
        let mut manufacturers = Vec::with_capacity(remaining.len() + user.manufacturers.len());

        for user_mfr in user.manufacturers {
            let existing = remaining
                .iter()
                .position(|m| m.name.eq_ignore_ascii_case(&user_mfr.name))
                .map(|idx| remaining.remove(idx));

            let merged = match existing {
                Some(base) => merge_manufacturer(user_mfr, base),
                None => user_mfr,
            };
            manufacturers.push(merged);
        }

        manufacturers.extend(remaining);
        Taxonomy { manufacturers }
    }

    pub fn type_count(&self) -> usize {
        self.manufacturers.iter().map(|m| m.types.len()).sum()
    }
}

fn merge_manufacturer(user: Manufacturer, base: Manufacturer) -> Manufacturer {
    let mut seen = HashSet::new();
    let search = user
        .search
        .into_iter()
        .chain(base.search)
        .filter(|term| seen.insert(term.to_lowercase()))
        .collect();

    let user_codes: HashSet<String> = user.types.iter().map(|t| t.code.clone()).collect();
    let mut types = user.types;
    types.extend(
        base.types
            .into_iter()
            .filter(|t| !user_codes.contains(&t.code)),
    );

    Manufacturer {
        name: user.name,
        search,
        types,
    }
}
