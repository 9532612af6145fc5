// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::airports::{Airport, AirportTable};
use crate::error::{DiagnosticSink, Diagnostics, FlightplanError, InputFile};
use crate::fleet::{classify_roster, AircraftType, Classification};
use crate::master::{AirportResolver, MasterAirportCache};
use crate::roster::{AircraftId, AircraftLivery, Roster, RosterOptions};
use crate::routes::{AirportPairRoute, RouteIndex};
use crate::timetable::{count_scheduled_aircraft, parse_timetable, Aircraft};
use aifp_taxonomy::DecisionList;
use anyhow::Context;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The three companion files of one flightplan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightplanPaths {
    pub aircraft: PathBuf,
    pub airports: PathBuf,
    pub flightplans: PathBuf,
}

impl FlightplanPaths {
    /// Finds `Aircraft*.txt`, `Airports*.txt` and `Flightplans*.txt` in `dir`
    /// (case-insensitive, first by name). The airports file may be absent;
    /// its default location is used so a master table can stand in.
    pub fn discover(dir: &Path) -> Result<Self, FlightplanError> {
        let mut aircraft = None;
        let mut airports = None;
        let mut flightplans = None;

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if !name.ends_with(".txt") {
                continue;
            }
            let slot = if name.starts_with("aircraft") {
                &mut aircraft
            } else if name.starts_with("airports") {
                &mut airports
            } else if name.starts_with("flightplans") {
                &mut flightplans
            } else {
                continue;
            };
            if slot.is_none() {
                *slot = Some(entry.into_path());
            }
        }

        let paths = Self {
            aircraft: aircraft
                .ok_or_else(|| FlightplanError::MissingInputFile(dir.join("Aircraft.txt")))?,
            airports: airports.unwrap_or_else(|| dir.join("Airports.txt")),
            flightplans: flightplans
                .ok_or_else(|| FlightplanError::MissingInputFile(dir.join("Flightplans.txt")))?,
        };
        log::debug!("[Flightplan] Discovered {:?}", paths);
        Ok(paths)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub include_inactive: bool,
    pub allow_symbolic_ids: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            include_inactive: true,
            allow_symbolic_ids: false,
        }
    }
}

impl LoadOptions {
    fn roster(&self) -> RosterOptions {
        RosterOptions {
            include_inactive: self.include_inactive,
            allow_symbolic_ids: self.allow_symbolic_ids,
        }
    }
}

/// One loaded schedule: owns its airports, roster, aircraft and routes.
#[derive(Debug)]
pub struct Flightplan {
    paths: FlightplanPaths,
    airports: AirportTable,
    roster: Roster,
    classification: Classification,
    aircraft: Vec<Aircraft>,
    referenced_codes: BTreeSet<String>,
    routes: RouteIndex,
    imported_airports: Vec<String>,
}

/// A flightplan together with every non-fatal problem found loading it.
#[derive(Debug)]
pub struct LoadedFlightplan {
    pub flightplan: Flightplan,
    pub diagnostics: Diagnostics,
}

fn open_input(path: &Path) -> Result<File, FlightplanError> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => FlightplanError::MissingInputFile(path.to_path_buf()),
        _ => FlightplanError::Io(e),
    })
}

impl Flightplan {
    /// Loads and analyses a flightplan. Every diagnostic collected is also
    /// handed to `sink`, whether or not the load succeeds.
    pub fn load(
        paths: &FlightplanPaths,
        decisions: &DecisionList,
        master: Option<&mut MasterAirportCache>,
        options: &LoadOptions,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<LoadedFlightplan, FlightplanError> {
        let mut diagnostics = Diagnostics::new();
        let result = Self::load_inner(paths, decisions, master, options, &mut diagnostics);
        diagnostics.report_to(sink);

        match result {
            Ok(flightplan) => {
                log::info!(
                    "[Flightplan] Loaded {:?}: {} aircraft, {} routes, {} diagnostics",
                    paths.flightplans,
                    flightplan.aircraft.len(),
                    flightplan.routes.pairs().len(),
                    diagnostics.len()
                );
                Ok(LoadedFlightplan {
                    flightplan,
                    diagnostics,
                })
            }
            Err(e) => {
                log::error!("[Flightplan] Load of {:?} failed: {}", paths.flightplans, e);
                Err(e)
            }
        }
    }

    fn load_inner(
        paths: &FlightplanPaths,
        decisions: &DecisionList,
        master: Option<&mut MasterAirportCache>,
        options: &LoadOptions,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, FlightplanError> {
        let mut airports = if paths.airports.is_file() {
            let (table, errors) = AirportTable::parse_file(&paths.airports)?;
            for (line, err) in errors {
                diagnostics.push(InputFile::Airports, Some(line), err.into());
            }
            if table.is_empty() && master.is_none() {
                return Err(FlightplanError::AirportsUnavailable(paths.airports.clone()));
            }
            table
        } else if master.is_some() {
            log::info!(
                "[Flightplan] {:?} missing, resolving airports from the master table",
                paths.airports
            );
            AirportTable::new()
        } else {
            return Err(FlightplanError::AirportsUnavailable(paths.airports.clone()));
        };

        let mut schedule = String::new();
        open_input(&paths.flightplans)?.read_to_string(&mut schedule)?;
        let counts = count_scheduled_aircraft(&schedule, options.allow_symbolic_ids);

        let mut roster = Roster::parse(
            BufReader::new(open_input(&paths.aircraft)?),
            options.roster(),
        )?;
        roster.apply_observed_counts(&counts);

        let classification = classify_roster(&mut roster, decisions, diagnostics);

        let mut resolver = AirportResolver::new(&mut airports, master);
        let timetable = parse_timetable(
            schedule.as_bytes(),
            &mut resolver,
            options.allow_symbolic_ids,
            diagnostics,
        )?;
        let imported_airports = resolver.imported().to_vec();

        for aircraft in &timetable.aircraft {
            if roster.get(&aircraft.id).is_none() {
                diagnostics.push(
                    InputFile::Flightplans,
                    Some(aircraft.line),
                    FlightplanError::UnknownAircraft {
                        id: aircraft.id.clone(),
                    },
                );
            }
        }

        let routes = RouteIndex::build(
            &timetable.aircraft,
            |id| roster.get(id).and_then(|l| l.type_code.as_deref()),
            &mut airports,
        );

        Ok(Self {
            paths: paths.clone(),
            airports,
            roster,
            classification,
            aircraft: timetable.aircraft,
            referenced_codes: timetable.referenced_codes,
            routes,
            imported_airports,
        })
    }

    pub fn paths(&self) -> &FlightplanPaths {
        &self.paths
    }

    pub fn airport(&self, code: &str) -> Option<&Airport> {
        self.airports.get(code)
    }

    pub fn airports(&self) -> &AirportTable {
        &self.airports
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn aircraft(&self) -> &[Aircraft] {
        &self.aircraft
    }

    pub fn routes(&self) -> &[AirportPairRoute] {
        self.routes.pairs()
    }

    pub fn route_index(&self) -> &RouteIndex {
        &self.routes
    }

    pub fn routes_for_airport(&self, code: &str) -> Vec<&AirportPairRoute> {
        self.routes.for_airport(code)
    }

    pub fn routes_for_type(&self, type_code: &str) -> Vec<&AirportPairRoute> {
        self.routes.for_type(type_code)
    }

    pub fn type_for_aircraft(&self, id: &AircraftId) -> Option<&AircraftType> {
        let code = self.roster.get(id)?.type_code.as_deref()?;
        self.classification.get(code)
    }

    /// Active liveries no schedule line refers to.
    pub fn unscheduled_liveries(&self) -> Vec<&AircraftLivery> {
        self.roster
            .active
            .values()
            .filter(|l| l.observed_count == 0)
            .collect()
    }

    /// Every destination code named by the schedule, resolved or not.
    pub fn referenced_airport_codes(&self) -> &BTreeSet<String> {
        &self.referenced_codes
    }

    /// Codes that were missing locally and came from the master table.
    pub fn imported_airports(&self) -> &[String] {
        &self.imported_airports
    }

    /// Builds a fresh airports file holding exactly the airports the
    /// schedule references, sorted by code. Codes found neither locally nor
    /// in `master` are reported and left out.
    pub fn regenerate_airports(
        &self,
        master: Option<&mut MasterAirportCache>,
    ) -> (String, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let mut local = self.airports.clone();
        let mut resolver = AirportResolver::new(&mut local, master);

        let mut table = AirportTable::new();
        for code in &self.referenced_codes {
            match resolver.resolve(code, &mut diagnostics) {
                Some(airport) => {
                    table.insert(airport);
                }
                None => diagnostics.push(
                    InputFile::Flightplans,
                    None,
                    FlightplanError::UnresolvableAirport { code: code.clone() },
                ),
            }
        }

        log::info!(
            "[Airports] Regenerated {} of {} referenced airports",
            table.len(),
            self.referenced_codes.len()
        );
        (table.to_file_string(), diagnostics)
    }
}

/// Overwrites an airports file, keeping the previous one as `.bak`.
pub fn write_airports_file<P: AsRef<Path>>(path: P, content: &str) -> anyhow::Result<()> {
    let path = path.as_ref();
    if path.exists() {
        let bak_path = path.with_extension("bak");
        fs::copy(path, &bak_path).context("Failed to create airports backup")?;
    }

    let mut file = File::create(path).context("Failed to create airports file")?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
