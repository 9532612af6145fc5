// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::airports::AirportError;
use crate::roster::AircraftId;
use aifp_taxonomy::TaxonomyError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlightplanError {
    #[error("Aircraft file has no active AC# entries")]
    EmptyRoster,
    #[error("Airport {code} is not in the airports file or the master table")]
    UnresolvableAirport { code: String },
    #[error("No aircraft type matches \"{title}\"")]
    NoClassificationMatch { title: String },
    #[error("Aircraft AC#{id} is scheduled but not in the aircraft file")]
    UnknownAircraft { id: AircraftId },
    #[error("Master airports file {0:?} does not exist")]
    MasterAirportFileMissing(PathBuf),
    #[error("Master airports file {0:?} has no readable airport lines")]
    MasterAirportFileUnparseable(PathBuf),
    #[error("No airports available: {0:?} is missing and no master table is configured")]
    AirportsUnavailable(PathBuf),
    #[error(transparent)]
    MalformedAirportLine(#[from] AirportError),
    #[error("Malformed schedule entry: {reason}")]
    MalformedScheduleLine { reason: String },
    #[error("Input file not found: {0:?}")]
    MissingInputFile(PathBuf),
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FlightplanError {
    /// Whether this error stops a load when it occurs.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FlightplanError::EmptyRoster
                | FlightplanError::AirportsUnavailable(_)
                | FlightplanError::MissingInputFile(_)
                | FlightplanError::Taxonomy(_)
                | FlightplanError::Io(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputFile {
    Aircraft,
    Airports,
    Flightplans,
    Master,
}

impl fmt::Display for InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputFile::Aircraft => "aircraft",
            InputFile::Airports => "airports",
            InputFile::Flightplans => "flightplans",
            InputFile::Master => "master airports",
        };
        f.write_str(name)
    }
}

/// A non-fatal problem found while loading, tied to its source line.
#[derive(Debug)]
pub struct Diagnostic {
    pub file: InputFile,
    /// 1-based line number, when the problem belongs to one line.
    pub line: Option<usize>,
    pub error: FlightplanError,
}

impl Diagnostic {
    pub fn new(file: InputFile, line: Option<usize>, error: FlightplanError) -> Self {
        Self { file, line, error }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} file line {}: {}", self.file, line, self.error),
            None => write!(f, "{} file: {}", self.file, self.error),
        }
    }
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: InputFile, line: Option<usize>, error: FlightplanError) {
        self.entries.push(Diagnostic::new(file, line, error));
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn count_where(&self, pred: impl Fn(&FlightplanError) -> bool) -> usize {
        self.entries.iter().filter(|d| pred(&d.error)).count()
    }

    pub fn report_to(&self, sink: &mut dyn DiagnosticSink) {
        for diagnostic in &self.entries {
            sink.report(diagnostic);
        }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Receiver for human-readable load problems.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: &Diagnostic);
}

/// Forwards every diagnostic to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        log::warn!("{}", diagnostic);
    }
}

impl DiagnosticSink for Vec<String> {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.push(diagnostic.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_line() {
        let d = Diagnostic::new(
            InputFile::Flightplans,
            Some(12),
            FlightplanError::UnresolvableAirport {
                code: "ZZZZ".to_string(),
            },
        );
        assert_eq!(
            d.to_string(),
            "flightplans file line 12: Airport ZZZZ is not in the airports file or the master table"
        );
    }

    #[test]
    fn test_collect_into_sink() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(
            InputFile::Aircraft,
            None,
            FlightplanError::NoClassificationMatch {
                title: "Mystery Jet".to_string(),
            },
        );
        let mut sink: Vec<String> = Vec::new();
        diagnostics.report_to(&mut sink);
        assert_eq!(sink, vec!["aircraft file: No aircraft type matches \"Mystery Jet\""]);
    }

    #[test]
    fn test_fatal_kinds() {
        assert!(FlightplanError::EmptyRoster.is_fatal());
        assert!(!FlightplanError::UnresolvableAirport {
            code: "KJFK".to_string()
        }
        .is_fatal());
    }
}
