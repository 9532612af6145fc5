// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::error::FlightplanError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::io::BufRead;
use std::sync::OnceLock;

/// `AC#` identifier: numeric in stock files, symbolic when allowed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AircraftId {
    Number(u32),
    Symbol(String),
}

impl AircraftId {
    pub fn parse(raw: &str, allow_symbolic: bool) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.contains(',') {
            return None;
        }
        if raw.bytes().all(|b| b.is_ascii_digit()) {
            return raw.parse().ok().map(AircraftId::Number);
        }
        if allow_symbolic && !raw.contains(char::is_whitespace) {
            return Some(AircraftId::Symbol(raw.to_string()));
        }
        None
    }
}

impl fmt::Display for AircraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AircraftId::Number(n) => write!(f, "{}", n),
            AircraftId::Symbol(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterOptions {
    /// Accept `//#` lines as inactive liveries.
    pub include_inactive: bool,
    /// Accept ids that are not plain digits.
    pub allow_symbolic_ids: bool,
}

impl Default for RosterOptions {
    fn default() -> Self {
        Self {
            include_inactive: true,
            allow_symbolic_ids: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftLivery {
    pub id: AircraftId,
    pub title: String,
    pub duty_percentage: u32,
    pub active: bool,
    /// Number of schedule lines that use this aircraft.
    pub observed_count: u32,
    /// Set once by classification.
    pub type_code: Option<String>,
    /// 1-based line in the aircraft file.
    pub line: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub active: BTreeMap<AircraftId, AircraftLivery>,
    pub inactive: Vec<AircraftLivery>,
}

fn roster_regex() -> &'static Regex {
    static RE_ROSTER: OnceLock<Regex> = OnceLock::new();
    RE_ROSTER.get_or_init(|| {
        Regex::new(r#"^(AC|//)#([^,]+),\s*(\d+)(?:\.\d*)?\s*,\s*"([^"]*)""#).unwrap()
    })
}

impl Roster {
    /// Parses an aircraft file. Lines that are not roster entries are skipped.
    ///
    /// Returns `EmptyRoster` when no active entry was found.
    pub fn parse<R: BufRead>(reader: R, options: RosterOptions) -> Result<Self, FlightplanError> {
        let re = roster_regex();
        let mut roster = Roster::default();
        let mut inactive_seen = HashSet::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim_start_matches('\u{feff}').trim();

            let caps = match re.captures(trimmed) {
                Some(caps) => caps,
                None => continue,
            };

            let active = &caps[1] == "AC";
            if !active && !options.include_inactive {
                continue;
            }

            let id = match AircraftId::parse(&caps[2], options.allow_symbolic_ids) {
                Some(id) => id,
                None => {
                    log::debug!("[Roster] Skipping line {}: id '{}' not accepted", idx + 1, &caps[2]);
                    continue;
                }
            };

            let livery = AircraftLivery {
                id,
                title: caps[4].trim().to_string(),
                duty_percentage: caps[3].parse().unwrap_or(0),
                active,
                observed_count: 0,
                type_code: None,
                line: idx + 1,
            };

            if active {
                if let Some(previous) = roster.active.insert(livery.id.clone(), livery) {
                    log::debug!(
                        "[Roster] AC#{} redefined on line {}, keeping last",
                        previous.id,
                        idx + 1
                    );
                }
            } else if inactive_seen.insert((livery.id.clone(), livery.title.clone())) {
                roster.inactive.push(livery);
            }
        }

        log::debug!(
            "[Roster] {} active, {} inactive liveries",
            roster.active.len(),
            roster.inactive.len()
        );

        if roster.active.is_empty() {
            return Err(FlightplanError::EmptyRoster);
        }
        Ok(roster)
    }

    pub fn get(&self, id: &AircraftId) -> Option<&AircraftLivery> {
        self.active.get(id)
    }

    /// Sets each active livery's observed count from schedule header counts.
    pub fn apply_observed_counts(&mut self, counts: &HashMap<AircraftId, u32>) {
        for livery in self.active.values_mut() {
            livery.observed_count = counts.get(&livery.id).copied().unwrap_or(0);
        }
    }

    /// Active first, in id order, then inactive in file order.
    pub fn liveries(&self) -> impl Iterator<Item = &AircraftLivery> {
        self.active.values().chain(self.inactive.iter())
    }

    pub fn liveries_mut(&mut self) -> impl Iterator<Item = &mut AircraftLivery> {
        self.active.values_mut().chain(self.inactive.iter_mut())
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.inactive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.inactive.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(data: &str, options: RosterOptions) -> Result<Roster, FlightplanError> {
        Roster::parse(Cursor::new(data.to_string()), options)
    }

    #[test]
    fn test_parse_active_and_inactive() {
        let data = "\
// Aircraft file
AC#1,50,\"Boeing 737-800 Delta\"
AC#2,300,\"Airbus A320 Lufthansa\",extra,fields
//#3,300,\"Boeing 757-200 Old Livery\"
some unrelated text
";
        let roster = parse(data, RosterOptions::default()).unwrap();
        assert_eq!(roster.active.len(), 2);
        assert_eq!(roster.inactive.len(), 1);

        let first = roster.get(&AircraftId::Number(1)).unwrap();
        assert_eq!(first.title, "Boeing 737-800 Delta");
        assert_eq!(first.duty_percentage, 50);
        assert_eq!(first.line, 2);
        assert!(!roster.inactive[0].active);
    }

    #[test]
    fn test_inactive_excluded_by_flag() {
        let data = "AC#1,50,\"A\"\n//#3,300,\"B\"\n";
        let options = RosterOptions {
            include_inactive: false,
            ..RosterOptions::default()
        };
        let roster = parse(data, options).unwrap();
        assert!(roster.inactive.is_empty());
    }

    #[test]
    fn test_duplicate_active_last_wins() {
        let data = "AC#7,50,\"First\"\nAC#7,50,\"Second\"\n";
        let roster = parse(data, RosterOptions::default()).unwrap();
        assert_eq!(roster.active.len(), 1);
        assert_eq!(roster.get(&AircraftId::Number(7)).unwrap().title, "Second");
    }

    #[test]
    fn test_symbolic_ids() {
        let data = "AC#DLH1,50,\"Airbus A320 Lufthansa\"\nAC#1,50,\"Boeing 737-800\"\n";
        let strict = parse(data, RosterOptions::default()).unwrap();
        assert_eq!(strict.active.len(), 1);

        let relaxed = parse(
            data,
            RosterOptions {
                allow_symbolic_ids: true,
                ..RosterOptions::default()
            },
        )
        .unwrap();
        assert_eq!(relaxed.active.len(), 2);
        assert!(relaxed
            .get(&AircraftId::Symbol("DLH1".to_string()))
            .is_some());
    }

    #[test]
    fn test_empty_roster() {
        let data = "//#3,300,\"Only inactive\"\nnothing else\n";
        assert!(matches!(
            parse(data, RosterOptions::default()),
            Err(FlightplanError::EmptyRoster)
        ));
    }

    #[test]
    fn test_observed_counts() {
        let mut roster = parse("AC#1,50,\"A\"\nAC#2,50,\"B\"\n", RosterOptions::default()).unwrap();
        let counts = HashMap::from([(AircraftId::Number(1), 3)]);
        roster.apply_observed_counts(&counts);
        assert_eq!(roster.get(&AircraftId::Number(1)).unwrap().observed_count, 3);
        assert_eq!(roster.get(&AircraftId::Number(2)).unwrap().observed_count, 0);
    }
}
