// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::error::{Diagnostics, FlightplanError, InputFile};
use crate::roster::{AircraftId, AircraftLivery, Roster};
use aifp_taxonomy::{DecisionList, TypeInfo, TypeMatcher};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One ICAO type seen in the roster, with the liveries assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AircraftType {
    pub type_code: String,
    pub manufacturer: Option<String>,
    pub type_name: Option<String>,
    pub series_id: Option<String>,
    pub wingspan_ft: Option<f64>,
    /// Sum of the observed counts of `liveries`.
    pub total_count: u32,
    pub liveries: BTreeSet<AircraftId>,
}

impl AircraftType {
    fn from_info(info: &TypeInfo) -> Self {
        Self {
            type_code: info.code.clone(),
            manufacturer: Some(info.manufacturer.clone()),
            type_name: info.name.clone(),
            series_id: info.series.clone(),
            wingspan_ft: info.wingspan,
            total_count: 0,
            liveries: BTreeSet::new(),
        }
    }

    fn attach(&mut self, livery: &AircraftLivery) {
        // inactive liveries are never scheduled, so they add nothing
        self.liveries.insert(livery.id.clone());
        self.total_count += livery.observed_count;
    }

    pub fn display_name(&self) -> String {
        match (&self.manufacturer, &self.type_name) {
            (Some(m), Some(n)) => format!("{} {}", m, n),
            (None, Some(n)) => n.clone(),
            _ => self.type_code.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Classification {
    pub types: BTreeMap<String, AircraftType>,
    /// Number of liveries that received a type.
    pub classified_liveries: usize,
    /// Titles with no match, in classification order.
    pub non_matched: Vec<String>,
}

impl Classification {
    pub fn get(&self, type_code: &str) -> Option<&AircraftType> {
        self.types.get(type_code)
    }

    /// Total scheduled aircraft across all classified types.
    pub fn total_count(&self) -> u32 {
        self.types.values().map(|t| t.total_count).sum()
    }

    /// Types ordered by descending count, then code.
    pub fn by_count(&self) -> Vec<&AircraftType> {
        let mut types: Vec<&AircraftType> = self.types.values().collect();
        types.sort_by(|a, b| {
            b.total_count
                .cmp(&a.total_count)
                .then_with(|| a.type_code.cmp(&b.type_code))
        });
        types
    }
}

/// Assigns a type to every livery (active first, then inactive) and
/// aggregates per-type counts. Unmatched titles become diagnostics.
pub fn classify_roster(
    roster: &mut Roster,
    decisions: &DecisionList,
    diagnostics: &mut Diagnostics,
) -> Classification {
    let mut matcher = TypeMatcher::new(decisions);
    let mut result = Classification::default();

    for livery in roster.liveries_mut() {
        match matcher.match_title(&livery.title) {
            Some(hit) => {
                livery.type_code = Some(hit.info.code.clone());
                result
                    .types
                    .entry(hit.info.code.clone())
                    .or_insert_with(|| AircraftType::from_info(hit.info))
                    .attach(livery);
                result.classified_liveries += 1;
            }
            None => {
                livery.type_code = None;
                result.non_matched.push(livery.title.clone());
                diagnostics.push(
                    InputFile::Aircraft,
                    Some(livery.line),
                    FlightplanError::NoClassificationMatch {
                        title: livery.title.clone(),
                    },
                );
            }
        }
    }

    log::info!(
        "[Classifier] {} of {} liveries classified into {} types ({} cache hits)",
        result.classified_liveries,
        roster.len(),
        result.types.len(),
        matcher.cache().hits()
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::RosterOptions;
    use aifp_taxonomy::{Manufacturer, Taxonomy, TypeEntry};
    use std::collections::HashMap;
    use std::io::Cursor;

    fn taxonomy() -> Taxonomy {
        let entry = |code: &str, search: &[&str]| TypeEntry {
            code: code.to_string(),
            name: Some(code.to_string()),
            series: None,
            search: search.iter().map(|s| s.to_string()).collect(),
            pattern: None,
            wingspan: Some(112.6),
        };
        Taxonomy {
            manufacturers: vec![
                Manufacturer {
                    name: "Boeing".to_string(),
                    search: vec!["boeing".to_string()],
                    types: vec![entry("B738", &["737-800"]), entry("B752", &["757"])],
                },
                Manufacturer {
                    name: "Airbus".to_string(),
                    search: vec!["airbus".to_string()],
                    types: vec![entry("A320", &["a320"])],
                },
            ],
        }
    }

    fn roster() -> Roster {
        let data = "\
AC#1,50,\"Boeing 737-800 Delta\"
AC#2,50,\"Boeing 737-800 United\"
AC#3,50,\"Airbus A320 Lufthansa\"
AC#4,50,\"Mystery Jet\"
//#5,50,\"Boeing 757-200 Retro\"
";
        let mut roster = Roster::parse(Cursor::new(data), RosterOptions::default()).unwrap();
        roster.apply_observed_counts(&HashMap::from([
            (AircraftId::Number(1), 2),
            (AircraftId::Number(2), 1),
            (AircraftId::Number(3), 4),
        ]));
        roster
    }

    #[test]
    fn test_classify_counts() {
        let decisions = DecisionList::compile(&taxonomy()).unwrap();
        let mut roster = roster();
        let mut diagnostics = Diagnostics::new();
        let result = classify_roster(&mut roster, &decisions, &mut diagnostics);

        assert_eq!(result.classified_liveries, 4);
        assert_eq!(result.types.len(), 3);

        let b738 = result.get("B738").unwrap();
        assert_eq!(b738.total_count, 3);
        assert_eq!(b738.liveries.len(), 2);
        assert_eq!(b738.manufacturer.as_deref(), Some("Boeing"));

        assert_eq!(result.get("A320").unwrap().total_count, 4);
        assert_eq!(result.get("B752").unwrap().total_count, 0);
        assert_eq!(result.total_count(), 7);

        assert_eq!(result.non_matched, vec!["Mystery Jet"]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            roster.get(&AircraftId::Number(1)).unwrap().type_code.as_deref(),
            Some("B738")
        );
        assert_eq!(roster.inactive[0].type_code.as_deref(), Some("B752"));
    }

    #[test]
    fn test_by_count_order() {
        let decisions = DecisionList::compile(&taxonomy()).unwrap();
        let mut roster = roster();
        let result = classify_roster(&mut roster, &decisions, &mut Diagnostics::new());
        let codes: Vec<&str> = result.by_count().iter().map(|t| t.type_code.as_str()).collect();
        assert_eq!(codes, vec!["A320", "B738", "B752"]);
    }

    #[test]
    fn test_total_count_matches_liveries() {
        let decisions = DecisionList::compile(&taxonomy()).unwrap();
        let mut roster = roster();
        let result = classify_roster(&mut roster, &decisions, &mut Diagnostics::new());
        for t in result.types.values() {
            let sum: u32 = t
                .liveries
                .iter()
                .filter_map(|id| roster.get(id))
                .map(|l| l.observed_count)
                .sum();
            assert_eq!(t.total_count, sum, "{}", t.type_code);
        }
    }
}
