// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::airports::AirportTable;
use crate::roster::AircraftId;
use crate::timetable::{Aircraft, RouteSegment};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

pub type LegKey = (String, String);

/// All occurrences of one directional leg.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegRoute {
    /// First occurrence; `occurrence_count` holds the merged total.
    pub segment: RouteSegment,
    pub aircraft_types: BTreeSet<String>,
}

/// One or two opposite legs between the same airports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirportPairRoute {
    /// The busier airport (by visit count).
    pub primary: String,
    pub secondary: String,
    pub merged_count: u32,
    pub aircraft_types: BTreeSet<String>,
    /// A segment departing `primary` when one exists.
    pub representative: RouteSegment,
    pub bidirectional: bool,
}

impl AirportPairRoute {
    pub fn distance_m(&self) -> f64 {
        self.representative.distance_m
    }

    pub fn connects(&self, code: &str) -> bool {
        self.primary.eq_ignore_ascii_case(code) || self.secondary.eq_ignore_ascii_case(code)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RouteIndex {
    by_leg: BTreeMap<LegKey, LegRoute>,
    by_pair: Vec<AirportPairRoute>,
}

impl RouteIndex {
    /// Indexes every segment once, then folds opposite legs into pairs.
    /// Resets and recounts `visit_count` on `airports` (one visit per
    /// departure and one per arrival).
    pub fn build<'t, F>(aircraft: &[Aircraft], type_of: F, airports: &mut AirportTable) -> Self
    where
        F: Fn(&AircraftId) -> Option<&'t str>,
    {
        for airport in airports.iter_mut() {
            airport.visit_count = 0;
        }

        let mut by_leg: BTreeMap<LegKey, LegRoute> = BTreeMap::new();
        for segment in aircraft.iter().flat_map(|a| a.segments.iter()) {
            for code in [&segment.departure, &segment.arrival] {
                if let Some(airport) = airports.get_mut(code) {
                    airport.visit_count += 1;
                }
            }

            let key = (segment.departure.clone(), segment.arrival.clone());
            let leg = by_leg.entry(key).or_insert_with(|| LegRoute {
                segment: RouteSegment {
                    occurrence_count: 0,
                    ..segment.clone()
                },
                aircraft_types: BTreeSet::new(),
            });
            leg.segment.occurrence_count += segment.occurrence_count;
            if let Some(type_code) = type_of(&segment.aircraft_id) {
                leg.aircraft_types.insert(type_code.to_string());
            }
        }

        let by_pair = Self::pair_legs(&by_leg, airports);
        log::info!(
            "[Routes] {} directional legs folded into {} airport pairs",
            by_leg.len(),
            by_pair.len()
        );

        Self { by_leg, by_pair }
    }

    fn pair_legs(by_leg: &BTreeMap<LegKey, LegRoute>, airports: &AirportTable) -> Vec<AirportPairRoute> {
        let visits = |code: &str| airports.get(code).map(|a| a.visit_count).unwrap_or(0);
        let mut complete: HashSet<&LegKey> = HashSet::new();
        let mut pairs = Vec::new();

        for (key, leg) in by_leg {
            if complete.contains(key) {
                continue;
            }
            complete.insert(key);

            let reverse_key = (key.1.clone(), key.0.clone());
            let reverse = by_leg
                .get_key_value(&reverse_key)
                .filter(|(rk, _)| *rk != key && !complete.contains(rk));

            let mut merged_count = leg.segment.occurrence_count;
            let mut aircraft_types = leg.aircraft_types.clone();
            let mut reverse_segment = None;
            if let Some((rk, rev)) = reverse {
                complete.insert(rk);
                merged_count += rev.segment.occurrence_count;
                aircraft_types.extend(rev.aircraft_types.iter().cloned());
                reverse_segment = Some(&rev.segment);
            }

            let (dep, arr) = (&leg.segment.departure, &leg.segment.arrival);
            let swap = visits(arr) > visits(dep);
            let (primary, secondary, representative) = if swap {
                let rep = reverse_segment.unwrap_or(&leg.segment).clone();
                (arr.clone(), dep.clone(), rep)
            } else {
                (dep.clone(), arr.clone(), leg.segment.clone())
            };

            pairs.push(AirportPairRoute {
                primary,
                secondary,
                merged_count,
                aircraft_types,
                representative,
                bidirectional: reverse_segment.is_some(),
            });
        }

        pairs
    }

    pub fn legs(&self) -> impl Iterator<Item = &LegRoute> {
        self.by_leg.values()
    }

    pub fn leg(&self, departure: &str, arrival: &str) -> Option<&LegRoute> {
        self.by_leg
            .get(&(departure.to_uppercase(), arrival.to_uppercase()))
    }

    pub fn pairs(&self) -> &[AirportPairRoute] {
        &self.by_pair
    }

    /// The pair route between two airports, in either orientation.
    pub fn pair(&self, a: &str, b: &str) -> Option<&AirportPairRoute> {
        self.by_pair.iter().find(|p| {
            (p.primary.eq_ignore_ascii_case(a) && p.secondary.eq_ignore_ascii_case(b))
                || (p.primary.eq_ignore_ascii_case(b) && p.secondary.eq_ignore_ascii_case(a))
        })
    }

    pub fn for_airport(&self, code: &str) -> Vec<&AirportPairRoute> {
        self.by_pair.iter().filter(|p| p.connects(code)).collect()
    }

    /// Pair routes flown by `type_code` (matched case-insensitively).
    pub fn for_type(&self, type_code: &str) -> Vec<&AirportPairRoute> {
        let type_code = type_code.trim().to_uppercase();
        self.by_pair
            .iter()
            .filter(|p| p.aircraft_types.contains(&type_code))
            .collect()
    }

    pub fn leg_count(&self) -> usize {
        self.by_leg.len()
    }

    pub fn total_segments(&self) -> u32 {
        self.by_leg.values().map(|l| l.segment.occurrence_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airports::Airport;
    use crate::timetable::{ArrivalMarker, FlightRule, ScheduleTime};
    use chrono::NaiveTime;

    fn table() -> AirportTable {
        [
            "KJFK,N40* 38.35',W73* 46.44',13",
            "KBOS,N42* 21.78',W71* 00.38',20",
            "KORD,N41* 58.63',W87* 54.47',672",
        ]
        .iter()
        .map(|l| Airport::parse_line(l).unwrap())
        .collect()
    }

    fn segment(id: u32, dep: &str, arr: &str) -> RouteSegment {
        let t = ScheduleTime {
            week: 0,
            day: 0,
            time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        };
        RouteSegment {
            aircraft_id: AircraftId::Number(id),
            departure: dep.to_string(),
            departure_time: t,
            arrival: arr.to_string(),
            arrival_time: t,
            arrival_marker: ArrivalMarker::None,
            flight_level: 350,
            flight_rule: FlightRule::Ifr,
            flight_number: 100,
            occurrence_count: 1,
            distance_m: 300_000.0,
        }
    }

    fn aircraft(id: u32, segments: Vec<RouteSegment>) -> Aircraft {
        Aircraft {
            id: AircraftId::Number(id),
            registration: format!("N{}", id),
            duty_percentage: 100,
            repeat_period: "WEEK".to_string(),
            flight_rule: FlightRule::Ifr,
            segments,
            line: id as usize,
        }
    }

    fn type_of(id: &AircraftId) -> Option<&'static str> {
        match id {
            AircraftId::Number(1) => Some("B738"),
            AircraftId::Number(2) => Some("A320"),
            _ => None,
        }
    }

    #[test]
    fn test_opposite_legs_merge() {
        let fleet = vec![
            aircraft(1, vec![segment(1, "KJFK", "KBOS")]),
            aircraft(2, vec![segment(2, "KBOS", "KJFK")]),
        ];
        let mut airports = table();
        let index = RouteIndex::build(&fleet, type_of, &mut airports);

        assert_eq!(index.pairs().len(), 1);
        let pair = &index.pairs()[0];
        assert_eq!(pair.merged_count, 2);
        assert!(pair.bidirectional);
        assert_eq!(
            pair.aircraft_types.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["A320", "B738"]
        );
        // equal visits keep the first-indexed orientation
        assert_eq!((pair.primary.as_str(), pair.secondary.as_str()), ("KBOS", "KJFK"));
    }

    #[test]
    fn test_busier_airport_first() {
        let fleet = vec![
            aircraft(1, vec![segment(1, "KBOS", "KJFK"), segment(1, "KJFK", "KBOS")]),
            aircraft(2, vec![segment(2, "KORD", "KJFK"), segment(2, "KJFK", "KORD")]),
        ];
        let mut airports = table();
        let index = RouteIndex::build(&fleet, type_of, &mut airports);

        assert_eq!(airports.get("KJFK").unwrap().visit_count, 4);
        assert_eq!(airports.get("KBOS").unwrap().visit_count, 2);

        let bos = index.pair("KBOS", "KJFK").unwrap();
        assert_eq!(bos.primary, "KJFK");
        assert_eq!(bos.representative.departure, "KJFK");
        let ord = index.pair("kord", "kjfk").unwrap();
        assert_eq!(ord.primary, "KJFK");
        assert_eq!(index.for_airport("KJFK").len(), 2);
        assert_eq!(index.for_type("a320").len(), 1);
    }

    #[test]
    fn test_one_way_leg_into_busier_airport() {
        let fleet = vec![
            aircraft(1, vec![segment(1, "KBOS", "KJFK")]),
            aircraft(2, vec![segment(2, "KORD", "KJFK"), segment(2, "KJFK", "KORD")]),
        ];
        let mut airports = table();
        let index = RouteIndex::build(&fleet, type_of, &mut airports);

        let bos = index.pair("KBOS", "KJFK").unwrap();
        assert_eq!((bos.primary.as_str(), bos.secondary.as_str()), ("KJFK", "KBOS"));
        assert!(!bos.bidirectional);
        assert_eq!(bos.merged_count, 1);
        // no segment departs KJFK, so the only leg stands in
        assert_eq!(bos.representative.departure, "KBOS");
        assert_eq!(bos.representative.arrival, "KJFK");
    }

    #[test]
    fn test_duplicate_legs_counted() {
        let fleet = vec![
            aircraft(1, vec![segment(1, "KJFK", "KBOS"), segment(1, "KJFK", "KBOS")]),
            aircraft(3, vec![segment(3, "KJFK", "KORD")]),
        ];
        let mut airports = table();
        let index = RouteIndex::build(&fleet, type_of, &mut airports);

        assert_eq!(index.leg("KJFK", "KBOS").unwrap().segment.occurrence_count, 2);
        let ord = index.pair("KJFK", "KORD").unwrap();
        assert!(!ord.bidirectional);
        assert!(ord.aircraft_types.is_empty());
    }

    #[test]
    fn test_every_segment_in_one_pair() {
        let fleet = vec![
            aircraft(1, vec![segment(1, "KJFK", "KBOS"), segment(1, "KBOS", "KORD"), segment(1, "KORD", "KJFK")]),
            aircraft(2, vec![segment(2, "KBOS", "KJFK"), segment(2, "KJFK", "KJFK")]),
        ];
        let mut airports = table();
        let index = RouteIndex::build(&fleet, type_of, &mut airports);

        let segments: u32 = fleet.iter().map(|a| a.segments.len() as u32).sum();
        let merged: u32 = index.pairs().iter().map(|p| p.merged_count).sum();
        assert_eq!(merged, segments);
        assert_eq!(index.total_segments(), segments);

        for a in &fleet {
            for s in &a.segments {
                let holders = index
                    .pairs()
                    .iter()
                    .filter(|p| {
                        (p.primary == s.departure && p.secondary == s.arrival)
                            || (p.primary == s.arrival && p.secondary == s.departure)
                    })
                    .count();
                assert_eq!(holders, 1, "{}->{}", s.departure, s.arrival);
            }
        }
    }
}
