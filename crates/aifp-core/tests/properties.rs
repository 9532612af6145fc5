// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use aifp_core::fleet::classify_roster;
use aifp_core::roster::RosterOptions;
use aifp_core::{distance, format_distance, Airport, AircraftId, Diagnostics, DistanceUnit, Roster};
use aifp_taxonomy::{DecisionList, Manufacturer, Taxonomy, TypeEntry};
use std::io::Cursor;

const LINES: &[&str] = &[
    "KJFK,N40* 38.35',W73* 46.44',13",
    "KBOS,N42* 21.78',W71* 00.38',20",
    "EGLL,N51* 28.65',W00* 27.68',83",
    "YSSY,S33* 56.77',E151* 10.63',21",
    "SCEL,S33* 23.55',W70* 47.65',1555",
    "RJTT,N35* 33.14',E139* 46.86',35",
];

fn airports() -> Vec<Airport> {
    LINES.iter().map(|l| Airport::parse_line(l).unwrap()).collect()
}

#[test]
fn test_serialize_round_trip() {
    for airport in airports() {
        let again = Airport::parse_line(&airport.to_line()).unwrap();
        assert_eq!(again.code, airport.code);
        assert_eq!(again.altitude_ft, airport.altitude_ft);
        assert!((again.latitude.minutes - airport.latitude.minutes).abs() < 0.0001);
        assert!((again.longitude.minutes - airport.longitude.minutes).abs() < 0.0001);
        assert_eq!(again.latitude.degrees, airport.latitude.degrees);
        assert_eq!(again.longitude.hemisphere, airport.longitude.hemisphere);
    }
}

#[test]
fn test_distance_symmetric() {
    let all = airports();
    for a in &all {
        assert_eq!(distance(a, a), 0.0);
        for b in &all {
            assert_eq!(distance(a, b), distance(b, a), "{} {}", a.code, b.code);
        }
    }
}

#[test]
fn test_known_airport_example() {
    let jfk = Airport::parse_line("KJFK,N40* 38.35',W73* 46.44',13").unwrap();
    assert!((jfk.lat() - 40.6392).abs() < 0.0001);
    assert!((jfk.lon() + 73.7740).abs() < 0.0001);
    assert_eq!(jfk.altitude_ft, 13);

    let lhr = Airport::parse_line(LINES[2]).unwrap();
    // about 2,990 nm
    let nm = distance(&jfk, &lhr) / 1852.0;
    assert!((2950.0..3030.0).contains(&nm), "{}", nm);
    assert!(format_distance(distance(&jfk, &lhr), DistanceUnit::Km).ends_with(" km"));
}

#[test]
fn test_roster_line_example() {
    let taxonomy = Taxonomy {
        manufacturers: vec![Manufacturer {
            name: "Boeing".to_string(),
            search: vec!["boeing".to_string()],
            types: vec![TypeEntry {
                code: "B738".to_string(),
                name: None,
                series: None,
                search: vec!["737-800".to_string()],
                pattern: None,
                wingspan: None,
            }],
        }],
    };
    let decisions = DecisionList::compile(&taxonomy).unwrap();
    let mut roster = Roster::parse(
        Cursor::new("AC#1,50,\"Boeing 737-800 Delta\"\n"),
        RosterOptions::default(),
    )
    .unwrap();

    let mut diagnostics = Diagnostics::new();
    let result = classify_roster(&mut roster, &decisions, &mut diagnostics);
    assert!(diagnostics.is_empty());
    assert!(result.get("B738").unwrap().liveries.contains(&AircraftId::Number(1)));
}
