// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::coords::{CoordinateComponent, CoordinateError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

const METERS_PER_KM: f64 = 1_000.0;
const METERS_PER_MI: f64 = 1_609.344;
const METERS_PER_NM: f64 = 1_852.0;

#[derive(Error, Debug)]
pub enum AirportError {
    #[error("Malformed airport line '{line}': {reason}")]
    MalformedLine { line: String, reason: String },
    #[error("Malformed coordinate in airport line '{line}': {source}")]
    MalformedCoordinate {
        line: String,
        #[source]
        source: CoordinateError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub code: String,
    pub latitude: CoordinateComponent,
    pub longitude: CoordinateComponent,
    pub altitude_ft: i32,
    #[serde(default)]
    pub visit_count: u32,
}

impl Airport {
    /// Parses `CODE,<lat>,<lon>,<altitude>`. Fields past the altitude are ignored.
    pub fn parse_line(line: &str) -> Result<Self, AirportError> {
        let trimmed = line.trim();
        let malformed = |reason: &str| AirportError::MalformedLine {
            line: trimmed.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if parts.len() < 4 {
            return Err(malformed("expected CODE,latitude,longitude,altitude"));
        }

        let code = parts[0].to_uppercase();
        if !(3..=4).contains(&code.len()) || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(malformed("airport code must be 3-4 letters or digits"));
        }

        let coordinate = |token: &str| {
            CoordinateComponent::parse(token).map_err(|source| AirportError::MalformedCoordinate {
                line: trimmed.to_string(),
                source,
            })
        };
        let latitude = coordinate(parts[1])?;
        let longitude = coordinate(parts[2])?;
        if !latitude.hemisphere.is_latitude() || longitude.hemisphere.is_latitude() {
            return Err(malformed("latitude must be N/S and longitude E/W"));
        }

        let altitude_ft = parts[3]
            .parse::<i32>()
            .ok()
            .or_else(|| parts[3].parse::<f64>().ok().map(|v| v.round() as i32))
            .ok_or_else(|| malformed("altitude is not a number"))?;

        Ok(Self {
            code,
            latitude,
            longitude,
            altitude_ft,
            visit_count: 0,
        })
    }

    pub fn to_line(&self) -> String {
        format!(
            "{},{},{},{}",
            self.code, self.latitude, self.longitude, self.altitude_ft
        )
    }

    pub fn lat(&self) -> f64 {
        self.latitude.signed_value()
    }

    pub fn lon(&self) -> f64 {
        self.longitude.signed_value()
    }

    pub fn distance_to(&self, other: &Airport) -> f64 {
        distance(self, other)
    }
}

/// Great-circle distance in meters (haversine).
pub fn distance(a: &Airport, b: &Airport) -> f64 {
    if std::ptr::eq(a, b) || a.code == b.code {
        return 0.0;
    }

    let lat1 = a.lat().to_radians();
    let lat2 = b.lat().to_radians();
    // abs() keeps the result bit-identical when a and b are swapped
    let d_lat = (b.lat() - a.lat()).abs().to_radians();
    let d_lon = (b.lon() - a.lon()).abs().to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Km,
    Mi,
    #[default]
    Nm,
}

impl DistanceUnit {
    pub fn meters_per_unit(self) -> f64 {
        match self {
            DistanceUnit::Km => METERS_PER_KM,
            DistanceUnit::Mi => METERS_PER_MI,
            DistanceUnit::Nm => METERS_PER_NM,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DistanceUnit::Km => "km",
            DistanceUnit::Mi => "mi",
            DistanceUnit::Nm => "nm",
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DistanceUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "km" => Ok(DistanceUnit::Km),
            "mi" => Ok(DistanceUnit::Mi),
            "nm" => Ok(DistanceUnit::Nm),
            other => Err(format!("unknown distance unit '{}' (use km, mi or nm)", other)),
        }
    }
}

/// Rounds to whole units and groups thousands with commas: `1,234 nm`.
pub fn format_distance(meters: f64, unit: DistanceUnit) -> String {
    let whole = (meters / unit.meters_per_unit()).round().max(0.0) as u64;
    let digits = whole.to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{} {}", grouped, unit.label())
}

/// Airports keyed by upper-case code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirportTable {
    airports: BTreeMap<String, Airport>,
}

impl AirportTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_file<P: AsRef<Path>>(
        path: P,
    ) -> Result<(Self, Vec<(usize, AirportError)>), std::io::Error> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    /// Bulk load: one airport per non-empty line, later duplicates win.
    /// Bad lines are returned with their 1-based line number.
    pub fn parse<R: BufRead>(reader: R) -> Result<(Self, Vec<(usize, AirportError)>), std::io::Error> {
        let mut table = Self::new();
        let mut errors = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim_start_matches('\u{feff}').trim();
            if trimmed.is_empty() || trimmed.starts_with("//") {
                continue;
            }

            match Airport::parse_line(trimmed) {
                Ok(airport) => {
                    if let Some(previous) = table.insert(airport) {
                        log::debug!("[Airports] Duplicate {} on line {}, keeping last", previous.code, idx + 1);
                    }
                }
                Err(e) => errors.push((idx + 1, e)),
            }
        }

        log::debug!(
            "[Airports] Parsed {} airports ({} bad lines)",
            table.len(),
            errors.len()
        );
        Ok((table, errors))
    }

    pub fn insert(&mut self, airport: Airport) -> Option<Airport> {
        self.airports.insert(airport.code.clone(), airport)
    }

    pub fn get(&self, code: &str) -> Option<&Airport> {
        match self.airports.get(code) {
            Some(airport) => Some(airport),
            None => self.airports.get(&code.trim().to_uppercase()),
        }
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut Airport> {
        self.airports.get_mut(&code.trim().to_uppercase())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }

    /// Airports in code order.
    pub fn iter(&self) -> impl Iterator<Item = &Airport> {
        self.airports.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Airport> {
        self.airports.values_mut()
    }

    pub fn distance(&self, from: &str, to: &str) -> Option<f64> {
        Some(distance(self.get(from)?, self.get(to)?))
    }

    /// Serializes in airport-file format, sorted by code.
    pub fn to_file_string(&self) -> String {
        let mut out = String::with_capacity(self.airports.len() * 40);
        for airport in self.iter() {
            out.push_str(&airport.to_line());
            out.push_str("\r\n");
        }
        out
    }
}

impl FromIterator<Airport> for AirportTable {
    fn from_iter<I: IntoIterator<Item = Airport>>(iter: I) -> Self {
        let mut table = Self::new();
        for airport in iter {
            table.insert(airport);
        }
        table
    }
}
