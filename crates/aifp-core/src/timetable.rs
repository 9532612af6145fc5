// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::airports::distance;
use crate::error::{Diagnostics, FlightplanError, InputFile};
use crate::master::AirportResolver;
use crate::roster::AircraftId;
use chrono::{NaiveTime, Timelike};
use nom::branch::alt;
use nom::bytes::complete::tag_no_case;
use nom::character::complete::{char, digit1};
use nom::combinator::{all_consuming, map_res, opt, value};
use nom::error::{Error as NomError, ErrorKind};
use nom::multi::many_m_n;
use nom::sequence::{separated_pair, terminated};
use nom::IResult;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::io::BufRead;

const HEADER_FIELDS: usize = 5;
const LEG_FIELDS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FlightRule {
    Ifr,
    Vfr,
}

impl FlightRule {
    fn from_header(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "IFR" => Some(FlightRule::Ifr),
            "VFR" => Some(FlightRule::Vfr),
            _ => None,
        }
    }

    fn from_leg_letter(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "F" => Some(FlightRule::Ifr),
            "R" => Some(FlightRule::Vfr),
            _ => None,
        }
    }
}

/// `[[week/]day/]hh:mm`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ScheduleTime {
    pub week: u32,
    pub day: u32,
    pub time: NaiveTime,
}

impl ScheduleTime {
    pub fn parse(field: &str) -> Option<Self> {
        all_consuming(schedule_time)(field.trim())
            .ok()
            .map(|(_, t)| t)
    }

    /// `hh:mm` without week/day offsets.
    pub fn clock(&self) -> String {
        self.time.format("%H:%M").to_string()
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.week > 0 {
            write!(f, "{}/", self.week)?;
        }
        if self.week > 0 || self.day > 0 {
            write!(f, "{}/", self.day)?;
        }
        write!(f, "{:02}:{:02}", self.time.hour(), self.time.minute())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ArrivalMarker {
    #[default]
    None,
    /// `@`: the arrival time is fixed rather than computed from cruise speed.
    Fixed,
    /// `TNG`: touch-and-go at the destination.
    TouchAndGo,
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse::<u32>)(input)
}

fn schedule_time(input: &str) -> IResult<&str, ScheduleTime> {
    let (input, prefixes) = many_m_n(0, 2, terminated(number, char('/')))(input)?;
    let (rest, (hour, minute)) = separated_pair(number, char(':'), number)(input)?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| nom::Err::Error(NomError::new(input, ErrorKind::Verify)))?;

    let (week, day) = match prefixes.as_slice() {
        [week, day] => (*week, *day),
        [day] => (0, *day),
        _ => (0, 0),
    };
    Ok((rest, ScheduleTime { week, day, time }))
}

fn arrival(input: &str) -> IResult<&str, (ArrivalMarker, ScheduleTime)> {
    let (input, marker) = opt(alt((
        value(ArrivalMarker::Fixed, char('@')),
        value(ArrivalMarker::TouchAndGo, tag_no_case("TNG")),
    )))(input)?;
    let (input, time) = schedule_time(input)?;
    Ok((input, (marker.unwrap_or_default(), time)))
}

pub fn parse_arrival(field: &str) -> Option<(ArrivalMarker, ScheduleTime)> {
    all_consuming(arrival)(field.trim()).ok().map(|(_, v)| v)
}

/// One directional flight between two resolved airports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSegment {
    pub aircraft_id: AircraftId,
    pub departure: String,
    pub departure_time: ScheduleTime,
    pub arrival: String,
    pub arrival_time: ScheduleTime,
    pub arrival_marker: ArrivalMarker,
    pub flight_level: u32,
    pub flight_rule: FlightRule,
    pub flight_number: u32,
    pub occurrence_count: u32,
    pub distance_m: f64,
}

/// One scheduled aircraft line and the legs it flies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aircraft {
    pub id: AircraftId,
    pub registration: String,
    pub duty_percentage: u8,
    pub repeat_period: String,
    pub flight_rule: FlightRule,
    pub segments: Vec<RouteSegment>,
    /// 1-based line in the flightplans file.
    pub line: usize,
}

#[derive(Debug, Clone)]
struct LegRecord {
    departure_time: ScheduleTime,
    arrival_marker: ArrivalMarker,
    arrival_time: ScheduleTime,
    flight_level: u32,
    flight_rule: FlightRule,
    flight_number: u32,
    destination: String,
}

struct Header<'l> {
    id: AircraftId,
    registration: &'l str,
    duty_percentage: u8,
    repeat_period: &'l str,
    flight_rule: FlightRule,
}

fn parse_header<'l>(fields: &[&'l str], allow_symbolic: bool) -> Result<Header<'l>, String> {
    if fields.len() < HEADER_FIELDS {
        return Err("header needs AC#id,registration,percent%,period,IFR|VFR".to_string());
    }
    let raw_id = strip_ac_prefix(fields[0])
        .ok_or_else(|| format!("'{}' does not start with AC#", fields[0]))?;
    let id = AircraftId::parse(raw_id, allow_symbolic)
        .ok_or_else(|| format!("aircraft id '{}' not accepted", raw_id))?;

    let duty_percentage = fields[2]
        .trim_end_matches('%')
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| format!("duty percentage '{}' is not 0-100%", fields[2]))?;

    let flight_rule = FlightRule::from_header(fields[4])
        .ok_or_else(|| format!("flight rule '{}' is not IFR or VFR", fields[4]))?;

    Ok(Header {
        id,
        registration: fields[1],
        duty_percentage,
        repeat_period: fields[3],
        flight_rule,
    })
}

fn parse_leg(fields: &[&str]) -> Result<LegRecord, String> {
    let departure_time = ScheduleTime::parse(fields[0])
        .ok_or_else(|| format!("bad departure time '{}'", fields[0]))?;
    let (arrival_marker, arrival_time) =
        parse_arrival(fields[1]).ok_or_else(|| format!("bad arrival time '{}'", fields[1]))?;
    let flight_level = fields[2]
        .parse::<u32>()
        .map_err(|_| format!("bad flight level '{}'", fields[2]))?;
    let flight_rule = FlightRule::from_leg_letter(fields[3])
        .ok_or_else(|| format!("bad flight rule letter '{}'", fields[3]))?;
    let flight_number = fields[4]
        .parse::<u32>()
        .map_err(|_| format!("bad flight number '{}'", fields[4]))?;
    let destination = fields[5].to_uppercase();
    if destination.is_empty() {
        return Err("missing destination".to_string());
    }

    Ok(LegRecord {
        departure_time,
        arrival_marker,
        arrival_time,
        flight_level,
        flight_rule,
        flight_number,
        destination,
    })
}

fn strip_ac_prefix(field: &str) -> Option<&str> {
    match field.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("AC#") => Some(&field[3..]),
        _ => None,
    }
}

/// Counts valid header lines per aircraft id. Lines whose header would be
/// rejected by [`parse_timetable`] are not counted.
pub fn count_scheduled_aircraft(content: &str, allow_symbolic: bool) -> HashMap<AircraftId, u32> {
    let mut counts = HashMap::new();
    for line in content.lines() {
        let trimmed = line.trim_start_matches('\u{feff}').trim();
        if strip_ac_prefix(trimmed).is_none() {
            continue;
        }
        let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if let Ok(header) = parse_header(&fields, allow_symbolic) {
            *counts.entry(header.id).or_insert(0) += 1;
        }
    }
    counts
}

#[derive(Debug, Default)]
pub struct Timetable {
    pub aircraft: Vec<Aircraft>,
    /// Every destination code named by a parsed leg, resolved or not.
    pub referenced_codes: BTreeSet<String>,
}

impl Timetable {
    pub fn segment_count(&self) -> usize {
        self.aircraft.iter().map(|a| a.segments.len()).sum()
    }

    pub fn segments(&self) -> impl Iterator<Item = &RouteSegment> {
        self.aircraft.iter().flat_map(|a| a.segments.iter())
    }
}

/// Parses a flightplans file.
///
/// Leg `n` departs from the destination of leg `n - 1`; the first leg
/// departs from the destination of the last leg on the same line. Legs
/// whose airports cannot be resolved are dropped and reported, as are legs
/// following a malformed leg group, whose departure is unknown.
pub fn parse_timetable<R: BufRead>(
    reader: R,
    resolver: &mut AirportResolver<'_>,
    allow_symbolic: bool,
    diagnostics: &mut Diagnostics,
) -> Result<Timetable, std::io::Error> {
    let mut timetable = Timetable::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let trimmed = line.trim_start_matches('\u{feff}').trim();
        if trimmed.is_empty() || trimmed.starts_with("//") || strip_ac_prefix(trimmed).is_none() {
            continue;
        }

        let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        let header = match parse_header(&fields, allow_symbolic) {
            Ok(h) => h,
            Err(reason) => {
                diagnostics.push(
                    InputFile::Flightplans,
                    Some(line_no),
                    FlightplanError::MalformedScheduleLine { reason },
                );
                continue;
            }
        };

        let leg_fields = &fields[HEADER_FIELDS..];
        let mut legs = Vec::with_capacity(leg_fields.len() / LEG_FIELDS);
        for chunk in leg_fields.chunks(LEG_FIELDS) {
            // a trailing empty field from a final comma is not a leg
            if chunk.iter().all(|f| f.is_empty()) {
                continue;
            }
            let result = if chunk.len() < LEG_FIELDS {
                Err(format!("incomplete leg '{}'", chunk.join(",")))
            } else {
                parse_leg(chunk)
            };
            match result {
                Ok(leg) => legs.push(Some(leg)),
                Err(reason) => {
                    diagnostics.push(
                        InputFile::Flightplans,
                        Some(line_no),
                        FlightplanError::MalformedScheduleLine { reason },
                    );
                    legs.push(None);
                }
            }
        }

        let mut segments = Vec::with_capacity(legs.len());
        let mut unresolved: HashSet<String> = HashSet::new();
        for (i, slot) in legs.iter().enumerate() {
            let leg = match slot {
                Some(leg) => leg,
                None => continue,
            };
            timetable.referenced_codes.insert(leg.destination.clone());
            let previous = match &legs[(i + legs.len() - 1) % legs.len()] {
                Some(previous) => previous,
                None => {
                    diagnostics.push(
                        InputFile::Flightplans,
                        Some(line_no),
                        FlightplanError::MalformedScheduleLine {
                            reason: format!(
                                "flight {} to {} follows a malformed leg",
                                leg.flight_number, leg.destination
                            ),
                        },
                    );
                    continue;
                }
            };

            let mut endpoints = Vec::with_capacity(2);
            for code in [&previous.destination, &leg.destination] {
                match resolver.resolve(code, diagnostics) {
                    Some(airport) => endpoints.push(airport),
                    None => {
                        // once per code and line
                        if unresolved.insert(code.clone()) {
                            diagnostics.push(
                                InputFile::Flightplans,
                                Some(line_no),
                                FlightplanError::UnresolvableAirport { code: code.clone() },
                            );
                        }
                    }
                }
            }
            if endpoints.len() < 2 {
                log::debug!(
                    "[Timetable] Dropping leg {}->{} on line {}",
                    previous.destination,
                    leg.destination,
                    line_no
                );
                continue;
            }

            segments.push(RouteSegment {
                aircraft_id: header.id.clone(),
                departure: endpoints[0].code.clone(),
                departure_time: leg.departure_time,
                arrival: endpoints[1].code.clone(),
                arrival_time: leg.arrival_time,
                arrival_marker: leg.arrival_marker,
                flight_level: leg.flight_level,
                flight_rule: leg.flight_rule,
                flight_number: leg.flight_number,
                occurrence_count: 1,
                distance_m: distance(&endpoints[0], &endpoints[1]),
            });
        }

        timetable.aircraft.push(Aircraft {
            id: header.id,
            registration: header.registration.to_string(),
            duty_percentage: header.duty_percentage,
            repeat_period: header.repeat_period.to_string(),
            flight_rule: header.flight_rule,
            segments,
            line: line_no,
        });
    }

    log::info!(
        "[Timetable] {} aircraft, {} segments, {} airports referenced",
        timetable.aircraft.len(),
        timetable.segment_count(),
        timetable.referenced_codes.len()
    );
    Ok(timetable)
}
