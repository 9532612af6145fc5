// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod airports;
pub mod config;
pub mod coords;
pub mod error;
pub mod fleet;
pub mod flightplan;
pub mod master;
pub mod roster;
pub mod routes;
pub mod timetable;

pub use airports::{distance, format_distance, Airport, AirportTable, DistanceUnit};
pub use config::AifpConfig;
pub use error::{Diagnostic, DiagnosticSink, Diagnostics, FlightplanError, InputFile, LogSink};
pub use fleet::{AircraftType, Classification};
pub use flightplan::{
    write_airports_file, Flightplan, FlightplanPaths, LoadOptions, LoadedFlightplan,
};
pub use master::MasterAirportCache;
pub use roster::{AircraftId, AircraftLivery, Roster};
pub use routes::{AirportPairRoute, LegRoute, RouteIndex};
pub use timetable::{Aircraft, RouteSegment, ScheduleTime};
