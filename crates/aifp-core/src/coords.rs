// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    #[error("Malformed coordinate '{token}'")]
    Malformed { token: String },
    #[error("Coordinate '{token}' is out of range")]
    OutOfRange { token: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    N,
    S,
    E,
    W,
}

impl Hemisphere {
    fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'N' => Some(Hemisphere::N),
            'S' => Some(Hemisphere::S),
            'E' => Some(Hemisphere::E),
            'W' => Some(Hemisphere::W),
            _ => None,
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            Hemisphere::N | Hemisphere::E => 1.0,
            Hemisphere::S | Hemisphere::W => -1.0,
        }
    }

    pub fn is_latitude(self) -> bool {
        matches!(self, Hemisphere::N | Hemisphere::S)
    }

    pub fn letter(self) -> char {
        match self {
            Hemisphere::N => 'N',
            Hemisphere::S => 'S',
            Hemisphere::E => 'E',
            Hemisphere::W => 'W',
        }
    }
}

/// One latitude or longitude value as written in airport files:
/// `N40* 38.35'`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateComponent {
    pub hemisphere: Hemisphere,
    pub degrees: u16,
    pub minutes: f64,
}

impl CoordinateComponent {
    pub fn parse(token: &str) -> Result<Self, CoordinateError> {
        static RE_COORD: OnceLock<Regex> = OnceLock::new();
        let re = RE_COORD.get_or_init(|| {
            Regex::new(r"^([NSEWnsew])\s*(\d{1,3})\s*\*\s*(\d{1,2}(?:\.\d*)?)\s*'?$").unwrap()
        });

        let token = token.trim();
        let malformed = || CoordinateError::Malformed {
            token: token.to_string(),
        };

        let caps = re.captures(token).ok_or_else(malformed)?;
        let hemisphere = caps[1]
            .chars()
            .next()
            .and_then(Hemisphere::from_letter)
            .ok_or_else(malformed)?;
        let degrees: u16 = caps[2].parse().map_err(|_| malformed())?;
        let minutes: f64 = caps[3].parse().map_err(|_| malformed())?;

        let max_degrees = if hemisphere.is_latitude() { 90 } else { 180 };
        if minutes >= 60.0 || degrees > max_degrees || (degrees == max_degrees && minutes > 0.0) {
            return Err(CoordinateError::OutOfRange {
                token: token.to_string(),
            });
        }

        Ok(Self {
            hemisphere,
            degrees,
            minutes,
        })
    }

    /// Builds a component from signed decimal degrees.
    pub fn from_decimal(value: f64, latitude: bool) -> Self {
        let hemisphere = match (latitude, value < 0.0) {
            (true, false) => Hemisphere::N,
            (true, true) => Hemisphere::S,
            (false, false) => Hemisphere::E,
            (false, true) => Hemisphere::W,
        };
        let abs = value.abs();
        Self {
            hemisphere,
            degrees: abs.trunc() as u16,
            minutes: (abs - abs.trunc()) * 60.0,
        }
        .rounded()
    }

    /// Minutes rounded to the 4 decimals written to files, carrying a
    /// full 60 into the degrees.
    pub fn rounded(&self) -> Self {
        let mut degrees = self.degrees;
        let mut minutes = (self.minutes * 10_000.0).round() / 10_000.0;
        if minutes >= 60.0 {
            degrees += 1;
            minutes = 0.0;
        }
        Self {
            hemisphere: self.hemisphere,
            degrees,
            minutes,
        }
    }

    pub fn value(&self) -> f64 {
        self.degrees as f64 + self.minutes / 60.0
    }

    pub fn signed_value(&self) -> f64 {
        self.value() * self.hemisphere.sign()
    }
}

impl fmt::Display for CoordinateComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.rounded();
        write!(
            f,
            "{}{:02}* {:.4}'",
            c.hemisphere.letter(),
            c.degrees,
            c.minutes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_latitude() {
        let c = CoordinateComponent::parse("N40* 38.35'").unwrap();
        assert_eq!(c.hemisphere, Hemisphere::N);
        assert_eq!(c.degrees, 40);
        assert!((c.minutes - 38.35).abs() < 1e-9);
        assert!((c.signed_value() - 40.639_166).abs() < 1e-4);
    }

    #[test]
    fn test_parse_west_is_negative() {
        let c = CoordinateComponent::parse("W73* 46.44'").unwrap();
        assert!((c.signed_value() + 73.774).abs() < 1e-4);
    }

    #[test]
    fn test_parse_without_space_or_quote() {
        let c = CoordinateComponent::parse("s33*56.5").unwrap();
        assert_eq!(c.hemisphere, Hemisphere::S);
        assert_eq!(c.degrees, 33);
    }

    #[test]
    fn test_malformed() {
        for token in ["X40* 38.35'", "N40 38.35'", "N* 12'", "", "N40* abc'"] {
            assert!(
                matches!(
                    CoordinateComponent::parse(token),
                    Err(CoordinateError::Malformed { .. })
                ),
                "'{}' should be malformed",
                token
            );
        }
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            CoordinateComponent::parse("N91* 00.00'"),
            Err(CoordinateError::OutOfRange { .. })
        ));
        assert!(matches!(
            CoordinateComponent::parse("E12* 60.00'"),
            Err(CoordinateError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_display_pads() {
        let c = CoordinateComponent::parse("E5* 7.5'").unwrap();
        assert_eq!(c.to_string(), "E05* 7.5000'");
    }

    #[test]
    fn test_display_carries_rounded_minutes() {
        let c = CoordinateComponent::parse("N40* 59.99996'").unwrap();
        assert_eq!(c.to_string(), "N41* 0.0000'");
        let again = CoordinateComponent::parse(&c.to_string()).unwrap();
        assert_eq!((again.degrees, again.minutes), (41, 0.0));

        let pole = CoordinateComponent::parse("S89* 59.99999'").unwrap();
        assert!(CoordinateComponent::parse(&pole.to_string()).is_ok());
    }

    #[test]
    fn test_from_decimal() {
        let c = CoordinateComponent::from_decimal(-73.774, false);
        assert_eq!(c.hemisphere, Hemisphere::W);
        assert_eq!(c.degrees, 73);
        assert!((c.minutes - 46.44).abs() < 1e-4);
    }
}
