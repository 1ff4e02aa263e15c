//! Coordinate module - latitude/longitude pairs and their text form

use std::fmt;
use std::str::FromStr;

/// A geographic coordinate in decimal degrees
///
/// The text form is `"lat, lng"`, which is both what the completion service is
/// asked to answer with and what prediction files contain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in [-90, 90]
    pub lat: f64,
    /// Longitude in [-180, 180]
    pub lng: f64,
}

/// Why a `"lat, lng"` string was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinateParseError {
    /// The text did not contain exactly one comma
    SeparatorCount(usize),
    /// One of the halves is not a number
    NotNumeric(String),
    /// The numbers are outside the valid latitude/longitude range
    OutOfRange,
}

impl fmt::Display for CoordinateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateParseError::SeparatorCount(n) => {
                write!(f, "expected exactly one ',' but found {}", n)
            }
            CoordinateParseError::NotNumeric(s) => write!(f, "'{}' is not a number", s),
            CoordinateParseError::OutOfRange => write!(f, "coordinate out of range"),
        }
    }
}

impl std::error::Error for CoordinateParseError {}

impl Coordinate {
    /// Placeholder written when no valid coordinate could be obtained
    pub const SENTINEL: Coordinate = Coordinate { lat: 0.0, lng: 0.0 };

    /// Create a coordinate, rejecting out-of-range values
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateParseError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateParseError::OutOfRange);
        }
        Ok(Self { lat, lng })
    }

    /// Whether this is the sentinel placeholder
    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }
}

impl FromStr for Coordinate {
    type Err = CoordinateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let commas = s.matches(',').count();
        if commas != 1 {
            return Err(CoordinateParseError::SeparatorCount(commas));
        }
        let (lat, lng) = s
            .split_once(',')
            .ok_or(CoordinateParseError::SeparatorCount(0))?;
        let lat = parse_degrees(lat)?;
        let lng = parse_degrees(lng)?;
        Coordinate::new(lat, lng)
    }
}

fn parse_degrees(s: &str) -> Result<f64, CoordinateParseError> {
    let trimmed = s.trim();
    trimmed
        .parse::<f64>()
        .map_err(|_| CoordinateParseError::NotNumeric(trimmed.to_string()))
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug formatting keeps the trailing ".0" so the sentinel reads "0.0, 0.0"
        write!(f, "{:?}, {:?}", self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let coord: Coordinate = "48.8584, 2.2945".parse().unwrap();
        assert_eq!(coord.lat, 48.8584);
        assert_eq!(coord.lng, 2.2945);
    }

    #[test]
    fn test_parse_without_space() {
        let coord: Coordinate = "-33.8568,151.2153".parse().unwrap();
        assert_eq!(coord.lat, -33.8568);
        assert_eq!(coord.lng, 151.2153);
    }

    #[test]
    fn test_parse_rejects_extra_separators() {
        let result = "1.0, 2.0, 3.0".parse::<Coordinate>();
        assert_eq!(result, Err(CoordinateParseError::SeparatorCount(2)));
    }

    #[test]
    fn test_parse_rejects_prose() {
        let result = "Latitude 48.85 and longitude 2.29".parse::<Coordinate>();
        assert_eq!(result, Err(CoordinateParseError::SeparatorCount(0)));

        let result = "Paris, France".parse::<Coordinate>();
        assert!(matches!(result, Err(CoordinateParseError::NotNumeric(_))));
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert_eq!(
            "91.0, 0.0".parse::<Coordinate>(),
            Err(CoordinateParseError::OutOfRange)
        );
        assert_eq!(
            "nan, 0.0".parse::<Coordinate>(),
            Err(CoordinateParseError::OutOfRange)
        );
    }

    #[test]
    fn test_sentinel_display() {
        assert_eq!(Coordinate::SENTINEL.to_string(), "0.0, 0.0");
        assert!(Coordinate::SENTINEL.is_sentinel());
    }

    #[test]
    fn test_display_parses_back() {
        let coord = Coordinate::new(35.6762, 139.6503).unwrap();
        let parsed: Coordinate = coord.to_string().parse().unwrap();
        assert_eq!(coord, parsed);
    }
}
