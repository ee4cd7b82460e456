use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of shots in one series.
pub const SHOTS_PER_SERIES: usize = 5;

/// Highest value a single shot can score.
pub const MAX_SHOT_VALUE: u8 = 10;

/// A single scored shot as entered by a range officer.
///
/// Serialized as its wire token: `"0"`..`"10"` or `"X"` for an inner ten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Shot {
    Points(u8),
    InnerTen,
}

impl Shot {
    pub fn value(self) -> u8 {
        match self {
            Shot::Points(points) => points,
            Shot::InnerTen => MAX_SHOT_VALUE,
        }
    }

    pub fn is_inner_ten(self) -> bool {
        matches!(self, Shot::InnerTen)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid shot token '{0}': expected 0-10 or X")]
pub struct InvalidShotToken(pub String);

impl FromStr for Shot {
    type Err = InvalidShotToken;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token == "X" {
            return Ok(Shot::InnerTen);
        }

        // Canonical decimal only: "07", "+7" and " 7" are rejected.
        match token.parse::<u8>() {
            Ok(points) if points <= MAX_SHOT_VALUE && points.to_string() == token => {
                Ok(Shot::Points(points))
            }
            _ => Err(InvalidShotToken(token.to_string())),
        }
    }
}

impl fmt::Display for Shot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shot::Points(points) => write!(f, "{}", points),
            Shot::InnerTen => f.write_str("X"),
        }
    }
}

impl TryFrom<String> for Shot {
    type Error = InvalidShotToken;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        token.parse()
    }
}

impl From<Shot> for String {
    fn from(shot: Shot) -> Self {
        shot.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_every_valid_token() {
        for points in 0..=10u8 {
            assert_eq!(points.to_string().parse::<Shot>(), Ok(Shot::Points(points)));
        }
        assert_eq!("X".parse::<Shot>(), Ok(Shot::InnerTen));
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        for token in ["11", "-1", "x", "", " 9", "09", "+5", "10.0", "XX"] {
            assert!(token.parse::<Shot>().is_err(), "token {:?} should be rejected", token);
        }
    }

    #[test]
    fn test_invalid_token_is_a_std_error() {
        let err = "11".parse::<Shot>().unwrap_err();
        let boxed: Box<dyn std::error::Error> = Box::new(err.clone());

        assert_eq!(err, InvalidShotToken("11".to_string()));
        assert_eq!(boxed.to_string(), "invalid shot token '11': expected 0-10 or X");
    }

    #[test]
    fn test_inner_ten_counts_as_ten() {
        assert_eq!(Shot::InnerTen.value(), 10);
        assert!(Shot::InnerTen.is_inner_ten());
        assert!(!Shot::Points(10).is_inner_ten());
    }

    #[test]
    fn test_serializes_as_wire_token() {
        let shots = vec![Shot::InnerTen, Shot::Points(7)];
        let json = serde_json::to_string(&shots).unwrap();
        assert_eq!(json, r#"["X","7"]"#);

        let back: Vec<Shot> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, shots);
        assert!(serde_json::from_str::<Shot>(r#""12""#).is_err());
    }
}
