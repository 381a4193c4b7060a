use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filename::{FilenameError, validate_flat_filename};

/// Rejected location identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location is required")]
    Missing,
    #[error("Invalid location '{raw}': {reason}")]
    Invalid { raw: String, reason: &'static str },
}

/// Caller-supplied identifier scoping a batch of uploads and one processing run.
///
/// Used verbatim as a directory name, so it is validated like a flat
/// filename: no separators, no `.`/`..`, no control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Location(String);

impl Location {
    pub fn parse(raw: &str) -> Result<Self, LocationError> {
        match validate_flat_filename(raw) {
            Ok(valid) => Ok(Self(valid.to_string())),
            Err(FilenameError::Empty) => Err(LocationError::Missing),
            Err(e) => Err(LocationError::Invalid {
                raw: raw.to_string(),
                reason: match e {
                    FilenameError::ContainsPathSeparator => "path separators are not allowed",
                    FilenameError::PathTraversal => "'.' and '..' are not allowed",
                    FilenameError::NullByte => "null bytes are not allowed",
                    FilenameError::Hidden => "must not start with '.'",
                    FilenameError::ControlCharacter | FilenameError::Empty => {
                        "control characters are not allowed"
                    }
                },
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Location {
    type Error = LocationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Location> for String {
    fn from(value: Location) -> Self {
        value.0
    }
}

impl AsRef<str> for Location {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
