//! Movements: reusable exercise definitions.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A named exercise, e.g. a back squat or a 5k row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: i64,
    pub name: String,
    pub movement_type: MovementType,
    pub description: Option<String>,
    /// Names of the muscles the movement works, sorted.
    pub muscles: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A movement that has not been stored yet.
///
/// Every name in `muscles` must already exist as a stored muscle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMovement {
    pub name: String,
    pub movement_type: MovementType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub muscles: Vec<String>,
}

/// How performances of a movement are measured.
///
/// The type decides which log variant an instance of the movement may
/// carry, so it cannot change once instances exist. Values written by newer versions land in `Other` so that old rows
/// still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MovementType {
    Strength,
    Cardio,
    Amrap,
    Emom,
    Other(String),
}

impl MovementType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Strength => "strength",
            Self::Cardio => "cardio",
            Self::Amrap => "amrap",
            Self::Emom => "emom",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for MovementType {
    fn from(s: &str) -> Self {
        match s {
            "strength" => Self::Strength,
            "cardio" => Self::Cardio,
            "amrap" => Self::Amrap,
            "emom" => Self::Emom,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for MovementType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<MovementType> for String {
    fn from(t: MovementType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
