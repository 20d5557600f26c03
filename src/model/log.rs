//! Performance logs: what was actually done during a movement instance.

use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use super::MovementType;

/// The metrics recorded for one movement instance.
///
/// The variant is not stored with the data. It is implied by the type of
/// the movement the instance references, so the blob holds only the inner
/// log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PerformanceLog {
    Strength(StrengthLog),
    Cardio(CardioLog),
    Amrap(AmrapLog),
    Emom(EmomLog),
}

impl PerformanceLog {
    /// The movement type this log belongs to.
    pub fn movement_type(&self) -> MovementType {
        match self {
            Self::Strength(_) => MovementType::Strength,
            Self::Cardio(_) => MovementType::Cardio,
            Self::Amrap(_) => MovementType::Amrap,
            Self::Emom(_) => MovementType::Emom,
        }
    }
}

/// Sets of reps at a weight, in the order performed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthLog {
    pub sets: Vec<Set>,
}

/// A single strength set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Set {
    pub reps: u32,
    pub weight: f64,
}

/// Distance and/or time covered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardioLog {
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub duration: Option<SignedDuration>,
}

/// As many rounds as possible within a time cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmrapLog {
    pub duration: SignedDuration,
    pub rounds: u32,
    /// Reps completed in the unfinished final round.
    pub extra_reps: u32,
    /// The prescribed work for one round.
    pub work: String,
}

/// Every minute on the minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmomLog {
    pub duration: SignedDuration,
    /// The work performed at the top of each minute.
    pub work: String,
}
