//! Workouts: a dated session of movement instances.

use jiff::{SignedDuration, Timestamp, civil::Date};
use serde::{Deserialize, Serialize};

use super::{MovementInstance, NewMovementInstance};

/// A stored workout with its instances in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: i64,
    pub user_id: i64,
    pub date: Date,
    pub notes: String,
    pub duration: SignedDuration,
    pub movement_instances: Vec<MovementInstance>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The full desired state of a workout, for create and update.
///
/// Updates replace the instance collection wholesale: instances missing
/// here are deleted.
///
/// The date must fall in years 1 through 9999.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkout {
    pub user_id: i64,
    pub date: Date,
    #[serde(default)]
    pub notes: String,
    /// Stored in whole seconds; a fractional part is rejected.
    pub duration: SignedDuration,
    #[serde(default)]
    pub movement_instances: Vec<NewMovementInstance>,
}
