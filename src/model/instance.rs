//! Movement instances: one performance of a movement within a workout.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{Movement, PerformanceLog};

/// A stored movement instance, with its movement resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementInstance {
    pub id: i64,
    pub workout_id: i64,
    pub movement: Movement,
    pub notes: String,
    /// Rate of perceived exertion, 1 to 10.
    pub rpe: Option<u8>,
    /// `None` until metrics have been recorded.
    pub log: Option<PerformanceLog>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A movement instance to insert, or the replacement state for an update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMovementInstance {
    /// Overwritten by the workout store when inserted as part of a workout.
    #[serde(default)]
    pub workout_id: i64,
    pub movement_id: i64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub rpe: Option<u8>,
    #[serde(default)]
    pub log: Option<PerformanceLog>,
}
