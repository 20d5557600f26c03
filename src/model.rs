//! Core data model for Flex Creek.
//!
//! Users record workouts. A workout aggregates movement instances, each one
//! a concrete performance of a reusable movement carrying the metrics that
//! the movement's type calls for.

mod instance;
mod log;
mod movement;
mod muscle;
mod user;
mod workout;

pub use instance::{MovementInstance, NewMovementInstance};
pub use log::{AmrapLog, CardioLog, EmomLog, PerformanceLog, Set, StrengthLog};
pub use movement::{Movement, MovementType, NewMovement};
pub use muscle::{Muscle, NewMuscle};
pub use user::{NewUser, User};
pub use workout::{NewWorkout, Workout};
