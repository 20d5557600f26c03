//! Flex Creek: persistence for workouts, movements, and the people who do them.
//!
//! [`Storage`] is the entry point. Workouts are written and read together
//! with their movement instances; each instance's metrics are stored as a
//! JSON log whose shape is dictated by the type of movement performed.

pub mod model;
pub mod storage;

pub use storage::{InstanceStore, Storage, StorageError};
