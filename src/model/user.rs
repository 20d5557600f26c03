//! Users: the owners of workouts.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A stored user.
///
/// The password hash is opaque here. Hashing and verification happen
/// before anything reaches storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub hashed_password: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub hashed_password: String,
}
