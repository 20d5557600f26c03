//! Log codec: a movement instance's performance log as a JSON column.
//!
//! Only the inner log is written, without a variant tag. On read the
//! variant is chosen by the referenced movement's type, so a row cannot
//! disagree with its movement about what kind of metrics it holds.

use serde::de::DeserializeOwned;

use crate::model::{MovementType, PerformanceLog};

use super::{Result, StorageError};

/// Serializes a log for the `log_data` column.
///
/// Returns `None` when nothing has been recorded yet.
pub(crate) fn encode(log: Option<&PerformanceLog>) -> Result<Option<String>> {
    let Some(log) = log else {
        return Ok(None);
    };
    let json = match log {
        PerformanceLog::Strength(l) => serde_json::to_string(l)?,
        PerformanceLog::Cardio(l) => serde_json::to_string(l)?,
        PerformanceLog::Amrap(l) => serde_json::to_string(l)?,
        PerformanceLog::Emom(l) => serde_json::to_string(l)?,
    };
    Ok(Some(json))
}

/// Reconstructs a log from the `log_data` column.
///
/// A missing or empty blob decodes to `None`. So does any blob belonging
/// to a movement type this build doesn't know: new types can be added
/// without rewriting stored rows.
pub(crate) fn decode(
    blob: Option<&str>,
    movement_type: &MovementType,
) -> Result<Option<PerformanceLog>> {
    let Some(blob) = blob.filter(|b| !b.is_empty()) else {
        return Ok(None);
    };
    let log = match movement_type {
        MovementType::Strength => PerformanceLog::Strength(parse(blob, movement_type)?),
        MovementType::Cardio => PerformanceLog::Cardio(parse(blob, movement_type)?),
        MovementType::Amrap => PerformanceLog::Amrap(parse(blob, movement_type)?),
        MovementType::Emom => PerformanceLog::Emom(parse(blob, movement_type)?),
        MovementType::Other(name) => {
            tracing::debug!(movement_type = %name, "Skipping log data for unknown movement type");
            return Ok(None);
        }
    };
    Ok(Some(log))
}

fn parse<T: DeserializeOwned>(blob: &str, movement_type: &MovementType) -> Result<T> {
    serde_json::from_str(blob)
        .map_err(|e| StorageError::Corrupt(format!("invalid {movement_type} log data: {e}")))
}
