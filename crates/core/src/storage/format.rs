use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::CoreError;
use crate::models::preferences::UiPreferences;

/// Current preferences file format version.
pub const CURRENT_VERSION: u16 = 1;

/// On-disk envelope:
///
/// ```text
/// { "version": 1, "preferences": { "showBRL": false, "language": "pt", ... } }
/// ```
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u16,
    preferences: UiPreferences,
}

/// Serialize preferences into the current envelope, pretty-printed.
pub fn write_file(preferences: &UiPreferences) -> Result<Vec<u8>, CoreError> {
    let envelope = Envelope {
        version: CURRENT_VERSION,
        preferences: preferences.clone(),
    };
    serde_json::to_vec_pretty(&envelope)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize preferences: {e}")))
}

/// Parse an envelope, checking the version before the body.
pub fn read_file(data: &[u8]) -> Result<UiPreferences, CoreError> {
    let raw: Value = serde_json::from_slice(data)
        .map_err(|e| CoreError::InvalidFileFormat(format!("Not a JSON document: {e}")))?;

    let version = raw
        .get("version")
        .and_then(Value::as_u64)
        .ok_or_else(|| CoreError::InvalidFileFormat("Missing format version".into()))?;
    let version = u16::try_from(version).map_err(|_| CoreError::UnsupportedVersion(u16::MAX))?;
    if version == 0 || version > CURRENT_VERSION {
        return Err(CoreError::UnsupportedVersion(version));
    }

    let envelope: Envelope = serde_json::from_value(raw)
        .map_err(|e| CoreError::InvalidFileFormat(format!("Malformed preferences: {e}")))?;
    Ok(envelope.preferences)
}
