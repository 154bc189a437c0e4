//! V2 → V3 character card migration.
//!
//! V2 cards come in two shapes: a flat object with the fields at the root,
//! or a `{"data": {...}}` wrapper. Migration normalizes either into a V3
//! envelope, filling V3 defaults and carrying unknown fields through.

use serde_json::Value;
use thiserror::Error;

use crate::card::{CharacterCardData, CharacterCardV3};
use crate::{SPEC_V3, SPEC_VERSION_V3};

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("card data is not a JSON object")]
    NotAnObject,

    #[error("invalid card structure: {0}")]
    Structure(#[from] serde_json::Error),
}

/// Check whether a parsed card is in V2 format (as opposed to V3 or
/// something unrecognized).
pub fn is_v2_format(data: &Value) -> bool {
    let Some(obj) = data.as_object() else {
        return false;
    };

    if obj.get("spec").and_then(Value::as_str) == Some(SPEC_V3) {
        return false;
    }
    if obj.get("spec_version").and_then(Value::as_str) == Some(SPEC_VERSION_V3) {
        return false;
    }
    if let Some(nested) = obj.get("data").and_then(Value::as_object) {
        if nested.get("spec").and_then(Value::as_str) == Some(SPEC_V3) {
            return false;
        }
    }

    obj.contains_key("name")
        || obj
            .get("data")
            .and_then(Value::as_object)
            .is_some_and(|d| d.contains_key("name"))
}

/// Migrate a V2 card to the V3 envelope.
///
/// Direct field mapping where the schemas agree, V3 defaults for new
/// fields, unknown keys preserved. A missing `name` migrates to the empty
/// string rather than failing, like every V2 tool out there expects.
///
/// # Errors
///
/// Fails when the input is not an object, or a known field carries a value
/// of the wrong shape (e.g. a non-array `tags`).
pub fn migrate_v2_to_v3(v2: &Value) -> Result<CharacterCardV3, MigrateError> {
    let obj = v2.as_object().ok_or(MigrateError::NotAnObject)?;

    let mut source = match obj.get("data").and_then(Value::as_object) {
        Some(nested) => nested.clone(),
        None => obj.clone(),
    };
    source
        .entry("name")
        .or_insert_with(|| Value::String(String::new()));

    let data: CharacterCardData = serde_json::from_value(Value::Object(source))?;
    Ok(CharacterCardV3::new(data))
}
