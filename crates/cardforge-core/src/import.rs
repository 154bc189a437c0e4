//! Card import: PNG and JSON sources, normalized to V3.
//!
//! PNG import priority is `ccv3` over `chara`; JSON import accepts V3
//! directly and migrates anything V2-shaped.

use serde_json::Value;
use thiserror::Error;

use cardforge_schema::{CharacterCardV3, MigrateError, SPEC_V3, is_v2_format, migrate_v2_to_v3};

use crate::png::card::{CardKeyword, card_payload};
use crate::png::{PNG_SIGNATURE, PngError, parse_chunks};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("invalid PNG file: {0}")]
    Png(#[from] PngError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PNG contains no character card data (no ccv3 or chara chunk)")]
    NoCardData,

    #[error("V3 card missing 'data' field")]
    MissingData,

    #[error("failed to migrate V2 card: {0}")]
    Migrate(#[from] MigrateError),

    #[error("unrecognized card format: missing 'spec' or 'name' field")]
    UnknownFormat,
}

/// The schema generation a card was imported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    V2,
    V3,
}

/// Coarse content sniffing for uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Png,
    Json,
    Other,
}

/// Detect the file kind from leading bytes: PNG signature, a JSON document
/// start, or anything else.
pub fn detect_file_kind(data: &[u8]) -> FileKind {
    if data.len() >= PNG_SIGNATURE.len() && data[..PNG_SIGNATURE.len()] == PNG_SIGNATURE {
        return FileKind::Png;
    }

    match data.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{' | b'[') => FileKind::Json,
        _ => FileKind::Other,
    }
}

/// Import a card from JSON bytes.
///
/// # Errors
///
/// [`ImportError`] for unparseable JSON, a V3 envelope without `data`, a
/// failed V2 migration, or content that is neither V3- nor V2-shaped.
pub fn import_from_json(json: &str) -> Result<(CharacterCardV3, SourceFormat), ImportError> {
    let value: Value = serde_json::from_str(json)?;
    import_from_value(&value)
}

/// Import a card from an already-parsed JSON value.
///
/// # Errors
///
/// Same as [`import_from_json`], minus the JSON parse step.
pub fn import_from_value(value: &Value) -> Result<(CharacterCardV3, SourceFormat), ImportError> {
    let Some(obj) = value.as_object() else {
        return Err(ImportError::UnknownFormat);
    };

    if obj.get("spec").and_then(Value::as_str) == Some(SPEC_V3) {
        if !obj.contains_key("data") {
            return Err(ImportError::MissingData);
        }
        let card: CharacterCardV3 = serde_json::from_value(value.clone())?;
        return Ok((card, SourceFormat::V3));
    }

    if is_v2_format(value) {
        let card = migrate_v2_to_v3(value)?;
        return Ok((card, SourceFormat::V2));
    }

    Err(ImportError::UnknownFormat)
}

/// Import a card from PNG bytes.
///
/// A V2-shaped payload found inside a `ccv3` chunk is reported as V3: the
/// chunk keyword is the authoritative format marker.
///
/// # Errors
///
/// [`ImportError::Png`] for a bad signature, [`ImportError::NoCardData`]
/// when no card chunk is present, plus everything `import_from_json` can
/// return for the embedded payload.
pub fn import_from_png(data: &[u8]) -> Result<(CharacterCardV3, SourceFormat), ImportError> {
    // Validate the stream shape first so a non-PNG upload reports as such
    // rather than as "no card data".
    parse_chunks(data)?;

    let (keyword, json) = card_payload(data).ok_or(ImportError::NoCardData)?;
    let (card, mut format) = import_from_json(&json)?;

    if keyword == CardKeyword::Ccv3 {
        format = SourceFormat::V3;
    }

    Ok((card, format))
}
