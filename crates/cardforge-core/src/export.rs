//! Card export: embed a V3 card into a PNG.
//!
//! Writes the `ccv3` chunk always and, by default, a flattened V2
//! `chara` chunk so older tools can still read the card. JSON is compact -
//! no whitespace - to keep chunk sizes down.

use serde_json::Value;
use thiserror::Error;

use cardforge_schema::CharacterCardV3;

use crate::import::{ImportError, import_from_png};
use crate::png::PngError;
use crate::png::card::{KEYWORD_CCV3, KEYWORD_CHARA, inject_text_chunk};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("invalid base PNG: {0}")]
    Png(#[from] PngError),

    #[error("failed to serialize card: {0}")]
    Json(#[from] serde_json::Error),

    #[error("exported PNG failed re-import: {0}")]
    Reimport(#[from] ImportError),

    #[error("export verification failed: {0}")]
    Verify(String),
}

/// Export knobs. Defaults: write the V2 compatibility chunk and stamp the
/// modification date.
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    pub include_v2_compat: bool,
    pub update_modification_date: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_v2_compat: true,
            update_modification_date: true,
        }
    }
}

/// Fields that exist only in V3; dropped from the `chara` compatibility
/// payload.
const V3_ONLY_FIELDS: [&str; 6] = [
    "group_only_greetings",
    "nickname",
    "creator_notes_multilingual",
    "source",
    "creation_date",
    "modification_date",
];

fn v2_compat_json(card: &CharacterCardV3) -> Result<String, serde_json::Error> {
    let mut data = serde_json::to_value(&card.data)?;
    if let Some(obj) = data.as_object_mut() {
        for field in V3_ONLY_FIELDS {
            obj.remove(field);
        }
    }
    serde_json::to_string(&data)
}

/// Embed a card into a PNG.
///
/// Only text chunks are touched; `IHDR`, `IDAT`, `IEND` and everything else are
/// copied through byte-identically.
///
/// # Errors
///
/// [`ExportError`] when the base image is not a valid PNG or the card
/// fails to serialize.
pub fn export_to_png(
    png: &[u8],
    card: &CharacterCardV3,
    options: ExportOptions,
) -> Result<Vec<u8>, ExportError> {
    let mut card = card.clone();
    if options.update_modification_date {
        card.data.modification_date = Some(chrono::Utc::now().timestamp());
    }

    let v3_json = serde_json::to_string(&card)?;
    let mut out = inject_text_chunk(png, KEYWORD_CCV3, &v3_json, true)?;

    if options.include_v2_compat {
        let v2_json = v2_compat_json(&card)?;
        out = inject_text_chunk(&out, KEYWORD_CHARA, &v2_json, true)?;
    }

    tracing::debug!(
        name = %card.data.name,
        bytes = out.len(),
        v2_compat = options.include_v2_compat,
        "exported card"
    );
    Ok(out)
}

/// Re-import an exported PNG and compare against the original card.
///
/// The default check covers the fields users actually notice (name,
/// greeting, description); `strict` compares the full JSON value modulo
/// `modification_date`.
///
/// # Errors
///
/// [`ExportError::Reimport`] when the PNG no longer imports,
/// [`ExportError::Verify`] on a content mismatch.
pub fn verify_export(
    exported: &[u8],
    original: &CharacterCardV3,
    strict: bool,
) -> Result<(), ExportError> {
    let (reimported, _) = import_from_png(exported)?;

    if reimported.data.name != original.data.name {
        return Err(ExportError::Verify(format!(
            "name mismatch: '{}' vs '{}'",
            original.data.name, reimported.data.name
        )));
    }
    if reimported.data.first_mes != original.data.first_mes {
        return Err(ExportError::Verify("first_mes content mismatch".into()));
    }
    if reimported.data.description != original.data.description {
        return Err(ExportError::Verify("description content mismatch".into()));
    }

    if strict {
        let mut a = serde_json::to_value(original)?;
        let mut b = serde_json::to_value(&reimported)?;
        for v in [&mut a, &mut b] {
            if let Some(data) = v.get_mut("data").and_then(Value::as_object_mut) {
                data.remove("modification_date");
            }
        }
        if a != b {
            return Err(ExportError::Verify("strict comparison mismatch".into()));
        }
    }

    Ok(())
}

/// Filename for a downloaded export: sanitized name plus timestamp.
pub fn export_filename(card: &CharacterCardV3) -> String {
    let name = if card.data.name.is_empty() {
        "character"
    } else {
        &card.data.name
    };

    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe: String = safe.trim().chars().take(50).collect();

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    format!("{safe}_{timestamp}.png")
}
