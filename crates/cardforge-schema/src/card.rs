//! Character Card V3 root and data structs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lorebook::Lorebook;
use crate::{SPEC_V3, SPEC_VERSION_V3};

fn spec_tag() -> String {
    SPEC_V3.to_string()
}

fn spec_version() -> String {
    SPEC_VERSION_V3.to_string()
}

/// Character Card V3 root object.
///
/// `extra` holds any keys outside the spec, in document order, and is
/// flattened back in on serialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterCardV3 {
    #[serde(default = "spec_tag")]
    pub spec: String,
    #[serde(default = "spec_version")]
    pub spec_version: String,
    pub data: CharacterCardData,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl CharacterCardV3 {
    /// Wrap card data in a V3 envelope.
    pub fn new(data: CharacterCardData) -> Self {
        Self {
            spec: spec_tag(),
            spec_version: spec_version(),
            data,
            extra: IndexMap::new(),
        }
    }
}

/// The V3 `data` object.
///
/// `name` is the only required field; everything else defaults, matching how
/// cards in the wild omit what they don't use. Optional fields serialize as
/// explicit `null`s so a re-exported card keeps the same key set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterCardData {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub character_version: String,
    #[serde(default)]
    pub mes_example: String,
    #[serde(default)]
    pub extensions: IndexMap<String, Value>,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub post_history_instructions: String,
    #[serde(default)]
    pub first_mes: String,
    #[serde(default)]
    pub alternate_greetings: Vec<String>,
    #[serde(default)]
    pub personality: String,
    #[serde(default)]
    pub scenario: String,
    #[serde(default)]
    pub creator_notes: String,
    #[serde(default)]
    pub character_book: Option<Lorebook>,
    #[serde(default)]
    pub assets: Option<Vec<Asset>>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub creator_notes_multilingual: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub source: Option<Vec<String>>,
    #[serde(default)]
    pub group_only_greetings: Vec<String>,
    #[serde(default)]
    pub creation_date: Option<i64>,
    #[serde(default)]
    pub modification_date: Option<i64>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl CharacterCardData {
    /// Minimal card data with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

fn asset_type() -> String {
    "icon".to_string()
}

fn asset_uri() -> String {
    "ccdefault:".to_string()
}

fn asset_name() -> String {
    "main".to_string()
}

fn asset_ext() -> String {
    "png".to_string()
}

/// Character asset reference (icon, background, emotion sprite, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(rename = "type", default = "asset_type")]
    pub kind: String,
    #[serde(default = "asset_uri")]
    pub uri: String,
    #[serde(default = "asset_name")]
    pub name: String,
    #[serde(default = "asset_ext")]
    pub ext: String,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Default for Asset {
    fn default() -> Self {
        Self {
            kind: asset_type(),
            uri: asset_uri(),
            name: asset_name(),
            ext: asset_ext(),
            extra: IndexMap::new(),
        }
    }
}
