//! Lorebook (world book) structs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// World book attached to a card via `character_book`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lorebook {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub scan_depth: Option<i64>,
    #[serde(default)]
    pub token_budget: Option<i64>,
    #[serde(default)]
    pub recursive_scanning: Option<bool>,
    #[serde(default)]
    pub extensions: IndexMap<String, Value>,
    #[serde(default)]
    pub entries: Vec<LorebookEntry>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

fn enabled_default() -> bool {
    true
}

/// A single world book entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LorebookEntry {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub extensions: IndexMap<String, Value>,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    #[serde(default)]
    pub insertion_order: i64,
    #[serde(default)]
    pub case_sensitive: Option<bool>,
    #[serde(default)]
    pub use_regex: bool,
    #[serde(default)]
    pub constant: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub id: Option<EntryId>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub selective: Option<bool>,
    #[serde(default)]
    pub secondary_keys: Vec<String>,
    #[serde(default)]
    pub position: Option<EntryPosition>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Default for LorebookEntry {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            content: String::new(),
            extensions: IndexMap::new(),
            enabled: true,
            insertion_order: 0,
            case_sensitive: None,
            use_regex: false,
            constant: None,
            name: None,
            priority: None,
            id: None,
            comment: None,
            selective: None,
            secondary_keys: Vec::new(),
            position: None,
            extra: IndexMap::new(),
        }
    }
}

/// Entry ids in the wild are either numbers or strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryId {
    Num(i64),
    Text(String),
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Where an entry is inserted relative to the character definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPosition {
    BeforeChar,
    AfterChar,
}
