//! cardforge-schema - Character Card data model
//!
//! Typed rendition of the Character Card V3 specification, plus V2→V3
//! migration and token-count heuristics.
//!
//! # Unknown fields
//!
//! Card producers routinely attach fields outside the spec. Every struct
//! here carries an order-preserving `extra` map populated via
//! `#[serde(flatten)]`, so unrecognized keys survive a parse/serialize
//! round trip verbatim instead of being dropped.

pub mod card;
pub mod lorebook;
pub mod migrate;
pub mod tokens;

// Re-exports
pub use card::{Asset, CharacterCardData, CharacterCardV3};
pub use lorebook::{EntryId, EntryPosition, Lorebook, LorebookEntry};
pub use migrate::{MigrateError, is_v2_format, migrate_v2_to_v3};
pub use tokens::{TokenWarning, estimate_card_tokens, estimate_tokens, token_warning_level};

/// The `spec` tag identifying a V3 card.
pub const SPEC_V3: &str = "chara_card_v3";

/// The `spec_version` of the V3 schema this crate targets.
pub const SPEC_VERSION_V3: &str = "3.0";
