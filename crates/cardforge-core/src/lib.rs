//! cardforge-core - PNG card codec, egress security gate, and API clients
//!
//! # Overview
//!
//! CardForge embeds character-card JSON in PNG text chunks and relays
//! requests to OpenAI-compatible AI backends. This crate is the whole of
//! that machinery minus the HTTP service shell:
//!
//! - **`png`** - chunk-stream codec, text-chunk transcoding, and metadata
//!   injection. The one hard invariant lives here: pixel data (`IDAT`) is
//!   never decompressed or re-encoded; every operation is a byte-level
//!   splice on text chunks.
//! - **`security`** - the outbound request gate (allowlist + DNS-resolved
//!   private-range rejection) and the credential redactor. Every
//!   network-facing feature validates its destination here before a client
//!   is constructed.
//! - **`import`** / **`export`** - card extraction and embedding on top of
//!   the codec, with V2→V3 normalization.
//! - **`net`** - reqwest clients for AI backends and the third-party
//!   character importer, both fenced by the gate.
//! - **`config`** - explicit `Settings` value handed to gate and client
//!   constructors at startup; no ambient global.
//!
//! All codec and gate operations are pure and stateless; the only I/O in
//! the core is DNS resolution inside [`security::EgressPolicy::validate`]
//! and the clients in [`net`].

pub mod config;
pub mod export;
pub mod import;
pub mod net;
pub mod png;
pub mod security;

// Re-exports for convenience
pub use config::Settings;
pub use export::{ExportOptions, export_to_png};
pub use import::{SourceFormat, import_from_json, import_from_png};
pub use png::card::{CardKeyword, card_payload, inject_text_chunk, read_text_chunks};
pub use security::{EgressPolicy, SecurityError, redact};

/// User Agent string for outbound requests
pub const USER_AGENT: &str = concat!("cardforge/", env!("CARGO_PKG_VERSION"));
