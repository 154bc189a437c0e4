//! Outbound HTTP clients.
//!
//! Two consumers of the egress gate live here: the OpenAI-compatible AI
//! relay and the third-party character importer. Both re-validate their
//! destination through [`crate::security::EgressPolicy`] on every request -
//! constructing a client is not a pass.

pub mod client;
pub mod cookies;
pub mod importer;
pub mod sse;
pub mod types;

pub use client::{AiClient, AiClientError};
pub use cookies::{cookie_header, parse_cookies};
pub use importer::{ImporterClient, ImporterError, extract_character_id};
pub use types::{
    ChatMessage, ChatRequest, ChatResponse, ImageRequest, ImageResponse, ModelsResponse,
    StreamChunk,
};
