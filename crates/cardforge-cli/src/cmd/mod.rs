//! Subcommand implementations.

pub mod check_url;
pub mod embed;
pub mod extract;
pub mod inspect;
pub mod models;
pub mod strip;
