//! Configuration module for the texbake pipeline
//!
//! Provides types and parsing for `texbake.toml` project configuration.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
