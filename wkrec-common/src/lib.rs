//! # wkrec Common Library
//!
//! Shared code for the wkrec services including:
//! - Configuration loading (TOML + environment overrides)
//! - Ranking store schema
//! - Entity identifier transforms
//! - Common error type

pub mod config;
pub mod db;
pub mod entity_id;
pub mod error;

pub use error::{Error, Result};
