//! Kanboard Import Library
//!
//! Moves a Wunderlist-style JSON export into a Kanboard SQLite database.
//! This module exports the core components for testing and integration.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;

pub use error::{ImportError, ImportResult};
pub use import::{ImportSummary, Importer, run};
