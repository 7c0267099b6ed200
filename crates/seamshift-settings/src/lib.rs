//! Seamshift Settings Crate
//!
//! Tunable constants for seam rewriting, with TOML/JSON persistence and validation.

pub mod config;

pub use config::SeamSettings;
