//! # Seamshift Core
//!
//! Core types and utilities shared by the seamshift crates:
//! - [`Pose`]: the tracked toolhead position plus cumulative extrusion
//! - [`format_coordinate`]: compact fixed-point formatting for generated G-code words
//! - [`Error`] and friends: the layered error types used by every crate

pub mod error;
pub mod format;
pub mod pose;

pub use error::{ConfigError, Error, GcodeError, Result, SeamError};
pub use format::format_coordinate;
pub use pose::{lerp, Pose};
