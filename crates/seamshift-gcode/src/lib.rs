//! # Seamshift G-Code
//!
//! Line-level G-code handling for seamshift:
//! - [`LineParser`]: classifies a line as a move, an extrusion reset, a
//!   section marker or opaque text
//! - [`PositionTracker`]: applies parsed lines to the current [`Pose`](seamshift_core::Pose)
//! - [`LineReader`] and [`write_atomically`]: byte-faithful line streams and
//!   in-place file replacement

pub mod command;
pub mod parser;
pub mod stream;
pub mod tracker;

pub use command::{MoveFields, MoveRecord, ParsedLine};
pub use parser::{LineParser, DEFAULT_SECTION_PREFIX};
pub use stream::{open_lines, write_atomically, LineReader};
pub use tracker::PositionTracker;
