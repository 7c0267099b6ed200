//! # Seamshift Seam
//!
//! Detection and rewriting of external perimeter loops.
//!
//! Slicers start and end every external perimeter at the same point, and the
//! flow change there leaves a visible seam. This crate finds those loops in a
//! G-code stream and re-emits each one starting a short distance along the
//! loop, with `G92 E` resets so the rest of the program is unaffected.
//!
//! ## Architecture
//!
//! ```text
//! StreamDriver (one pass over the input)
//!   ├── LineParser / PositionTracker (seamshift-gcode)
//!   ├── LoopDetector (state machine, owns the open LoopCandidate)
//!   └── SeamRewriter (output for a ClosedLoop)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use seamshift_seam::process_str;
//! use seamshift_settings::SeamSettings;
//!
//! let (output, summary) = process_str(&gcode, &SeamSettings::default())?;
//! println!("{summary}");
//! ```

pub mod candidate;
pub mod detector;
pub mod driver;
pub mod rewriter;

pub use candidate::{split_move, CandidateStage, ClosedLoop, LoopCandidate, SeamMove};
pub use detector::{AbandonReason, LineContext, LoopDetector, Step};
pub use driver::{process_reader, process_str, rewrite_file, RunSummary, StreamDriver};
pub use rewriter::SeamRewriter;
