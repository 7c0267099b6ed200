//! Current toolhead pose tracking

use seamshift_core::Pose;

use super::{MoveRecord, ParsedLine};

/// Tracks the pose implied by the input stream
///
/// Only absolute positioning is modelled. Every move updates the pose, and
/// `G92 E` rewrites the extrusion axis without moving.
#[derive(Debug, Clone, Default)]
pub struct PositionTracker {
    pose: Pose,
}

impl PositionTracker {
    /// Start at the origin with zero extrusion
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a known pose
    pub fn with_pose(pose: Pose) -> Self {
        Self { pose }
    }

    /// Current pose
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Apply a parsed line
    ///
    /// Returns the move resolved against the pose before the line when the
    /// line is a move.
    pub fn apply(&mut self, line: &ParsedLine) -> Option<MoveRecord> {
        match line {
            ParsedLine::Move(fields) => {
                let from = self.pose;
                let to = fields.target_from(&from);
                self.pose = to;
                Some(MoveRecord::between(from, to, fields.feed_rate))
            }
            ParsedLine::PositionReset { e } => {
                self.pose.e = *e;
                None
            }
            ParsedLine::SectionMarker(_) | ParsedLine::Other => None,
        }
    }
}
