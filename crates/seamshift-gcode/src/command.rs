//! Parsed G-code line types

use seamshift_core::Pose;

/// Axis and feed rate words present on a `G0`/`G1` line
///
/// A missing word means the axis keeps its previous value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveFields {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub e: Option<f64>,
    pub feed_rate: Option<f64>,
}

impl MoveFields {
    /// Resolve these fields against the pose they start from
    pub fn target_from(&self, from: &Pose) -> Pose {
        Pose {
            x: self.x.unwrap_or(from.x),
            y: self.y.unwrap_or(from.y),
            z: self.z.unwrap_or(from.z),
            e: self.e.unwrap_or(from.e),
        }
    }
}

/// Classification of a single input line
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// Linear move (`G0` / `G1`)
    Move(MoveFields),
    /// Extrusion axis reset (`G92 E...`)
    PositionReset { e: f64 },
    /// Slicer section annotation (`;TYPE:<label>`)
    SectionMarker(String),
    /// Anything else; passed through untouched
    Other,
}

impl ParsedLine {
    /// Section label carried by this line, if it is a marker
    pub fn section_label(&self) -> Option<&str> {
        match self {
            ParsedLine::SectionMarker(label) => Some(label),
            _ => None,
        }
    }
}

/// A move resolved against the pose it started from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveRecord {
    /// Pose before the move
    pub from: Pose,
    /// Pose after the move
    pub to: Pose,
    /// Feed rate word, if the line carried one
    pub feed_rate: Option<f64>,
    /// XY distance travelled
    pub distance: f64,
    /// Change in Z
    pub dz: f64,
    /// Change in extrusion
    pub de: f64,
}

impl MoveRecord {
    /// Build a record from the poses on either side of a move
    pub fn between(from: Pose, to: Pose, feed_rate: Option<f64>) -> Self {
        Self {
            from,
            to,
            feed_rate,
            distance: from.planar_distance(&to),
            dz: to.z - from.z,
            de: to.e - from.e,
        }
    }

    /// A move that extrudes and carries no feed rate change
    pub fn is_print_move(&self, tolerance: f64) -> bool {
        self.feed_rate.is_none() && self.de.abs() > tolerance
    }

    /// A move with no XY, Z or E displacement
    pub fn is_stationary(&self, tolerance: f64) -> bool {
        self.distance < tolerance && self.dz.abs() < tolerance && self.de.abs() < tolerance
    }
}
