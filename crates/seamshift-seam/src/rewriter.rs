//! Seam rewrite of a closed external perimeter loop
//!
//! The loop is re-emitted starting at its transition point instead of its
//! original start, so the flow change a slicer leaves at the loop start ends
//! up at the transition point. Output for a closed loop:
//!
//! 1. the section switch and feed rate lines, verbatim
//! 2. a blend move to the transition point extruding a scaled average flow
//! 3. `G92 E` to the extrusion the original loop had at the transition point
//! 4. the moves after the transition point
//! 5. the moves up to and including the transition point
//! 6. `G92 E` to the extrusion the original loop ended with
//!
//! The two resets keep every line after the loop numerically identical to
//! the input, whatever the blend move extruded.

use seamshift_core::format_coordinate;
use seamshift_settings::SeamSettings;

use crate::candidate::{ClosedLoop, SeamMove};

/// Emits the rewritten lines for closed loops
#[derive(Debug, Clone)]
pub struct SeamRewriter {
    transition_distance: f64,
    seam_width_factor: f64,
    xy_precision: usize,
    e_precision: usize,
}

impl SeamRewriter {
    /// Create a rewriter from settings
    pub fn new(settings: &SeamSettings) -> Self {
        Self {
            transition_distance: settings.transition_distance,
            seam_width_factor: settings.seam_width_factor,
            xy_precision: settings.xy_precision,
            e_precision: settings.e_precision,
        }
    }

    /// Extrusion value of the blend move to the transition point
    pub fn blend_extrusion(&self, closed: &ClosedLoop) -> f64 {
        let flow = closed.total_e / closed.total_distance;
        closed.start.e + self.seam_width_factor * flow * self.transition_distance
    }

    /// Rewrite a closed loop into output lines
    ///
    /// The header lines are returned exactly as captured; every other line is
    /// generated ASCII.
    pub fn rewrite(&self, closed: &ClosedLoop) -> Vec<Vec<u8>> {
        let split = closed.transition + 1;
        let mut lines = Vec::with_capacity(closed.moves.len() + 5);

        lines.push(closed.section_line.clone());
        lines.push(closed.feed_rate_line.clone());

        let seam = &closed.moves[closed.transition];
        lines.push(self.move_line(seam, self.blend_extrusion(closed)));

        let mut e = closed.start.e + closed.extrusion_to_transition();
        lines.push(self.reset_line(e));

        for seam_move in closed.moves[split..].iter().chain(&closed.moves[..split]) {
            e += seam_move.de;
            lines.push(self.move_line(seam_move, e));
        }

        lines.push(self.reset_line(closed.start.e + closed.total_e));
        lines
    }

    fn move_line(&self, seam_move: &SeamMove, e: f64) -> Vec<u8> {
        format!(
            "G1 X{} Y{} E{}\n",
            format_coordinate(seam_move.x, self.xy_precision),
            format_coordinate(seam_move.y, self.xy_precision),
            format_coordinate(e, self.e_precision)
        )
        .into_bytes()
    }

    fn reset_line(&self, e: f64) -> Vec<u8> {
        format!("G92 E{}\n", format_coordinate(e, self.e_precision)).into_bytes()
    }
}
