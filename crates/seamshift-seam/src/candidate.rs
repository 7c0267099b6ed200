//! Per-loop move accumulation and the transition split

use seamshift_core::Pose;
use seamshift_gcode::MoveRecord;

/// One print move of a buffered loop, reduced to where it ends and how much
/// it extrudes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeamMove {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Extrusion delta of this move
    pub de: f64,
}

impl SeamMove {
    /// Move ending at `position` extruding `de`
    pub fn to(position: &Pose, de: f64) -> Self {
        Self {
            x: position.x,
            y: position.y,
            z: position.z,
            de,
        }
    }
}

/// Which header line the candidate expects next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateStage {
    /// Approach travel captured, waiting for the switch to the external section
    AwaitingSection,
    /// Section switch captured, waiting for the feed rate line
    AwaitingFeedRate,
    /// All three header lines captured, buffering print moves
    Accumulating,
}

/// Split a print move at the point where the loop reaches `target`
///
/// `prior` is the loop distance accumulated before this move. Returns the
/// entry ending at the split point, and the remainder of the move when the
/// split falls strictly inside it.
///
/// The split position blends from the move's end back toward its start, so
/// `split == 1` yields the start of the move.
pub fn split_move(record: &MoveRecord, prior: f64, target: f64) -> (SeamMove, Option<SeamMove>) {
    let split = ((target - prior) / record.distance).min(1.0);
    let split_position = record.to.lerp_position(&record.from, split);
    let head = SeamMove::to(&split_position, split * record.de);

    let tail = (split < 1.0).then(|| SeamMove::to(&record.to, record.de * (1.0 - split)));
    (head, tail)
}

/// An external perimeter loop being evaluated
///
/// Holds every raw line captured so far so the loop can be written back
/// unchanged if it turns out not to qualify.
#[derive(Debug, Clone)]
pub struct LoopCandidate {
    raw_lines: Vec<Vec<u8>>,
    stage: CandidateStage,
    start: Pose,
    total_e: f64,
    total_distance: f64,
    moves: Vec<SeamMove>,
    transition: Option<usize>,
}

impl LoopCandidate {
    /// Open a candidate on its approach travel line
    ///
    /// `start` is the pose the travel ends at, which is where the loop starts.
    pub fn open(line: Vec<u8>, start: Pose) -> Self {
        Self {
            raw_lines: vec![line],
            stage: CandidateStage::AwaitingSection,
            start,
            total_e: 0.0,
            total_distance: 0.0,
            moves: Vec::new(),
            transition: None,
        }
    }

    /// Next expected header line
    pub fn stage(&self) -> CandidateStage {
        self.stage
    }

    /// Capture the next header line
    pub fn push_header(&mut self, line: Vec<u8>) {
        debug_assert!(self.moves.is_empty());
        self.raw_lines.push(line);
        self.stage = match self.stage {
            CandidateStage::AwaitingSection => CandidateStage::AwaitingFeedRate,
            CandidateStage::AwaitingFeedRate | CandidateStage::Accumulating => {
                CandidateStage::Accumulating
            }
        };
    }

    /// Buffer a print move, splitting it if it crosses `target`
    pub fn push_print_move(&mut self, line: Vec<u8>, record: &MoveRecord, target: f64) {
        debug_assert_eq!(self.stage, CandidateStage::Accumulating);
        self.raw_lines.push(line);

        let prior = self.total_distance;
        self.total_e += record.de;
        self.total_distance += record.distance;

        if self.transition.is_none() && self.total_distance >= target {
            let (head, tail) = split_move(record, prior, target);
            self.moves.push(head);
            self.transition = Some(self.moves.len() - 1);
            if let Some(tail) = tail {
                self.moves.push(tail);
            }
        } else {
            self.moves.push(SeamMove::to(&record.to, record.de));
        }
    }

    /// Pose at the end of the approach travel
    pub fn start(&self) -> Pose {
        self.start
    }

    /// Extrusion accumulated over the buffered print moves
    pub fn total_e(&self) -> f64 {
        self.total_e
    }

    /// XY distance accumulated over the buffered print moves
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Buffered move entries
    pub fn moves(&self) -> &[SeamMove] {
        &self.moves
    }

    /// Index of the entry ending at the transition point, once reached
    pub fn transition(&self) -> Option<usize> {
        self.transition
    }

    /// Give up on the candidate, returning its lines for verbatim output
    pub fn into_raw_lines(self) -> Vec<Vec<u8>> {
        self.raw_lines
    }

    /// Turn a candidate whose transition was reached into a closed loop
    ///
    /// Returns the candidate unchanged when the transition was never reached.
    pub fn close(self) -> Result<ClosedLoop, LoopCandidate> {
        match (self.stage, self.transition) {
            (CandidateStage::Accumulating, Some(transition)) => {
                let mut raw = self.raw_lines.into_iter().skip(1);
                let section_line = raw.next().unwrap_or_default();
                let feed_rate_line = raw.next().unwrap_or_default();
                Ok(ClosedLoop {
                    section_line,
                    feed_rate_line,
                    start: self.start,
                    total_e: self.total_e,
                    total_distance: self.total_distance,
                    moves: self.moves,
                    transition,
                })
            }
            _ => Err(self),
        }
    }
}

/// A loop that returned to its start after passing the transition point
#[derive(Debug, Clone)]
pub struct ClosedLoop {
    /// Captured section switch line
    pub section_line: Vec<u8>,
    /// Captured feed rate line
    pub feed_rate_line: Vec<u8>,
    /// Pose the loop started from
    pub start: Pose,
    /// Extrusion over the whole loop
    pub total_e: f64,
    /// XY length of the whole loop
    pub total_distance: f64,
    /// Loop moves, with the transition move split
    pub moves: Vec<SeamMove>,
    /// Index of the entry ending at the transition point
    pub transition: usize,
}

impl ClosedLoop {
    /// Extrusion of the entries up to and including the transition entry
    pub fn extrusion_to_transition(&self) -> f64 {
        self.moves[..=self.transition].iter().map(|m| m.de).sum()
    }
}
