//! External perimeter loop detection
//!
//! The detector is a small state machine fed one line at a time. A loop
//! qualifies when it looks exactly like this:
//!
//! ```text
//! G1 X.. Y..            short travel to the loop start (no Z, no E)
//! ;TYPE:External perimeter   section switch away from "Perimeter"
//! G1 F..                feed rate only
//! G1 X.. Y.. E..        print moves around the loop
//! ...
//! G1 X.. Y.. F..        travel away, starting near the loop start
//! ```
//!
//! Anything else abandons the candidate: its lines go out untouched and the
//! current line is looked at again as if no candidate had been open. The
//! exception is a move after the feed rate line that has no XY length or
//! changes Z, which stops the run.

use seamshift_core::{Result, SeamError};
use seamshift_gcode::MoveRecord;
use seamshift_settings::SeamSettings;

use crate::candidate::{CandidateStage, ClosedLoop, LoopCandidate};

/// What the detector knows about the line being fed
#[derive(Debug, Clone, Copy)]
pub struct LineContext<'a> {
    /// 1-based input line number
    pub line_number: u64,
    /// The move this line performs, if it is a move
    pub record: Option<&'a MoveRecord>,
    /// Section label before this line
    pub previous_section: Option<&'a str>,
    /// Section label after this line
    pub section: Option<&'a str>,
}

/// Why a candidate was given up
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AbandonReason {
    /// The line after the approach travel did not switch to the external section
    NoSectionSwitch,
    /// The section switch was not followed by a feed rate only move
    NoFeedRateLine,
    /// A non-move line interrupted the loop
    Interrupted,
    /// The loop ended too far from where it started
    NotClosed { gap: f64 },
    /// The loop closed before reaching the transition distance
    TooShort { length: f64 },
}

impl std::fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSectionSwitch => write!(f, "no switch to the external perimeter section"),
            Self::NoFeedRateLine => write!(f, "no feed rate line after the section switch"),
            Self::Interrupted => write!(f, "loop interrupted by a non-move line"),
            Self::NotClosed { gap } => write!(f, "loop ends {:.4} away from its start", gap),
            Self::TooShort { length } => {
                write!(f, "loop length {:.4} is below the transition distance", length)
            }
        }
    }
}

/// Result of feeding one line to the detector
#[derive(Debug)]
pub enum Step {
    /// The line is not part of any candidate; write it as is
    Pass(Vec<u8>),
    /// The line was captured by the open candidate
    Held,
    /// The candidate was dropped. Write `flushed` unchanged, then feed
    /// `current` again; the detector is idle at this point.
    Abandoned {
        flushed: Vec<Vec<u8>>,
        current: Vec<u8>,
        reason: AbandonReason,
    },
    /// The loop closed. Write its rewrite, then `closing` as is.
    Completed { closed: ClosedLoop, closing: Vec<u8> },
}

/// Line-by-line external perimeter loop detector
#[derive(Debug)]
pub struct LoopDetector {
    settings: SeamSettings,
    candidate: Option<LoopCandidate>,
}

impl LoopDetector {
    /// Create an idle detector
    pub fn new(settings: SeamSettings) -> Self {
        Self {
            settings,
            candidate: None,
        }
    }

    /// Whether a candidate is open
    pub fn is_active(&self) -> bool {
        self.candidate.is_some()
    }

    /// Close out the stream, returning the lines of a candidate that never finished
    pub fn finish(&mut self) -> Option<Vec<Vec<u8>>> {
        self.candidate.take().map(LoopCandidate::into_raw_lines)
    }

    /// Feed one line
    ///
    /// # Errors
    /// [`SeamError::InvariantViolation`] when a move after the feed rate
    /// line has no XY length or changes Z.
    pub fn step(&mut self, line: Vec<u8>, ctx: &LineContext<'_>) -> Result<Step> {
        let Some(candidate) = self.candidate.take() else {
            return Ok(self.idle(line, ctx));
        };

        match candidate.stage() {
            CandidateStage::AwaitingSection => Ok(self.await_section(candidate, line, ctx)),
            CandidateStage::AwaitingFeedRate => Ok(self.await_feed_rate(candidate, line, ctx)),
            CandidateStage::Accumulating => self.accumulate(candidate, line, ctx),
        }
    }

    fn idle(&mut self, line: Vec<u8>, ctx: &LineContext<'_>) -> Step {
        let tol = self.settings.tolerance;
        match ctx.record {
            Some(r)
                if r.distance > tol
                    && r.distance < self.settings.max_approach_distance
                    && r.dz.abs() < tol
                    && r.de.abs() < tol =>
            {
                tracing::trace!(line = ctx.line_number, "opening loop candidate");
                self.candidate = Some(LoopCandidate::open(line, r.to));
                Step::Held
            }
            _ => Step::Pass(line),
        }
    }

    fn await_section(
        &mut self,
        mut candidate: LoopCandidate,
        line: Vec<u8>,
        ctx: &LineContext<'_>,
    ) -> Step {
        let switched = ctx.record.is_none()
            && ctx.previous_section == Some(self.settings.interior_label.as_str())
            && ctx.section == Some(self.settings.external_label.as_str());

        if switched {
            candidate.push_header(line);
            self.candidate = Some(candidate);
            Step::Held
        } else {
            abandon(candidate, line, AbandonReason::NoSectionSwitch)
        }
    }

    fn await_feed_rate(
        &mut self,
        mut candidate: LoopCandidate,
        line: Vec<u8>,
        ctx: &LineContext<'_>,
    ) -> Step {
        match ctx.record {
            Some(r) if r.is_stationary(self.settings.tolerance) && r.feed_rate.is_some() => {
                candidate.push_header(line);
                self.candidate = Some(candidate);
                Step::Held
            }
            _ => abandon(candidate, line, AbandonReason::NoFeedRateLine),
        }
    }

    fn accumulate(
        &mut self,
        mut candidate: LoopCandidate,
        line: Vec<u8>,
        ctx: &LineContext<'_>,
    ) -> Result<Step> {
        let tol = self.settings.tolerance;
        let Some(r) = ctx.record else {
            return Ok(abandon(candidate, line, AbandonReason::Interrupted));
        };

        // Holds for the closing travel too
        if r.distance <= tol {
            return Err(SeamError::InvariantViolation {
                line_number: ctx.line_number,
                reason: format!("move has no XY length ({:e})", r.distance),
            }
            .into());
        }
        if r.dz.abs() >= tol {
            return Err(SeamError::InvariantViolation {
                line_number: ctx.line_number,
                reason: format!("move changes Z by {}", r.dz),
            }
            .into());
        }

        if r.is_print_move(tol) {
            candidate.push_print_move(line, r, self.settings.transition_distance);
            self.candidate = Some(candidate);
            return Ok(Step::Held);
        }

        // Travel: the loop is over
        let gap = r.from.planar_distance(&candidate.start());
        if gap >= self.settings.max_end_gap {
            tracing::warn!(
                line = ctx.line_number,
                gap,
                "external perimeter does not return to its start, leaving it unchanged"
            );
            return Ok(abandon(candidate, line, AbandonReason::NotClosed { gap }));
        }

        let length = candidate.total_distance();
        match candidate.close() {
            Ok(closed) => {
                tracing::debug!(
                    line = ctx.line_number,
                    moves = closed.moves.len(),
                    length = closed.total_distance,
                    "external perimeter loop closed"
                );
                Ok(Step::Completed {
                    closed,
                    closing: line,
                })
            }
            Err(candidate) => Ok(abandon(candidate, line, AbandonReason::TooShort { length })),
        }
    }
}

fn abandon(candidate: LoopCandidate, current: Vec<u8>, reason: AbandonReason) -> Step {
    tracing::trace!(%reason, "abandoning loop candidate");
    Step::Abandoned {
        flushed: candidate.into_raw_lines(),
        current,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seamshift_core::Pose;

    const INTERIOR: Option<&str> = Some("Perimeter");
    const EXTERNAL: Option<&str> = Some("External perimeter");

    fn ctx<'a>(
        record: Option<&'a MoveRecord>,
        previous_section: Option<&'a str>,
        section: Option<&'a str>,
    ) -> LineContext<'a> {
        LineContext {
            line_number: 1,
            record,
            previous_section,
            section,
        }
    }

    fn feed(detector: &mut LoopDetector, line: &str, line_ctx: &LineContext<'_>) -> Step {
        detector.step(line.as_bytes().to_vec(), line_ctx).unwrap()
    }

    fn start() -> Pose {
        Pose::new(0.5, 0.0, 0.2, 1.0)
    }

    /// Detector holding an approach travel to `start()`
    fn opened() -> LoopDetector {
        let mut detector = LoopDetector::new(SeamSettings::default());
        let r = MoveRecord::between(Pose::new(0.0, 0.0, 0.2, 1.0), start(), None);
        let line_ctx = ctx(Some(&r), INTERIOR, INTERIOR);
        assert!(matches!(feed(&mut detector, "G1 X0.5\n", &line_ctx), Step::Held));
        detector
    }

    /// Detector holding the approach travel and the section switch
    fn switched() -> LoopDetector {
        let mut detector = opened();
        let line_ctx = ctx(None, INTERIOR, EXTERNAL);
        let step = feed(&mut detector, ";TYPE:External perimeter\n", &line_ctx);
        assert!(matches!(step, Step::Held));
        detector
    }

    /// Detector with all three header lines captured
    fn accumulating() -> LoopDetector {
        let mut detector = switched();
        let r = MoveRecord::between(start(), start(), Some(1800.0));
        let line_ctx = ctx(Some(&r), EXTERNAL, EXTERNAL);
        assert!(matches!(feed(&mut detector, "G1 F1800\n", &line_ctx), Step::Held));
        detector
    }

    fn abandoned(step: Step) -> (Vec<Vec<u8>>, Vec<u8>, AbandonReason) {
        match step {
            Step::Abandoned {
                flushed,
                current,
                reason,
            } => (flushed, current, reason),
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn test_long_travel_does_not_open() {
        let mut detector = LoopDetector::new(SeamSettings::default());
        let r = MoveRecord::between(Pose::default(), Pose::new(5.0, 0.0, 0.0, 0.0), None);
        let step = feed(&mut detector, "G1 X5\n", &ctx(Some(&r), None, None));
        assert!(matches!(step, Step::Pass(ref l) if l == b"G1 X5\n"));
        assert!(!detector.is_active());
    }

    #[test]
    fn test_travel_at_approach_limit_does_not_open() {
        let mut detector = LoopDetector::new(SeamSettings::default());
        let r = MoveRecord::between(Pose::default(), Pose::new(1.0, 0.0, 0.0, 0.0), None);
        let step = feed(&mut detector, "G1 X1\n", &ctx(Some(&r), None, None));
        assert!(matches!(step, Step::Pass(_)));
        assert!(!detector.is_active());
    }

    #[test]
    fn test_extruding_move_does_not_open() {
        let mut detector = LoopDetector::new(SeamSettings::default());
        let r = MoveRecord::between(Pose::default(), Pose::new(0.5, 0.0, 0.0, 0.1), None);
        let step = feed(&mut detector, "G1 X0.5 E0.1\n", &ctx(Some(&r), None, None));
        assert!(matches!(step, Step::Pass(_)));
    }

    #[test]
    fn test_wrong_section_abandons() {
        let mut detector = opened();
        let line = ";TYPE:External perimeter\n";
        let line_ctx = ctx(None, Some("Solid infill"), EXTERNAL);

        let (flushed, current, reason) = abandoned(feed(&mut detector, line, &line_ctx));
        assert_eq!(flushed, vec![b"G1 X0.5\n".to_vec()]);
        assert_eq!(current, line.as_bytes());
        assert_eq!(reason, AbandonReason::NoSectionSwitch);
        assert!(!detector.is_active());
    }

    #[test]
    fn test_move_instead_of_section_switch_abandons() {
        let mut detector = opened();
        let r = MoveRecord::between(start(), Pose::new(0.8, 0.0, 0.2, 1.0), None);
        let line_ctx = ctx(Some(&r), INTERIOR, INTERIOR);

        let (flushed, current, reason) = abandoned(feed(&mut detector, "G1 X0.8\n", &line_ctx));
        assert_eq!(flushed.len(), 1);
        assert_eq!(current, b"G1 X0.8\n");
        assert_eq!(reason, AbandonReason::NoSectionSwitch);
    }

    #[test]
    fn test_full_header_accepts_print_moves() {
        let mut detector = accumulating();
        let r = MoveRecord::between(start(), Pose::new(5.0, 0.0, 0.2, 1.2), None);
        let line_ctx = ctx(Some(&r), EXTERNAL, EXTERNAL);
        assert!(matches!(feed(&mut detector, "G1 X5 E1.2\n", &line_ctx), Step::Held));
        assert!(detector.is_active());
    }

    #[test]
    fn test_missing_feed_rate_abandons() {
        let mut detector = switched();
        let r = MoveRecord::between(start(), start(), None);
        let line_ctx = ctx(Some(&r), EXTERNAL, EXTERNAL);

        let (flushed, _, reason) = abandoned(feed(&mut detector, "G1\n", &line_ctx));
        assert_eq!(flushed.len(), 2);
        assert_eq!(reason, AbandonReason::NoFeedRateLine);
    }

    #[test]
    fn test_feed_rate_line_that_moves_abandons() {
        let mut detector = switched();
        let r = MoveRecord::between(start(), Pose::new(1.0, 0.0, 0.2, 1.0), Some(1800.0));
        let line_ctx = ctx(Some(&r), EXTERNAL, EXTERNAL);

        let (flushed, _, reason) = abandoned(feed(&mut detector, "G1 X1 F1800\n", &line_ctx));
        assert_eq!(flushed.len(), 2);
        assert_eq!(reason, AbandonReason::NoFeedRateLine);
    }

    #[test]
    fn test_feed_rate_line_that_extrudes_abandons() {
        let mut detector = switched();
        let r = MoveRecord::between(start(), Pose::new(0.5, 0.0, 0.2, 1.5), Some(2100.0));
        let line_ctx = ctx(Some(&r), EXTERNAL, EXTERNAL);

        let (_, _, reason) = abandoned(feed(&mut detector, "G1 E1.5 F2100\n", &line_ctx));
        assert_eq!(reason, AbandonReason::NoFeedRateLine);
    }

    #[test]
    fn test_travel_changing_z_inside_loop_is_fatal() {
        let mut detector = accumulating();
        let r = MoveRecord::between(start(), Pose::new(0.5, 0.0, 0.6, 1.0), Some(9000.0));
        let line_ctx = ctx(Some(&r), EXTERNAL, EXTERNAL);
        let err = detector
            .step(b"G1 Z0.6 F9000\n".to_vec(), &line_ctx)
            .unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_retract_inside_loop_is_fatal() {
        let mut detector = accumulating();
        let r = MoveRecord::between(start(), Pose::new(0.5, 0.0, 0.2, 0.2), Some(2100.0));
        let line_ctx = ctx(Some(&r), EXTERNAL, EXTERNAL);
        let err = detector
            .step(b"G1 E0.2 F2100\n".to_vec(), &line_ctx)
            .unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_finish_returns_open_lines() {
        let mut detector = opened();
        assert_eq!(detector.finish(), Some(vec![b"G1 X0.5\n".to_vec()]));
        assert_eq!(detector.finish(), None);
    }
}
