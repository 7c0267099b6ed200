//! Streaming driver tying parser, tracker, detector and rewriter together

use std::fmt;
use std::io::{BufRead, Write};
use std::path::Path;

use seamshift_core::Result;
use seamshift_gcode::{open_lines, write_atomically, LineParser, LineReader, PositionTracker};
use seamshift_settings::SeamSettings;

use crate::detector::{AbandonReason, LineContext, LoopDetector, Step};
use crate::rewriter::SeamRewriter;

/// Counters collected over one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Input lines consumed
    pub lines_read: u64,
    /// Output lines produced
    pub lines_written: u64,
    /// External perimeter loops rewritten
    pub loops_rewritten: u64,
    /// Candidates given up after their section switch matched
    pub loops_abandoned: u64,
    /// Candidate still open at end of input
    pub loops_unclosed: u64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lines in, {} lines out, {} loops rewritten, {} abandoned, {} unclosed",
            self.lines_read,
            self.lines_written,
            self.loops_rewritten,
            self.loops_abandoned,
            self.loops_unclosed
        )
    }
}

/// Single-pass seam rewriting over a line stream
///
/// Owns all state carried between lines: the tracked pose, the current and
/// previous section labels and the open loop candidate.
pub struct StreamDriver {
    parser: LineParser,
    tracker: PositionTracker,
    detector: LoopDetector,
    rewriter: SeamRewriter,
    section: Option<String>,
    summary: RunSummary,
}

impl StreamDriver {
    /// Create a driver from settings
    pub fn new(settings: SeamSettings) -> Self {
        Self {
            parser: LineParser::with_section_prefix(settings.section_prefix.clone()),
            tracker: PositionTracker::new(),
            rewriter: SeamRewriter::new(&settings),
            detector: LoopDetector::new(settings),
            section: None,
            summary: RunSummary::default(),
        }
    }

    /// Counters so far
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Process one raw input line, terminator included
    ///
    /// # Errors
    /// Fatal parse errors, loop invariant violations and write failures.
    pub fn process_line(&mut self, mut line: Vec<u8>, out: &mut dyn Write) -> Result<()> {
        self.summary.lines_read += 1;
        let line_number = self.summary.lines_read;

        let parsed = self.parser.parse_bytes(&line, line_number)?;
        let previous_section = match parsed.section_label() {
            Some(label) => self.section.replace(label.to_string()),
            None => self.section.clone(),
        };
        let section = self.section.clone();
        let record = self.tracker.apply(&parsed);

        let ctx = LineContext {
            line_number,
            record: record.as_ref(),
            previous_section: previous_section.as_deref(),
            section: section.as_deref(),
        };

        loop {
            match self.detector.step(line, &ctx)? {
                Step::Pass(text) => {
                    self.emit(out, &text)?;
                    return Ok(());
                }
                Step::Held => return Ok(()),
                Step::Abandoned {
                    flushed,
                    current,
                    reason,
                } => {
                    if reason != AbandonReason::NoSectionSwitch {
                        self.summary.loops_abandoned += 1;
                        tracing::debug!(
                            line = line_number,
                            %reason,
                            "left external perimeter unchanged"
                        );
                    }
                    for text in &flushed {
                        self.emit(out, text)?;
                    }
                    // The detector is idle now, so this cannot abandon again
                    line = current;
                }
                Step::Completed { closed, closing } => {
                    for text in self.rewriter.rewrite(&closed) {
                        self.emit(out, &text)?;
                    }
                    self.emit(out, &closing)?;
                    self.summary.loops_rewritten += 1;
                    return Ok(());
                }
            }
        }
    }

    /// Flush a candidate left open at end of input and return the counters
    pub fn finish(mut self, out: &mut dyn Write) -> Result<RunSummary> {
        if let Some(lines) = self.detector.finish() {
            tracing::debug!(lines = lines.len(), "input ended inside a loop candidate");
            self.summary.loops_unclosed += 1;
            for text in &lines {
                self.emit(out, text)?;
            }
        }
        out.flush()?;
        Ok(self.summary)
    }

    fn emit(&mut self, out: &mut dyn Write, text: &[u8]) -> Result<()> {
        out.write_all(text)?;
        self.summary.lines_written += 1;
        Ok(())
    }
}

/// Rewrite every qualifying loop read from `reader` into `writer`
///
/// # Errors
/// Invalid settings, plus everything [`StreamDriver::process_line`] reports.
pub fn process_reader<R: BufRead>(
    reader: R,
    writer: &mut dyn Write,
    settings: &SeamSettings,
) -> Result<RunSummary> {
    settings.validate()?;
    let mut driver = StreamDriver::new(settings.clone());
    for line in LineReader::new(reader) {
        driver.process_line(line?, writer)?;
    }
    driver.finish(writer)
}

/// Rewrite every qualifying loop in an in-memory program
pub fn process_str(input: &str, settings: &SeamSettings) -> Result<(String, RunSummary)> {
    let mut output = Vec::with_capacity(input.len() + input.len() / 8);
    let summary = process_reader(input.as_bytes(), &mut output, settings)?;
    // Every byte written is either copied from `input` or ASCII we generated
    let output = String::from_utf8(output)
        .map_err(|e| seamshift_core::Error::other(format!("output is not UTF-8: {}", e)))?;
    Ok((output, summary))
}

/// Rewrite the file at `path` in place
///
/// The original is replaced only after the whole file has been processed;
/// on any error it is left untouched.
pub fn rewrite_file(path: &Path, settings: &SeamSettings) -> Result<RunSummary> {
    settings.validate()?;
    let reader = open_lines(path)?;

    write_atomically(path, |out| {
        let mut driver = StreamDriver::new(settings.clone());
        for line in reader {
            driver.process_line(line?, out)?;
        }
        driver.finish(out)
    })
}
