//! G-code line classification and word extraction

use regex::Regex;
use std::sync::OnceLock;

use seamshift_core::GcodeError;

use super::{MoveFields, ParsedLine};

/// Section annotation prefix written by PrusaSlicer-family slicers
pub const DEFAULT_SECTION_PREFIX: &str = ";TYPE:";

fn move_regex() -> &'static Regex {
    static MOVE_REGEX: OnceLock<Regex> = OnceLock::new();
    MOVE_REGEX.get_or_init(|| Regex::new(r"^G[01](?:[^0-9]|$)").expect("invalid regex pattern"))
}

fn reset_regex() -> &'static Regex {
    static RESET_REGEX: OnceLock<Regex> = OnceLock::new();
    RESET_REGEX.get_or_init(|| Regex::new(r"^G92(?:[^0-9]|$)").expect("invalid regex pattern"))
}

fn reset_e_regex() -> &'static Regex {
    static RESET_E_REGEX: OnceLock<Regex> = OnceLock::new();
    RESET_E_REGEX.get_or_init(|| {
        Regex::new(r"^G92\s+E([+-]?(?:\d+\.?\d*|\.\d+))\s*$").expect("invalid regex pattern")
    })
}

fn word_regex() -> &'static Regex {
    static WORD_REGEX: OnceLock<Regex> = OnceLock::new();
    WORD_REGEX.get_or_init(|| {
        Regex::new(r"([XYZEF])([+-]?(?:\d+\.?\d*|\.\d+))").expect("invalid regex pattern")
    })
}

/// Stateless G-code line classifier
///
/// Recognizes only what seam rewriting needs: absolute `G0`/`G1` moves,
/// `G92 E` extrusion resets and section markers. Everything else is
/// [`ParsedLine::Other`].
#[derive(Debug, Clone)]
pub struct LineParser {
    section_prefix: String,
}

impl LineParser {
    /// Create a parser using the default `;TYPE:` section prefix
    pub fn new() -> Self {
        Self::with_section_prefix(DEFAULT_SECTION_PREFIX)
    }

    /// Create a parser with a custom section marker prefix
    pub fn with_section_prefix(prefix: impl Into<String>) -> Self {
        Self {
            section_prefix: prefix.into(),
        }
    }

    /// Classify one line
    ///
    /// `line` may still carry its `\n` or `\r\n` terminator. `line_number`
    /// is 1-based and only used for error reporting.
    ///
    /// # Errors
    /// [`GcodeError::MalformedReset`] for a `G92` that is not exactly
    /// `G92 E<number>`, and [`GcodeError::InvalidNumber`] for a move word
    /// whose value is not finite.
    pub fn parse(&self, line: &str, line_number: u64) -> Result<ParsedLine, GcodeError> {
        let body = line.trim_end_matches(['\r', '\n']);

        if let Some(label) = body.strip_prefix(self.section_prefix.as_str()) {
            return Ok(ParsedLine::SectionMarker(label.trim().to_string()));
        }

        let command = strip_comment(body);

        if move_regex().is_match(command) {
            return self.parse_move(command, line_number).map(ParsedLine::Move);
        }

        if reset_regex().is_match(command) {
            return self.parse_reset(command, body, line_number);
        }

        Ok(ParsedLine::Other)
    }

    /// Classify one raw line
    ///
    /// Bytes that are not valid UTF-8 can only appear in comments or opaque
    /// text, so they are replaced before classification. The caller keeps the
    /// original bytes for output.
    pub fn parse_bytes(&self, line: &[u8], line_number: u64) -> Result<ParsedLine, GcodeError> {
        self.parse(&String::from_utf8_lossy(line), line_number)
    }

    fn parse_move(&self, command: &str, line_number: u64) -> Result<MoveFields, GcodeError> {
        let mut fields = MoveFields::default();

        for caps in word_regex().captures_iter(command) {
            let slot = match &caps[1] {
                "X" => &mut fields.x,
                "Y" => &mut fields.y,
                "Z" => &mut fields.z,
                "E" => &mut fields.e,
                _ => &mut fields.feed_rate,
            };
            // First occurrence of a word wins
            if slot.is_some() {
                continue;
            }
            let value = parse_number(&caps[2]).ok_or_else(|| GcodeError::InvalidNumber {
                line_number,
                word: caps[0].to_string(),
            })?;
            *slot = Some(value);
        }

        Ok(fields)
    }

    fn parse_reset(
        &self,
        command: &str,
        body: &str,
        line_number: u64,
    ) -> Result<ParsedLine, GcodeError> {
        let malformed = || GcodeError::MalformedReset {
            line_number,
            line: body.to_string(),
        };

        let caps = reset_e_regex().captures(command).ok_or_else(malformed)?;
        let e = parse_number(&caps[1]).ok_or_else(malformed)?;
        Ok(ParsedLine::PositionReset { e })
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Command part of a line, without a trailing `;` comment
fn strip_comment(body: &str) -> &str {
    match body.find(';') {
        Some(pos) => body[..pos].trim_end(),
        None => body.trim_end(),
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}
