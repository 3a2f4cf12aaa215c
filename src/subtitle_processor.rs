use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::errors::SubtitleError;
use crate::word_timing;

// @module: Timed-text parsing (SRT and WebVTT) into a cue timeline

// @const: Cue timing line, "<start> --> <end> [settings]"
static TIMING_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\S+)\s*-->\s*(\S+)(?:\s+.*)?$").unwrap()
});

// @const: SRT timestamp, HH:MM:SS,mmm
static SRT_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d{1,2}):(\d{1,2})(?:,(\d+))?$").unwrap()
});

// @const: VTT timestamp, [HH:]MM:SS.mmm
static VTT_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+):)?(\d{1,2}):(\d{1,2})(?:\.(\d+))?$").unwrap()
});

/// Supported timed-text formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    /// SubRip (`.srt`), comma decimal separator, numbered blocks
    Srt,
    /// WebVTT (`.vtt`), dot decimal separator, optional cue identifiers
    Vtt,
}

impl SubtitleFormat {
    /// Select a format from a file name suffix (case-insensitive).
    ///
    /// Anything other than `.srt` or `.vtt` is rejected here so that the parser
    /// only ever sees an explicit, supported format.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_default();

        extension
            .parse()
            .map_err(|_| SubtitleError::UnsupportedFormat(path.display().to_string()))
    }

    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Vtt => "vtt",
        }
    }

    /// Decimal separator used between seconds and milliseconds
    fn decimal_separator(&self) -> char {
        match self {
            Self::Srt => ',',
            Self::Vtt => '.',
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for SubtitleFormat {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "srt" => Ok(Self::Srt),
            "vtt" => Ok(Self::Vtt),
            other => Err(SubtitleError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// One word of a cue with its interpolated time interval (seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl Word {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Word {
            text: text.into(),
            start,
            end,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// One timed subtitle entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    // @field: Start time in seconds
    pub start: f64,

    // @field: End time in seconds
    pub end: f64,

    // @field: Display text, line breaks collapsed to spaces
    pub text: String,

    // @field: Per-word intervals; empty when only cue-level timing exists
    #[serde(default)]
    pub words: Vec<Word>,
}

impl Cue {
    /// Creates a cue without word-level timing
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Cue {
            start,
            end,
            text: text.into(),
            words: Vec::new(),
        }
    }

    /// Returns the cue with its words subdivided across its duration
    pub fn with_word_timing(mut self) -> Self {
        self.words = word_timing::expand(&self);
        self
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether word-level highlighting is available for this cue
    pub fn has_word_timing(&self) -> bool {
        !self.words.is_empty()
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} --> {}  {}",
            format_timestamp(self.start, SubtitleFormat::Srt),
            format_timestamp(self.end, SubtitleFormat::Srt),
            self.text
        )
    }
}

/// Parse raw subtitle text in the given format.
///
/// This never fails: input that does not match the format's grammar produces
/// an empty list and the caller decides how to tell the user. Cues come back
/// in source order. SRT cues carry word timing, VTT cues do not.
pub fn parse(format: SubtitleFormat, raw: &str) -> Vec<Cue> {
    let cues = match format {
        SubtitleFormat::Srt => parse_srt(raw),
        SubtitleFormat::Vtt => parse_vtt(raw),
    };

    if cues.is_empty() {
        warn!("No {} cues found in content", format);
    } else {
        debug!("Parsed {} {} cues", cues.len(), format);
    }

    cues
}

/// Parse SubRip content, expanding each cue into timed words
pub fn parse_srt(raw: &str) -> Vec<Cue> {
    split_blocks(raw)
        .iter()
        .enumerate()
        .filter_map(|(block_num, lines)| parse_block(lines, SubtitleFormat::Srt, block_num + 1))
        .map(Cue::with_word_timing)
        .collect()
}

/// Parse WebVTT content into cue-level entries
pub fn parse_vtt(raw: &str) -> Vec<Cue> {
    split_blocks(raw)
        .iter()
        .enumerate()
        .filter_map(|(block_num, lines)| {
            let lines = strip_vtt_header(lines);
            if is_vtt_metadata_block(lines) {
                return None;
            }
            parse_block(lines, SubtitleFormat::Vtt, block_num + 1)
        })
        .collect()
}

/// Parse one timestamp to seconds (`HH:MM:SS,mmm` for SRT, `[HH:]MM:SS.mmm` for VTT)
pub fn parse_timestamp(timestamp: &str, format: SubtitleFormat) -> Option<f64> {
    let regex = match format {
        SubtitleFormat::Srt => &SRT_TIMESTAMP_REGEX,
        SubtitleFormat::Vtt => &VTT_TIMESTAMP_REGEX,
    };
    let caps = regex.captures(timestamp.trim())?;

    let hours = capture_number(&caps, 1).unwrap_or(0.0);
    let minutes = capture_number(&caps, 2)?;
    let seconds = capture_number(&caps, 3)?;
    if minutes >= 60.0 || seconds >= 60.0 {
        return None;
    }

    let fraction = match caps.get(4) {
        Some(m) => format!("0.{}", m.as_str()).parse::<f64>().ok()?,
        None => 0.0,
    };

    Some(hours * 3600.0 + minutes * 60.0 + seconds + fraction)
}

/// Format seconds as `HH:MM:SS,mmm` (SRT) or `HH:MM:SS.mmm` (VTT)
pub fn format_timestamp(seconds: f64, format: SubtitleFormat) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1_000;
    let millis = total_ms % 1_000;

    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        hours,
        minutes,
        secs,
        format.decimal_separator(),
        millis
    )
}

fn capture_number(caps: &Captures, idx: usize) -> Option<f64> {
    caps.get(idx)?.as_str().parse::<f64>().ok()
}

/// Split content into blank-line separated blocks of trimmed lines
fn split_blocks(raw: &str) -> Vec<Vec<&str>> {
    let content = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    // `lines()` drops the '\r' of "\r\n"; trimming handles stray ones
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(trimmed);
    }

    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// Drop the `WEBVTT` header from a block that runs straight into the first cue.
///
/// Header metadata lines before the timing line go too; the line right above
/// it is kept as the cue identifier.
fn strip_vtt_header<'a, 'b>(lines: &'a [&'b str]) -> &'a [&'b str] {
    let is_header = lines.first().is_some_and(|first| first.starts_with("WEBVTT"));
    if !is_header {
        return lines;
    }

    match lines.iter().position(|line| line.contains("-->")) {
        Some(timing_idx) => &lines[timing_idx.saturating_sub(1).max(1)..],
        None => lines,
    }
}

fn is_vtt_metadata_block(lines: &[&str]) -> bool {
    lines.first().is_some_and(|first| {
        first.starts_with("WEBVTT")
            || first.starts_with("NOTE")
            || first.starts_with("STYLE")
            || first.starts_with("REGION")
    })
}

/// Parse a single block atomically: either a complete cue or nothing
fn parse_block(lines: &[&str], format: SubtitleFormat, block_num: usize) -> Option<Cue> {
    // The timing line is first, or second after an SRT index / VTT identifier
    let timing_idx = lines
        .iter()
        .take(2)
        .position(|line| line.contains("-->"));

    let Some(timing_idx) = timing_idx else {
        debug!("Block {} has no timing line, skipping", block_num);
        return None;
    };

    if format == SubtitleFormat::Srt && timing_idx == 1 && lines[0].parse::<usize>().is_err() {
        warn!("Block {} has an invalid sequence number '{}', skipping", block_num, lines[0]);
        return None;
    }

    let Some(caps) = TIMING_LINE_REGEX.captures(lines[timing_idx]) else {
        warn!("Block {} has a malformed timing line: {}", block_num, lines[timing_idx]);
        return None;
    };

    let start = parse_timestamp(&caps[1], format);
    let end = parse_timestamp(&caps[2], format);
    let (Some(start), Some(end)) = (start, end) else {
        warn!("Invalid {} timestamp in block {}: {}", format, block_num, lines[timing_idx]);
        return None;
    };

    if end < start {
        warn!(
            "Skipping block {}: end {:.3}s is before start {:.3}s",
            block_num, end, start
        );
        return None;
    }

    let text = lines[timing_idx + 1..].join(" ");
    let text = text.trim();
    if text.is_empty() {
        debug!("Block {} has no text, skipping", block_num);
        return None;
    }

    Some(Cue::new(start, end, text))
}
