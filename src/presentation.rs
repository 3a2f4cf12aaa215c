/*!
 * Line presentation for resolved frames.
 *
 * Turns the active cue into spans with word boundaries so a renderer can
 * style the highlighted words and mark the ones a user may look up. The
 * whitespace between tokens is kept as plain spans so the line reads exactly
 * like the cue text.
 */

use std::collections::HashSet;

use serde::Serialize;

use crate::sync::resolver::ResolvedFrame;
use crate::word_timing;

const ANSI_RESET: &str = "\x1B[0m";
const ANSI_ACTIVE: &str = "\x1B[1;7m";
const ANSI_HIGHLIGHT: &str = "\x1B[4;33m";
const ANSI_ACTIVE_HIGHLIGHT: &str = "\x1B[1;4;7m";

/// A run of cue text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub text: String,
    /// Index of the timed word this span is, `None` for the text between words
    pub word_index: Option<usize>,
    /// Currently spoken
    pub active: bool,
    /// On the lookup list
    pub highlight: bool,
}

impl Span {
    fn gap(text: &str) -> Self {
        Span {
            text: text.to_string(),
            word_index: None,
            active: false,
            highlight: false,
        }
    }
}

/// The active cue split into styled spans
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineView {
    pub spans: Vec<Span>,
}

impl LineView {
    /// Build the view for a frame; `None` when no cue is active.
    ///
    /// Cues without word timing produce word spans that are never active.
    pub fn build(frame: &ResolvedFrame, highlight_words: &[String]) -> Option<Self> {
        let cue = frame.cue.as_ref()?;
        let lookup: HashSet<String> = highlight_words.iter().map(|w| w.to_lowercase()).collect();
        let timed = cue.words.len();

        let mut spans = Vec::new();
        let mut cursor = 0;
        for (index, token) in word_timing::tokenize(&cue.text).into_iter().enumerate() {
            if token.range.start > cursor {
                spans.push(Span::gap(&cue.text[cursor..token.range.start]));
            }

            let is_word = token.text.chars().any(char::is_alphanumeric);
            spans.push(Span {
                text: token.text.to_string(),
                word_index: (index < timed).then_some(index),
                active: index < timed && frame.active_word_indices.contains(&index),
                highlight: is_word && lookup.contains(&token.text.to_lowercase()),
            });
            cursor = token.range.end;
        }

        if cursor < cue.text.len() {
            spans.push(Span::gap(&cue.text[cursor..]));
        }

        Some(LineView { spans })
    }

    /// The line as plain text
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Words currently highlighted
    pub fn active_text(&self) -> Vec<&str> {
        self.spans
            .iter()
            .filter(|s| s.active)
            .map(|s| s.text.as_str())
            .collect()
    }

    /// The line with ANSI styling: active words reversed, lookup words underlined
    pub fn render_ansi(&self) -> String {
        let mut out = String::new();
        for span in &self.spans {
            let style = match (span.active, span.highlight) {
                (true, true) => Some(ANSI_ACTIVE_HIGHLIGHT),
                (true, false) => Some(ANSI_ACTIVE),
                (false, true) => Some(ANSI_HIGHLIGHT),
                (false, false) => None,
            };
            match style {
                Some(code) => {
                    out.push_str(code);
                    out.push_str(&span.text);
                    out.push_str(ANSI_RESET);
                }
                None => out.push_str(&span.text),
            }
        }
        out
    }
}
