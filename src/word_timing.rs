/*!
 * Word-level timing for subtitle cues.
 *
 * Subtitle formats only time whole cues, so each word gets an equal share of
 * its cue's duration. The result is an approximation used for highlighting,
 * not a claim about when a word is actually spoken.
 */

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::subtitle_processor::{Cue, Word};

// @const: Word-boundary delimited run of word characters
static WORD_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());

/// A non-whitespace token of cue text and its byte range in that text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub range: Range<usize>,
}

/// Split text on word boundaries.
///
/// Word runs and the runs of characters between them both become tokens;
/// runs that are only whitespace are dropped and the rest are trimmed. So
/// `"Hello, world!"` yields `Hello`, `,`, `world`, `!`.
///
/// Word characters are Unicode-aware: `"café"` stays one token rather than
/// splitting into `caf` and `é` the way an ASCII-only `\w` would.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    for m in WORD_REGEX.find_iter(text) {
        push_trimmed(&mut tokens, text, cursor..m.start());
        push_trimmed(&mut tokens, text, m.range());
        cursor = m.end();
    }
    push_trimmed(&mut tokens, text, cursor..text.len());

    tokens
}

fn push_trimmed<'a>(tokens: &mut Vec<Token<'a>>, text: &'a str, range: Range<usize>) {
    let segment = &text[range.clone()];
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return;
    }

    let start = range.start + (segment.len() - segment.trim_start().len());
    let end = start + trimmed.len();
    tokens.push(Token {
        text: trimmed,
        range: start..end,
    });
}

/// Subdivide a cue's interval uniformly over its tokens.
///
/// Word `i` of `n` covers `[start + d*i/n, start + d*(i+1)/n]`. Adjacent words
/// share their boundary and the last word ends exactly at the cue end.
pub fn expand(cue: &Cue) -> Vec<Word> {
    let tokens = tokenize(&cue.text);
    let count = tokens.len();
    if count == 0 {
        return Vec::new();
    }

    let duration = cue.end - cue.start;
    let boundary = |i: usize| -> f64 {
        if i == count {
            cue.end
        } else {
            cue.start + (duration * i as f64) / count as f64
        }
    };

    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| Word::new(token.text, boundary(i), boundary(i + 1)))
        .collect()
}
