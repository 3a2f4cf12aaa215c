/*!
 * Cue and word resolution.
 *
 * Given a cue list, a playback time and a user offset, find the cue being
 * shown and the words inside it that should be highlighted. Everything here is
 * a pure function of its arguments.
 *
 * The cue lookup is a linear scan in list order and the first match wins, so
 * overlapping cues resolve to whichever appears first in the file.
 */

use serde::{Deserialize, Serialize};

use crate::subtitle_processor::{Cue, Word};

/// Padding applied to both cue edges on the rendering path
pub const DISPLAY_CUE_PAD_SECS: f64 = 0.5;

/// How early a word lights up before its interval starts
pub const WORD_LEAD_SECS: f64 = 0.1;

/// How long a word stays lit after its interval ends
pub const WORD_LINGER_SECS: f64 = 0.3;

/// Containment tolerances for cues and words
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Widening of the cue interval on both edges
    pub cue_pad: f64,
    /// Grace period before a word's start
    pub word_lead: f64,
    /// Grace period after a word's end
    pub word_linger: f64,
}

impl Tolerance {
    /// Exact cue bounds
    pub const STRICT: Tolerance = Tolerance {
        cue_pad: 0.0,
        word_lead: WORD_LEAD_SECS,
        word_linger: WORD_LINGER_SECS,
    };

    /// Cue bounds padded to avoid flicker between adjacent cues
    pub const DISPLAY: Tolerance = Tolerance {
        cue_pad: DISPLAY_CUE_PAD_SECS,
        word_lead: WORD_LEAD_SECS,
        word_linger: WORD_LINGER_SECS,
    };
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DISPLAY
    }
}

/// Borrowed result of a resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'a> {
    /// Position of the active cue in the list
    pub cue_index: Option<usize>,
    pub cue: Option<&'a Cue>,
    pub active_words: Vec<&'a Word>,
    /// Indices into `cue.words` matching `active_words`
    pub active_word_indices: Vec<usize>,
}

impl<'a> Resolution<'a> {
    pub fn none() -> Self {
        Resolution {
            cue_index: None,
            cue: None,
            active_words: Vec::new(),
            active_word_indices: Vec::new(),
        }
    }

    /// Owned copy for handing to a renderer
    pub fn to_frame(&self, time: f64, offset: f64) -> ResolvedFrame {
        ResolvedFrame {
            time: Some(time),
            offset,
            cue_index: self.cue_index,
            cue: self.cue.cloned(),
            active_words: self.active_words.iter().map(|w| (*w).clone()).collect(),
            active_word_indices: self.active_word_indices.clone(),
        }
    }
}

/// Owned resolved state delivered to the render callback on each tick
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolvedFrame {
    /// Clock sample this frame was resolved for; `None` for a cleared frame
    pub time: Option<f64>,
    pub offset: f64,
    pub cue_index: Option<usize>,
    pub cue: Option<Cue>,
    pub active_words: Vec<Word>,
    pub active_word_indices: Vec<usize>,
}

impl ResolvedFrame {
    /// A frame that clears whatever the renderer is showing
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.cue.is_none()
    }

    /// Text of the active cue, if any
    pub fn text(&self) -> Option<&str> {
        self.cue.as_ref().map(|cue| cue.text.as_str())
    }
}

/// Whether `time` falls inside the cue shifted by `offset` and widened by `pad`
pub fn cue_contains(cue: &Cue, time: f64, offset: f64, pad: f64) -> bool {
    time + pad >= cue.start + offset && time - pad <= cue.end + offset
}

/// Whether a word should be highlighted at `time`
pub fn word_is_active(word: &Word, time: f64, offset: f64, tolerance: &Tolerance) -> bool {
    time + tolerance.word_lead >= word.start + offset
        && time - tolerance.word_linger <= word.end + offset
}

/// First cue in list order containing `time`
pub fn find_cue(cues: &[Cue], time: f64, offset: f64, pad: f64) -> Option<(usize, &Cue)> {
    cues.iter()
        .enumerate()
        .find(|(_, cue)| cue_contains(cue, time, offset, pad))
}

/// Resolve with exact cue bounds
pub fn resolve(cues: &[Cue], time: f64, offset: f64) -> Resolution<'_> {
    resolve_with(cues, time, offset, &Tolerance::STRICT)
}

/// Resolve with the half-second display padding used while rendering
pub fn resolve_for_display(cues: &[Cue], time: f64, offset: f64) -> Resolution<'_> {
    resolve_with(cues, time, offset, &Tolerance::DISPLAY)
}

/// Resolve the active cue and its active words under the given tolerances
pub fn resolve_with<'a>(
    cues: &'a [Cue],
    time: f64,
    offset: f64,
    tolerance: &Tolerance,
) -> Resolution<'a> {
    let Some((cue_index, cue)) = find_cue(cues, time, offset, tolerance.cue_pad) else {
        return Resolution::none();
    };

    let (active_word_indices, active_words): (Vec<usize>, Vec<&Word>) = cue
        .words
        .iter()
        .enumerate()
        .filter(|(_, word)| word_is_active(word, time, offset, tolerance))
        .unzip();

    Resolution {
        cue_index: Some(cue_index),
        cue: Some(cue),
        active_words,
        active_word_indices,
    }
}
