/*!
 * Tests for cue and word resolution
 */

use cuesync::subtitle_processor::{self, Cue, SubtitleFormat, Word};
use cuesync::sync::resolver::{
    Tolerance, cue_contains, find_cue, resolve, resolve_for_display, resolve_with, word_is_active,
};
use crate::common;

fn sample_cues() -> Vec<Cue> {
    subtitle_processor::parse(SubtitleFormat::Srt, common::SAMPLE_SRT)
}

/// Every cue's own start resolves to that cue, for several offsets
#[test]
fn test_resolve_atCueStartPlusOffset_shouldReturnThatCue() {
    let cues = sample_cues();
    for offset in [0.0, 0.75, -0.5, 3.25] {
        for cue in &cues {
            let resolution = resolve(&cues, cue.start + offset, offset);
            assert_eq!(resolution.cue, Some(cue));
        }
    }
}

/// Inclusive bounds on both ends
#[test]
fn test_resolve_atCueEnd_shouldStillBeActive() {
    let cues = sample_cues();
    assert_eq!(resolve(&cues, 4.0, 0.0).cue_index, Some(0));
    assert_eq!(resolve(&cues, 4.001, 0.0).cue_index, None);
}

/// Gaps between cues are a normal empty state
#[test]
fn test_resolve_betweenCues_shouldReturnNoCue() {
    let cues = sample_cues();
    let resolution = resolve(&cues, 4.5, 0.0);
    assert!(resolution.cue.is_none());
    assert!(resolution.active_words.is_empty());
}

/// Resolution is a pure function
#[test]
fn test_resolve_calledRepeatedly_shouldBeIdempotent() {
    let cues = sample_cues();
    let first = resolve(&cues, 6.3, 0.2);
    for _ in 0..5 {
        assert_eq!(resolve(&cues, 6.3, 0.2), first);
    }
    assert_eq!(cues, sample_cues());
}

/// The display path pads cue edges by half a second
#[test]
fn test_resolve_for_display_nearCueStart_shouldHonorHalfSecondPad() {
    let cues = vec![Cue::new(10.0, 12.0, "padded")];

    assert!(resolve_for_display(&cues, 9.51, 0.0).cue.is_some());
    assert!(resolve_for_display(&cues, 9.49, 0.0).cue.is_none());
    assert!(resolve_for_display(&cues, 12.49, 0.0).cue.is_some());
    assert!(resolve_for_display(&cues, 12.51, 0.0).cue.is_none());

    assert!(resolve(&cues, 9.51, 0.0).cue.is_none());
}

/// The pad moves with the offset
#[test]
fn test_cue_contains_withOffsetAndPad_shouldShiftBothEdges() {
    let cue = Cue::new(10.0, 12.0, "shifted");
    assert!(cue_contains(&cue, 11.51, 2.0, 0.5));
    assert!(!cue_contains(&cue, 11.49, 2.0, 0.5));
}

/// Words light up a little early and stay lit a little late
#[test]
fn test_word_is_active_nearWordEdges_shouldApplyLeadAndLinger() {
    let word = Word::new("edge", 5.0, 5.5);
    let tolerance = Tolerance::DISPLAY;

    assert!(word_is_active(&word, 4.91, 0.0, &tolerance));
    assert!(!word_is_active(&word, 4.89, 0.0, &tolerance));
    assert!(word_is_active(&word, 5.79, 0.0, &tolerance));
    assert!(!word_is_active(&word, 5.81, 0.0, &tolerance));
}

/// Word tolerance does not depend on the cue pad
#[test]
fn test_word_tolerance_withStrictAndDisplay_shouldMatch() {
    let word = Word::new("edge", 5.0, 5.5);
    for time in [4.89, 4.91, 5.79, 5.81] {
        assert_eq!(
            word_is_active(&word, time, 0.0, &Tolerance::STRICT),
            word_is_active(&word, time, 0.0, &Tolerance::DISPLAY)
        );
    }
}

/// Short words can overlap through the tolerance window
#[test]
fn test_resolve_withShortWords_shouldAllowSeveralActiveWords() {
    let cues = vec![Cue::new(0.0, 0.6, "a b c d e f").with_word_timing()];
    let resolution = resolve(&cues, 0.3, 0.0);

    assert!(resolution.active_words.len() > 1);
    assert_eq!(resolution.active_words.len(), resolution.active_word_indices.len());
}

/// A cue without words resolves at cue level only
#[test]
fn test_resolve_withWordlessCue_shouldReturnCueOnly() {
    let cues = subtitle_processor::parse(SubtitleFormat::Vtt, common::SAMPLE_VTT);
    let resolution = resolve(&cues, 2.0, 0.0);

    assert_eq!(resolution.cue_index, Some(0));
    assert!(resolution.active_words.is_empty());
}

/// Offset shifts word windows along with the cue
#[test]
fn test_resolve_withOffset_shouldShiftActiveWords() {
    let cues = vec![Cue::new(1.0, 3.0, "Hello world").with_word_timing()];

    let unshifted = resolve(&cues, 2.5, 0.0);
    assert_eq!(unshifted.active_words[0].text, "world");

    let shifted = resolve(&cues, 2.5, 1.0);
    let texts: Vec<&str> = shifted.active_words.iter().map(|w| w.text.as_str()).collect();
    assert_eq!(texts, vec!["Hello"]);
}

/// First match wins for overlapping cues
#[test]
fn test_find_cue_withOverlap_shouldPreferEarlierEntry() {
    let cues = vec![
        Cue::new(5.0, 10.0, "long"),
        Cue::new(6.0, 7.0, "short"),
    ];
    let (index, cue) = find_cue(&cues, 6.5, 0.0, 0.0).unwrap();
    assert_eq!(index, 0);
    assert_eq!(cue.text, "long");
}

/// Custom tolerances flow through resolve_with
#[test]
fn test_resolve_with_customPad_shouldWidenMatch() {
    let cues = vec![Cue::new(10.0, 12.0, "wide")];
    let tolerance = Tolerance {
        cue_pad: 2.0,
        ..Tolerance::STRICT
    };
    assert!(resolve_with(&cues, 8.1, 0.0, &tolerance).cue.is_some());
    assert!(resolve_with(&cues, 7.9, 0.0, &tolerance).cue.is_none());
}
