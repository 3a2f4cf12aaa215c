/*!
 * Tests for word tokenizing and interval interpolation
 */

use cuesync::subtitle_processor::{self, Cue, SubtitleFormat};
use cuesync::word_timing::{expand, tokenize};
use crate::common::assert_close;

/// Punctuation between words becomes its own token
#[test]
fn test_tokenize_withPunctuation_shouldSplitOnWordBoundaries() {
    let texts: Vec<&str> = tokenize("Hello, world!").iter().map(|t| t.text).collect();
    assert_eq!(texts, vec!["Hello", ",", "world", "!"]);
}

/// Apostrophes are a boundary too
#[test]
fn test_tokenize_withContraction_shouldSplitAtApostrophe() {
    let texts: Vec<&str> = tokenize("don't").iter().map(|t| t.text).collect();
    assert_eq!(texts, vec!["don", "'", "t"]);
}

/// Non-ASCII letters count as word characters
#[test]
fn test_tokenize_withAccentedWords_shouldKeepWordsWhole() {
    let texts: Vec<&str> = tokenize("déjà vu café").iter().map(|t| t.text).collect();
    assert_eq!(texts, vec!["déjà", "vu", "café"]);
}

/// Words split the cue evenly
#[test]
fn test_expand_withFourTokens_shouldSplitDurationEvenly() {
    let cue = Cue::new(10.0, 12.0, "Hello, world!");
    let words = expand(&cue);

    assert_eq!(words.len(), 4);
    for (i, word) in words.iter().enumerate() {
        assert_close(word.start, 10.0 + 0.5 * i as f64);
        assert_close(word.duration(), 0.5);
    }
}

/// Word durations add up to the cue duration for every parsed cue
#[test]
fn test_expand_withParsedSrt_shouldCoverEachCueExactly() {
    let content = "1\n00:00:00,100 --> 00:00:02,345\nOne two three four five six seven\n\n2\n00:01:00,000 --> 00:01:00,001\nTiny cue, lots of words in it\n";
    let cues = subtitle_processor::parse(SubtitleFormat::Srt, content);
    assert_eq!(cues.len(), 2);

    for cue in &cues {
        assert!(cue.start <= cue.end);
        let total: f64 = cue.words.iter().map(|w| w.duration()).sum();
        assert!((total - cue.duration()).abs() < 1e-9);

        assert_eq!(cue.words.first().unwrap().start, cue.start);
        assert_eq!(cue.words.last().unwrap().end, cue.end);
        for pair in cue.words.windows(2) {
            assert!(pair[0].start <= pair[0].end);
            assert_eq!(pair[0].end, pair[1].start);
        }
    }
}

/// A punctuation-only cue is a single token
#[test]
fn test_expand_withPunctuationOnlyText_shouldUseWholeRun() {
    let cue = Cue::new(0.0, 1.0, "...");
    let words = expand(&cue);
    assert_eq!(words.len(), 1);
    assert_eq!(words[0].text, "...");
}
