/*!
 * Error types for the cuesync library.
 *
 * Parsing and resolution never fail: malformed subtitles degrade to an empty
 * cue list and "no active cue" is a normal state. The variants below cover the
 * host boundary (choosing a format, reading files) and the scheduler.
 */

use thiserror::Error;

/// Errors that can occur when selecting or loading a subtitle source
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The file suffix or format name is neither `srt` nor `vtt`
    #[error("Unsupported subtitle format '{0}'. Please use an .srt or .vtt file.")]
    UnsupportedFormat(String),

    /// The subtitle file could not be read
    #[error("Failed to read subtitle file {path}: {message}")]
    Unreadable {
        /// Path that was requested
        path: String,
        /// Underlying I/O message
        message: String,
    },
}

/// Errors raised by the synchronization session
#[derive(Error, Debug)]
pub enum SyncError {
    /// The scheduler was started outside of a tokio runtime
    #[error("Sync loop requires a running tokio runtime")]
    NoRuntime,

    /// The sync loop cannot tick with a zero period
    #[error("Poll interval must be greater than zero")]
    InvalidPollInterval,

    /// An external clock was requested without a position source
    #[error("External clock mode needs a position source")]
    MissingPositionSource,
}
