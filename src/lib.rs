/*!
 * # cuesync - word-level subtitle synchronization
 *
 * A Rust library for following SRT and WebVTT subtitles against a moving
 * playback clock, down to the word being spoken.
 *
 * ## Features
 *
 * - Parse SRT and WebVTT files into a cue timeline
 * - Spread each cue's duration over its words for highlighting
 * - Track playback time from a host-supplied position or a simulated timer
 * - Resolve the active cue and words at any time, with a user offset
 * - Drive a renderer from a cancellable periodic sync loop
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `subtitle_processor`: Cue/word types and SRT/VTT parsing
 * - `word_timing`: Tokenizing cue text and interpolating word intervals
 * - `sync`: Playback synchronization:
 *   - `sync::clock`: External and simulated playback clocks
 *   - `sync::resolver`: Active cue and word resolution
 *   - `sync::scheduler`: The periodic sampling loop
 *   - `sync::session`: Caller-owned session state
 * - `presentation`: Word spans and terminal styling for resolved frames
 * - `app_config`: Configuration management
 * - `file_utils`: Reading subtitle files
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod file_utils;
pub mod presentation;
pub mod subtitle_processor;
pub mod sync;
pub mod word_timing;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{SubtitleError, SyncError};
pub use presentation::{LineView, Span};
pub use subtitle_processor::{Cue, SubtitleFormat, Word, parse};
pub use sync::{
    ClockMode, PlaybackClock, Renderer, ResolvedFrame, SharedPosition, SyncSession, Tolerance,
    resolve, resolve_for_display,
};
