/*!
 * Playback clock.
 *
 * The clock answers "where is playback right now" from one of two sources:
 * - External: a position the host can read directly (a media element)
 * - Simulated: wall-clock time elapsed since sync was started, for players
 *   whose position cannot be read
 *
 * The simulated clock knows nothing about the real player. If the media
 * pauses, seeks or buffers without the host pausing the session, the two drift
 * apart; the user's offset is the only correction.
 */

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Where the clock gets its time from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockMode {
    /// Position polled from the host each tick
    External,
    /// Elapsed time since start, maintained locally
    #[default]
    Simulated,
}

impl fmt::Display for ClockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::External => write!(f, "external"),
            Self::Simulated => write!(f, "simulated"),
        }
    }
}

/// A host-provided playback position in seconds.
///
/// `None` means no position is available right now (no media element, not
/// loaded yet); the tick is skipped.
pub trait PositionSource: Send + Sync {
    fn position(&self) -> Option<f64>;
}

impl<F> PositionSource for F
where
    F: Fn() -> Option<f64> + Send + Sync,
{
    fn position(&self) -> Option<f64> {
        self()
    }
}

/// Position cell the host writes into and the clock reads from
#[derive(Debug, Clone, Default)]
pub struct SharedPosition {
    inner: Arc<Mutex<Option<f64>>>,
}

impl SharedPosition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, seconds: f64) {
        *self.inner.lock() = Some(seconds);
    }

    pub fn clear(&self) {
        *self.inner.lock() = None;
    }
}

impl PositionSource for SharedPosition {
    fn position(&self) -> Option<f64> {
        *self.inner.lock()
    }
}

/// Elapsed-time clock that survives pause/resume.
///
/// `carried` holds the time accumulated before the current run; `anchor` is
/// the instant the current run began, `None` while paused.
#[derive(Debug, Clone, Default)]
pub struct SimulatedClock {
    anchor: Option<Instant>,
    carried: Duration,
}

impl SimulatedClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin (or continue) counting from the carried elapsed time
    pub fn start(&mut self, now: Instant) {
        if self.anchor.is_none() {
            self.anchor = Some(now);
        }
    }

    /// Stop counting, keeping the elapsed time
    pub fn pause(&mut self, now: Instant) {
        if let Some(anchor) = self.anchor.take() {
            self.carried += now.saturating_duration_since(anchor);
        }
    }

    /// Back to zero, stopped
    pub fn reset(&mut self) {
        self.anchor = None;
        self.carried = Duration::ZERO;
    }

    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.anchor {
            Some(anchor) => self.carried + now.saturating_duration_since(anchor),
            None => self.carried,
        }
    }
}

/// The two interchangeable time sources
pub enum ClockSource {
    External(Arc<dyn PositionSource>),
    Simulated(SimulatedClock),
}

impl fmt::Debug for ClockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::External(_) => f.write_str("External(..)"),
            Self::Simulated(clock) => f.debug_tuple("Simulated").field(clock).finish(),
        }
    }
}

/// Current-time abstraction shared by resolution and scheduling
#[derive(Debug)]
pub struct PlaybackClock {
    source: ClockSource,
    offset: f64,
    last_sample: Option<f64>,
}

impl PlaybackClock {
    pub fn external(source: Arc<dyn PositionSource>) -> Self {
        Self::from_source(ClockSource::External(source))
    }

    pub fn simulated() -> Self {
        Self::from_source(ClockSource::Simulated(SimulatedClock::new()))
    }

    pub fn from_source(source: ClockSource) -> Self {
        PlaybackClock {
            source,
            offset: 0.0,
            last_sample: None,
        }
    }

    pub fn mode(&self) -> ClockMode {
        match self.source {
            ClockSource::External(_) => ClockMode::External,
            ClockSource::Simulated(_) => ClockMode::Simulated,
        }
    }

    /// Offset in seconds added to cue times at resolution
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    pub fn last_sample(&self) -> Option<f64> {
        self.last_sample
    }

    pub fn start(&mut self, now: Instant) {
        if let ClockSource::Simulated(clock) = &mut self.source {
            clock.start(now);
        }
    }

    pub fn pause(&mut self, now: Instant) {
        if let ClockSource::Simulated(clock) = &mut self.source {
            clock.pause(now);
        }
    }

    /// Cold start: forget the last sample and rewind simulated time
    pub fn reset(&mut self) {
        self.last_sample = None;
        if let ClockSource::Simulated(clock) = &mut self.source {
            clock.reset();
        }
    }

    /// Read the current time and remember it
    pub fn sample(&mut self, now: Instant) -> Option<f64> {
        let value = self.peek(now)?;
        self.last_sample = Some(value);
        Some(value)
    }

    /// Read the current time without recording it
    pub fn peek(&self, now: Instant) -> Option<f64> {
        match &self.source {
            ClockSource::External(source) => source.position().filter(|t| t.is_finite()),
            ClockSource::Simulated(clock) => Some(clock.elapsed(now).as_secs_f64()),
        }
    }
}
