/*!
 * Sync session: the caller-owned context tying cues, clock and loop together.
 *
 * A session holds exactly one cue list, one clock and one sampling loop.
 * Independent sessions share nothing, so tests and multiple hosts can run
 * side by side.
 *
 * Lifecycle:
 * - `load` replaces the cue list, pauses, rewinds the clock, clears the renderer
 * - `start` resumes sampling from where the clock left off
 * - `pause` stops sampling, keeping cues, offset and elapsed time
 */

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{debug, info, trace, warn};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use tokio::time::Instant;

use crate::app_config::Config;
use crate::errors::SyncError;
use crate::file_utils::FileManager;
use crate::subtitle_processor::{self, Cue, SubtitleFormat};

use super::clock::{ClockMode, PlaybackClock, PositionSource};
use super::resolver::{self, ResolvedFrame, Tolerance};
use super::scheduler::{DEFAULT_POLL_INTERVAL, SyncScheduler, TickOutcome};

// @const: Leading decimal number of a user-typed offset
static OFFSET_PREFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?").unwrap()
});

/// Receiver of resolved frames, called once per tick.
///
/// A panicking renderer is not caught by the session.
pub trait Renderer: Send + Sync {
    fn render(&self, frame: &ResolvedFrame);
}

impl<F> Renderer for F
where
    F: Fn(&ResolvedFrame) + Send + Sync,
{
    fn render(&self, frame: &ResolvedFrame) {
        self(frame)
    }
}

/// Tunables for a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub poll_interval: Duration,
    pub tolerance: Tolerance,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            tolerance: Tolerance::DISPLAY,
        }
    }
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: config.sync.poll_interval(),
            tolerance: config.tolerance.to_tolerance(),
        }
    }
}

/// Parse a user-typed offset leniently: the leading number, or 0
pub fn parse_offset(input: &str) -> f64 {
    OFFSET_PREFIX_REGEX
        .find(input.trim())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

struct SessionState {
    cues: Arc<Vec<Cue>>,
    clock: PlaybackClock,
    paused: bool,
    tolerance: Tolerance,
}

struct Shared {
    state: Mutex<SessionState>,
    renderer: Arc<dyn Renderer>,
}

/// Outcome of a single sample-resolve-render pass
enum Step {
    Paused,
    NoPosition,
    Rendered(ResolvedFrame),
}

impl Shared {
    /// Sample, resolve and render once; the lock is released before rendering
    fn step(&self) -> Step {
        let (cues, time, offset, tolerance) = {
            let mut state = self.state.lock();
            if state.paused {
                return Step::Paused;
            }

            let Some(time) = state.clock.sample(Instant::now()) else {
                return Step::NoPosition;
            };

            (Arc::clone(&state.cues), time, state.clock.offset(), state.tolerance)
        };

        let frame = resolver::resolve_with(&cues, time, offset, &tolerance).to_frame(time, offset);
        trace!("Tick at {:.3}s -> cue {:?}", time, frame.cue_index);
        self.renderer.render(&frame);

        Step::Rendered(frame)
    }

    fn tick(&self) -> TickOutcome {
        match self.step() {
            Step::Paused => TickOutcome::Stop,
            Step::NoPosition => {
                trace!("No playback position available, skipping tick");
                TickOutcome::Continue
            }
            Step::Rendered(_) => TickOutcome::Continue,
        }
    }
}

/// Caller-owned synchronization context
pub struct SyncSession {
    shared: Arc<Shared>,
    scheduler: SyncScheduler,
}

impl SyncSession {
    /// Create a session with default poll interval and display tolerances
    pub fn new<R>(clock: PlaybackClock, renderer: R) -> Self
    where
        R: Renderer + 'static,
    {
        Self::with_settings(clock, renderer, SessionSettings::default())
    }

    pub fn with_settings<R>(clock: PlaybackClock, renderer: R, settings: SessionSettings) -> Self
    where
        R: Renderer + 'static,
    {
        let state = SessionState {
            cues: Arc::new(Vec::new()),
            clock,
            paused: true,
            tolerance: settings.tolerance,
        };

        SyncSession {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                renderer: Arc::new(renderer),
            }),
            scheduler: SyncScheduler::new(settings.poll_interval),
        }
    }

    /// Build a session from configuration.
    ///
    /// External mode needs `position`; simulated mode ignores it.
    pub fn from_config<R>(
        config: &Config,
        position: Option<Arc<dyn PositionSource>>,
        renderer: R,
    ) -> Result<Self, SyncError>
    where
        R: Renderer + 'static,
    {
        let mut clock = match config.sync.clock_mode {
            ClockMode::External => {
                PlaybackClock::external(position.ok_or(SyncError::MissingPositionSource)?)
            }
            ClockMode::Simulated => PlaybackClock::simulated(),
        };
        clock.set_offset(config.sync.initial_offset_secs);

        Ok(Self::with_settings(clock, renderer, SessionSettings::from(config)))
    }

    /// Parse `raw` and make it the active cue list; returns the cue count.
    ///
    /// Zero means nothing matched the format; the session is still reset.
    pub fn load(&mut self, format: SubtitleFormat, raw: &str) -> usize {
        let cues = subtitle_processor::parse(format, raw);
        let count = cues.len();
        self.replace_cues(cues);
        count
    }

    /// Read a `.srt` / `.vtt` file and load it
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let (format, content) = FileManager::read_subtitle(path.as_ref())?;
        let count = self.load(format, &content);
        if count == 0 {
            warn!("No subtitles found in {}", path.as_ref().display());
        } else {
            info!("Loaded {} cues from {}", count, path.as_ref().display());
        }
        Ok(count)
    }

    /// Swap in a new cue list: pause, cold-start the clock, clear the renderer
    pub fn replace_cues(&mut self, cues: Vec<Cue>) {
        self.scheduler.stop();
        {
            let mut state = self.shared.state.lock();
            state.cues = Arc::new(cues);
            state.paused = true;
            state.clock.reset();
        }
        self.shared.renderer.render(&ResolvedFrame::empty());
    }

    pub fn cues(&self) -> Arc<Vec<Cue>> {
        Arc::clone(&self.shared.state.lock().cues)
    }

    /// Start or resume sampling; any running loop is replaced
    pub fn start(&mut self) -> Result<(), SyncError> {
        let now = Instant::now();
        {
            let mut state = self.shared.state.lock();
            state.paused = false;
            state.clock.start(now);
        }

        let shared = Arc::clone(&self.shared);
        if let Err(e) = self.scheduler.start(move || shared.tick()) {
            let mut state = self.shared.state.lock();
            state.paused = true;
            state.clock.pause(now);
            return Err(e);
        }

        info!("Subtitle sync started");
        Ok(())
    }

    /// Stop sampling without losing cues, offset or elapsed time
    pub fn pause(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.paused = true;
            state.clock.pause(Instant::now());
        }
        if self.scheduler.stop() {
            info!("Subtitle sync paused");
        }
    }

    /// Rewind the clock to zero and start again
    pub fn restart(&mut self) -> Result<(), SyncError> {
        self.pause();
        self.shared.state.lock().clock.reset();
        debug!("Clock rewound to zero");
        self.start()
    }

    pub fn is_paused(&self) -> bool {
        self.shared.state.lock().paused
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn clock_mode(&self) -> ClockMode {
        self.shared.state.lock().clock.mode()
    }

    pub fn offset(&self) -> f64 {
        self.shared.state.lock().clock.offset()
    }

    /// Takes effect on the next tick; cues are not re-parsed
    pub fn set_offset(&self, offset: f64) {
        self.shared.state.lock().clock.set_offset(offset);
        debug!("Offset set to {:+.2}s", offset);
    }

    /// Lenient variant for raw user input; unparsable text means 0
    pub fn set_offset_str(&self, input: &str) -> f64 {
        let offset = parse_offset(input);
        self.set_offset(offset);
        offset
    }

    pub fn last_sample(&self) -> Option<f64> {
        self.shared.state.lock().clock.last_sample()
    }

    /// Current clock reading without recording a sample
    pub fn position(&self) -> Option<f64> {
        self.shared.state.lock().clock.peek(Instant::now())
    }

    /// Run one tick by hand; `None` when paused or no position is available
    pub fn tick(&self) -> Option<ResolvedFrame> {
        match self.shared.step() {
            Step::Rendered(frame) => Some(frame),
            Step::Paused | Step::NoPosition => None,
        }
    }

    /// Resolve an arbitrary time against the loaded cues with the session's
    /// tolerance and offset; does not touch the clock or the renderer
    pub fn resolve_at(&self, time: f64) -> ResolvedFrame {
        let state = self.shared.state.lock();
        let offset = state.clock.offset();
        resolver::resolve_with(&state.cues, time, offset, &state.tolerance).to_frame(time, offset)
    }
}
