/*!
 * Playback synchronization.
 *
 * - `clock`: current playback time from an external position or a simulated timer
 * - `resolver`: active cue and words for a time and offset
 * - `scheduler`: the cancellable periodic sampling loop
 * - `session`: the caller-owned context tying them together
 */

pub mod clock;
pub mod resolver;
pub mod scheduler;
pub mod session;

pub use clock::{ClockMode, ClockSource, PlaybackClock, PositionSource, SharedPosition, SimulatedClock};
pub use resolver::{
    Resolution, ResolvedFrame, Tolerance, resolve, resolve_for_display, resolve_with,
};
pub use scheduler::{DEFAULT_POLL_INTERVAL, SyncScheduler, TickOutcome};
pub use session::{Renderer, SessionSettings, SyncSession, parse_offset};
