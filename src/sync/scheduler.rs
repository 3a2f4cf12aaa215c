/*!
 * Periodic sync loop.
 *
 * One spawned task per scheduler ticks at a fixed period until its
 * cancellation token fires or the tick callback asks it to stop. Starting
 * again cancels the previous task first, so at most one loop runs per
 * scheduler. Late ticks are skipped rather than queued.
 */

use std::time::Duration;

use log::{debug, trace};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::errors::SyncError;

/// Default sampling period
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// What the loop should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stop,
}

struct RunningLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owner of the single periodic sampling task
pub struct SyncScheduler {
    period: Duration,
    running: Option<RunningLoop>,
}

impl SyncScheduler {
    pub fn new(period: Duration) -> Self {
        SyncScheduler {
            period,
            running: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Spawn the loop, cancelling any loop already running.
    ///
    /// The first tick fires immediately, then every `period`. A zero period
    /// is rejected before anything is spawned.
    pub fn start<F>(&mut self, tick: F) -> Result<(), SyncError>
    where
        F: FnMut() -> TickOutcome + Send + 'static,
    {
        if self.period.is_zero() {
            return Err(SyncError::InvalidPollInterval);
        }
        let runtime = Handle::try_current().map_err(|_| SyncError::NoRuntime)?;

        if self.stop() {
            debug!("Cancelled previous sync loop before restart");
        }

        let cancel = CancellationToken::new();
        let handle = runtime.spawn(run_sync_loop(self.period, cancel.clone(), tick));
        self.running = Some(RunningLoop { cancel, handle });

        Ok(())
    }

    /// Cancel the running loop; returns whether there was one
    pub fn stop(&mut self) -> bool {
        match self.running.take() {
            Some(running) => {
                running.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| !r.cancel.is_cancelled() && !r.handle.is_finished())
    }
}

impl Default for SyncScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_sync_loop<F>(period: Duration, cancel: CancellationToken, mut tick: F)
where
    F: FnMut() -> TickOutcome,
{
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                trace!("Sync loop cancelled");
                break;
            }
            _ = ticker.tick() => {
                if tick() == TickOutcome::Stop {
                    trace!("Sync loop stopped by tick");
                    break;
                }
            }
        }
    }
}
