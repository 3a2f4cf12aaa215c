/*!
 * Integration tests for the sync session lifecycle
 */

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use cuesync::app_config::Config;
use cuesync::errors::SyncError;
use cuesync::subtitle_processor::SubtitleFormat;
use cuesync::sync::{
    ClockMode, PlaybackClock, PositionSource, SessionSettings, SharedPosition, SyncSession,
};
use tokio::time::sleep;
use crate::common::{self, FrameRecorder, assert_close};

fn simulated_session(recorder: &FrameRecorder) -> SyncSession {
    common::init_test_logging();
    let mut session = SyncSession::new(PlaybackClock::simulated(), recorder.renderer());
    session.load(SubtitleFormat::Srt, common::SAMPLE_SRT);
    session
}

/// Loading clears the renderer and leaves the session paused
#[test]
fn test_load_withSampleSrt_shouldEmitEmptyFrameAndPause() {
    let recorder = FrameRecorder::new();
    let session = simulated_session(&recorder);

    assert!(session.is_paused());
    assert!(!session.is_running());
    assert_eq!(session.cues().len(), 3);

    let frames = recorder.frames();
    assert_eq!(frames.len(), 1);
    assert!(frames[0].is_empty());
    assert!(frames[0].time.is_none());
}

/// Ticks arrive once immediately then every poll interval
#[tokio::test(start_paused = true)]
async fn test_start_withSimulatedClock_shouldRenderEveryPollInterval() -> Result<()> {
    let recorder = FrameRecorder::new();
    let mut session = simulated_session(&recorder);

    session.start()?;
    assert!(session.is_running());
    sleep(Duration::from_millis(1050)).await;

    let frames = recorder.tick_frames();
    assert_eq!(frames.len(), 6);
    assert_close(frames[0].time.unwrap(), 0.0);
    assert_close(frames[5].time.unwrap(), 1.0);
    assert_eq!(frames[5].cue_index, Some(0));
    Ok(())
}

/// Elapsed time survives pause and resume
#[tokio::test(start_paused = true)]
async fn test_pause_thenStart_shouldResumeFromElapsedTime() -> Result<()> {
    let recorder = FrameRecorder::new();
    let mut session = simulated_session(&recorder);

    session.start()?;
    sleep(Duration::from_millis(450)).await;
    session.pause();
    assert!(session.is_paused());
    assert_close(session.position().unwrap(), 0.45);

    let before = recorder.tick_frames().len();
    sleep(Duration::from_millis(1000)).await;
    assert_eq!(recorder.tick_frames().len(), before);

    session.start()?;
    sleep(Duration::from_millis(450)).await;

    let frames = recorder.tick_frames();
    assert_close(frames[before].time.unwrap(), 0.45);
    assert_close(frames.last().unwrap().time.unwrap(), 0.85);
    Ok(())
}

/// A second start replaces the loop instead of adding one
#[tokio::test(start_paused = true)]
async fn test_start_calledTwice_shouldKeepSingleLoop() -> Result<()> {
    let recorder = FrameRecorder::new();
    let mut session = simulated_session(&recorder);

    session.start()?;
    session.start()?;
    sleep(Duration::from_millis(1050)).await;

    assert_eq!(recorder.tick_frames().len(), 6);
    Ok(())
}

/// Reloading cold-starts the clock
#[tokio::test(start_paused = true)]
async fn test_load_whileRunning_shouldResetClockAndStop() -> Result<()> {
    let recorder = FrameRecorder::new();
    let mut session = simulated_session(&recorder);

    session.start()?;
    sleep(Duration::from_millis(650)).await;
    session.load(SubtitleFormat::Vtt, common::SAMPLE_VTT);

    assert!(session.is_paused());
    assert!(session.last_sample().is_none());
    assert_eq!(session.position(), Some(0.0));
    assert!(recorder.last().unwrap().is_empty());

    let before = recorder.tick_frames().len();
    sleep(Duration::from_millis(1000)).await;
    assert_eq!(recorder.tick_frames().len(), before);

    session.start()?;
    sleep(Duration::from_millis(50)).await;
    assert_close(recorder.tick_frames().last().unwrap().time.unwrap(), 0.0);
    Ok(())
}

/// Offset changes apply on the next resolution without re-parsing
#[test]
fn test_set_offset_withLoadedCues_shouldShiftResolution() {
    let recorder = FrameRecorder::new();
    let session = simulated_session(&recorder);
    let cues_before = session.cues();

    assert_eq!(session.resolve_at(14.4).cue_index, Some(2));
    assert_eq!(session.resolve_at(15.0).cue_index, None);

    session.set_offset(2.0);
    let frame = session.resolve_at(15.0);
    assert_eq!(frame.cue_index, Some(2));
    assert_eq!(frame.offset, 2.0);
    assert!(Arc::ptr_eq(&cues_before, &session.cues()));

    assert_eq!(session.set_offset_str("-1.5s"), -1.5);
    assert_eq!(session.offset(), -1.5);
    assert_eq!(session.set_offset_str("soon"), 0.0);
    assert_eq!(session.offset(), 0.0);
}

/// Ticks without a host position are skipped, not rendered
#[tokio::test(start_paused = true)]
async fn test_external_clock_withoutPosition_shouldSkipTicks() -> Result<()> {
    let recorder = FrameRecorder::new();
    let position = SharedPosition::new();
    let mut session = SyncSession::new(
        PlaybackClock::external(Arc::new(position.clone())),
        recorder.renderer(),
    );
    session.load(SubtitleFormat::Srt, common::SAMPLE_SRT);
    assert_eq!(session.clock_mode(), ClockMode::External);

    session.start()?;
    sleep(Duration::from_millis(450)).await;
    assert!(recorder.tick_frames().is_empty());
    assert!(session.is_running());

    position.set(6.0);
    sleep(Duration::from_millis(200)).await;

    let frame = recorder.last().unwrap();
    assert_eq!(frame.time, Some(6.0));
    assert_eq!(frame.text(), Some("It contains multiple lines."));
    assert!(!frame.active_words.is_empty());
    assert_eq!(session.last_sample(), Some(6.0));
    Ok(())
}

/// A paused session ignores manual ticks
#[test]
fn test_tick_byHand_shouldRespectPauseState() {
    let recorder = FrameRecorder::new();
    let position = SharedPosition::new();
    position.set(2.0);
    let session = SyncSession::new(
        PlaybackClock::external(Arc::new(position)),
        recorder.renderer(),
    );

    assert!(session.tick().is_none());
    assert_eq!(recorder.tick_frames().len(), 0);
}

/// Starting outside a runtime fails and leaves the session paused
#[test]
fn test_start_withoutRuntime_shouldFailAndStayPaused() {
    let recorder = FrameRecorder::new();
    let mut session = simulated_session(&recorder);

    let err = tokio_test::assert_err!(session.start());
    assert!(matches!(err, SyncError::NoRuntime));
    assert!(session.is_paused());
    assert!(!session.is_running());
    assert_eq!(session.position(), Some(0.0));
}

/// A zero poll interval is refused up front instead of killing the loop
#[tokio::test(start_paused = true)]
async fn test_start_withZeroPollInterval_shouldFailAndStayPaused() {
    let recorder = FrameRecorder::new();
    let settings = SessionSettings {
        poll_interval: Duration::ZERO,
        ..SessionSettings::default()
    };
    let mut session =
        SyncSession::with_settings(PlaybackClock::simulated(), recorder.renderer(), settings);
    session.load(SubtitleFormat::Srt, common::SAMPLE_SRT);

    let err = tokio_test::assert_err!(session.start());
    assert!(matches!(err, SyncError::InvalidPollInterval));
    assert!(session.is_paused());
    assert!(!session.is_running());

    sleep(Duration::from_millis(1000)).await;
    assert!(recorder.tick_frames().is_empty());
    assert_eq!(session.position(), Some(0.0));
}

/// External mode needs a position source
#[test]
fn test_from_config_withExternalModeAndNoSource_shouldFail() {
    let mut config = Config::default();
    config.sync.clock_mode = ClockMode::External;

    let result = SyncSession::from_config(&config, None, |_: &cuesync::sync::ResolvedFrame| {});
    assert!(matches!(result, Err(SyncError::MissingPositionSource)));

    let source: Arc<dyn PositionSource> = Arc::new(|| Some(1.0));
    let session = tokio_test::assert_ok!(SyncSession::from_config(
        &config,
        Some(source),
        |_: &cuesync::sync::ResolvedFrame| {}
    ));
    assert_eq!(session.position(), Some(1.0));
}

/// Configured offset and poll interval reach the session
#[tokio::test(start_paused = true)]
async fn test_from_config_withCustomSettings_shouldApplyThem() -> Result<()> {
    let recorder = FrameRecorder::new();
    let mut config = Config::default();
    config.sync.poll_interval_ms = 100;
    config.sync.initial_offset_secs = 0.5;

    let mut session = SyncSession::from_config(&config, None, recorder.renderer())?;
    assert_eq!(session.offset(), 0.5);
    session.load(SubtitleFormat::Srt, common::SAMPLE_SRT);

    session.start()?;
    sleep(Duration::from_millis(1050)).await;
    assert_eq!(recorder.tick_frames().len(), 11);
    Ok(())
}

/// Files load through the session
#[test]
fn test_load_file_withTempFiles_shouldLoadOrReject() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let vtt = common::create_test_file(temp_dir.path(), "clip.vtt", common::SAMPLE_VTT)?;
    let bad = common::create_test_file(temp_dir.path(), "clip.txt", common::SAMPLE_SRT)?;

    let recorder = FrameRecorder::new();
    let mut session = SyncSession::new(PlaybackClock::simulated(), recorder.renderer());

    assert_eq!(session.load_file(&vtt)?, 3);
    assert!(session.load_file(&bad).is_err());
    assert_eq!(session.cues().len(), 3);
    Ok(())
}
