use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::config::StreamConfiguration;
use crate::models::error::StreamError;
use crate::models::state::StreamState;
use crate::processing::frame_buffer::FrameBuffer;
use crate::processing::noise::WhiteNoise;
use crate::traits::audio_engine::{AudioEngine, FillCallback};
use crate::traits::fill_strategy::{FillResult, FillStrategy};

/// Counters maintained by the fill callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamDiagnostics {
    pub fill_count: u64,
    pub frames_processed: u64,
    pub halted_by_strategy: bool,
}

/// State shared between the owning thread and the engine's real-time thread.
///
/// `active` gates every invocation and is read under the strategy lock. It is
/// cleared before the engine is asked to stop, and the owner then takes the
/// strategy lock once, so no fill is in flight when `stop` or `close` return.
#[derive(Default)]
struct CallbackShared {
    active: AtomicBool,
    halted_by_strategy: AtomicBool,
    fill_count: AtomicU64,
    frames_processed: AtomicU64,
}

/// Owns one audio stream: its configuration, lifecycle and fill strategy.
///
/// Generic over the platform backend via the `AudioEngine` trait. The engine
/// drives the strategy from its own thread; this type only issues lifecycle
/// requests and keeps the handle.
///
/// ```text
/// open → [engine stream] ── start ──→ engine thread → gate → [FillStrategy]
///                         ←── stop ──
/// ```
pub struct StreamSession<E: AudioEngine> {
    id: Uuid,
    engine: E,
    strategy: Arc<Mutex<Box<dyn FillStrategy>>>,
    shared: Arc<CallbackShared>,
    config: Option<StreamConfiguration>,
    stream: Option<E::Stream>,
    state: StreamState,
}

impl<E: AudioEngine> StreamSession<E> {
    pub fn new(engine: E, strategy: impl FillStrategy) -> Self {
        Self {
            id: Uuid::new_v4(),
            engine,
            strategy: Arc::new(Mutex::new(Box::new(strategy))),
            shared: Arc::new(CallbackShared::default()),
            config: None,
            stream: None,
            state: StreamState::Unopened,
        }
    }

    /// Session using the default white-noise strategy.
    pub fn with_noise(engine: E) -> Self {
        Self::new(engine, WhiteNoise::new())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Lifecycle state as driven by the owner.
    ///
    /// A strategy returning `Stop` halts fills but leaves the state
    /// `Running`; check `diagnostics().halted_by_strategy` and call `stop`
    /// before starting again.
    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn config(&self) -> Option<&StreamConfiguration> {
        self.config.as_ref()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn diagnostics(&self) -> StreamDiagnostics {
        StreamDiagnostics {
            fill_count: self.shared.fill_count.load(Ordering::Relaxed),
            frames_processed: self.shared.frames_processed.load(Ordering::Relaxed),
            halted_by_strategy: self.shared.halted_by_strategy.load(Ordering::Acquire),
        }
    }

    /// Whether fills currently reach the strategy.
    pub fn is_streaming(&self) -> bool {
        self.shared.active.load(Ordering::Acquire)
    }

    /// Ask the engine to realize `config`. Transitions: unopened → opened.
    ///
    /// Engine refusal is reported as `ConfigurationUnsupported` and is not
    /// retried.
    pub fn open(&mut self, config: StreamConfiguration) -> Result<(), StreamError> {
        if self.state != StreamState::Unopened {
            return Err(self.violation("open"));
        }

        config.validate()?;

        let callback = self.build_callback();
        let stream = self.engine.open_stream(&config, callback).map_err(|e| {
            log::error!("[{}] failed to open {} stream: {}", self.id, self.engine.name(), e);
            StreamError::ConfigurationUnsupported(e)
        })?;

        log::info!(
            "[{}] opened {:?} stream on {} ({:?}, {:?}, {:?}, {:?})",
            self.id,
            config.direction,
            self.engine.name(),
            config.performance_mode,
            config.sharing_mode,
            config.format,
            config.channel_count,
        );

        self.stream = Some(stream);
        self.config = Some(config);
        self.state = StreamState::Opened;
        Ok(())
    }

    /// Start fill invocations. Transitions: opened → running.
    pub fn start(&mut self) -> Result<(), StreamError> {
        if self.state != StreamState::Opened {
            return Err(self.violation("start"));
        }
        let Some(stream) = self.stream.as_mut() else {
            return Err(StreamError::LifecycleViolation {
                operation: "start",
                state: self.state,
            });
        };

        self.shared.halted_by_strategy.store(false, Ordering::Release);
        self.shared.active.store(true, Ordering::Release);

        if let Err(e) = self.engine.request_start(stream) {
            self.shared.active.store(false, Ordering::Release);
            log::error!("[{}] failed to start stream: {}", self.id, e);
            return Err(StreamError::Engine(e));
        }

        self.state = StreamState::Running;
        log::debug!("[{}] stream started", self.id);
        Ok(())
    }

    /// Stop fill invocations. Transitions: running → opened.
    ///
    /// Idempotent once opened. Returns after the engine has drained any
    /// in-flight fill.
    pub fn stop(&mut self) -> Result<(), StreamError> {
        match self.state {
            StreamState::Running => {}
            StreamState::Opened => {
                log::debug!("[{}] stop requested on an already stopped stream", self.id);
                return Ok(());
            }
            StreamState::Unopened | StreamState::Closed => return Err(self.violation("stop")),
        }
        let Some(stream) = self.stream.as_mut() else {
            return Err(StreamError::LifecycleViolation {
                operation: "stop",
                state: self.state,
            });
        };

        self.shared.active.store(false, Ordering::Release);
        self.engine.request_stop(stream).map_err(|e| {
            log::error!("[{}] failed to stop stream: {}", self.id, e);
            StreamError::Engine(e)
        })?;
        self.wait_for_fill();

        self.state = StreamState::Opened;
        log::debug!("[{}] stream stopped", self.id);
        Ok(())
    }

    /// Tear the session down. Any state → closed.
    ///
    /// Stops a running stream before releasing the handle so no fill can be
    /// in flight when the engine frees it. The handle is still released when
    /// the stop request fails; that failure is returned.
    pub fn close(&mut self) -> Result<(), StreamError> {
        if self.state.is_terminal() {
            return Ok(());
        }

        let mut result = Ok(());
        self.shared.active.store(false, Ordering::Release);
        if let Some(stream) = self.stream.as_mut() {
            if self.state.is_running() {
                if let Err(e) = self.engine.request_stop(stream) {
                    log::warn!("[{}] stop during teardown failed: {}", self.id, e);
                    result = Err(StreamError::Engine(e));
                }
            }
        }
        self.wait_for_fill();

        if let Some(stream) = self.stream.take() {
            self.engine.close_stream(stream);
            log::info!("[{}] stream released", self.id);
        }

        self.state = StreamState::Closed;
        result
    }

    // --- Internal helpers ---

    /// Block until a fill that passed the gate before it closed has returned.
    fn wait_for_fill(&self) {
        drop(self.strategy.lock());
    }

    fn violation(&self, operation: &'static str) -> StreamError {
        log::error!(
            "[{}] lifecycle violation: {} in the {} state",
            self.id,
            operation,
            self.state
        );
        StreamError::LifecycleViolation {
            operation,
            state: self.state,
        }
    }

    /// Build the callback handed to the engine at open.
    ///
    /// Closed gate: the buffer is silenced and the engine told to stop.
    /// Open gate: the strategy fills the buffer; a `Stop` closes the gate.
    fn build_callback(&self) -> FillCallback {
        let strategy = Arc::clone(&self.strategy);
        let shared = Arc::clone(&self.shared);

        Box::new(move |buffer: &mut FrameBuffer<'_>, num_frames: usize| {
            let mut strategy = strategy.lock();
            if !shared.active.load(Ordering::Acquire) {
                buffer.fill_silence();
                return FillResult::Stop;
            }

            let result = strategy.fill(buffer, num_frames);

            shared.fill_count.fetch_add(1, Ordering::Relaxed);
            shared
                .frames_processed
                .fetch_add(num_frames as u64, Ordering::Relaxed);

            if result == FillResult::Stop {
                shared.active.store(false, Ordering::Release);
                shared.halted_by_strategy.store(true, Ordering::Release);
            }
            result
        })
    }
}

impl<E: AudioEngine> Drop for StreamSession<E> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("[{}] teardown on drop failed: {}", self.id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::models::config::{ChannelCount, Direction, PerformanceMode, SampleFormat, SharingMode};
    use crate::models::error::{EngineError, EngineStatus};
    use crate::processing::frame_buffer::SampleBuffer;
    use crate::processing::noise::DEFAULT_NOISE_AMPLITUDE;
    use crate::session::fakes::FakeAudioEngine;
    use crate::traits::fill_strategy::{from_fn, Silence};

    fn counting_strategy(counter: Arc<AtomicUsize>) -> impl FillStrategy {
        from_fn(move |buffer: &mut FrameBuffer<'_>, _num_frames| {
            counter.fetch_add(1, Ordering::SeqCst);
            buffer.fill_with(|| 0.05);
            FillResult::Continue
        })
    }

    #[test]
    fn full_lifecycle_leaves_no_outstanding_handles() {
        let engine = FakeAudioEngine::accept_all();
        let configs = [
            StreamConfiguration::recording(),
            StreamConfiguration::playback(),
            StreamConfiguration {
                sharing_mode: SharingMode::Shared,
                performance_mode: PerformanceMode::PowerSaving,
                channel_count: ChannelCount::Stereo,
                format: SampleFormat::I32,
                sample_rate: Some(44100),
                frames_per_callback: Some(192),
                ..StreamConfiguration::recording()
            },
        ];

        for config in configs {
            let mut session = StreamSession::new(engine.clone(), Silence);
            session.open(config).unwrap();
            assert_eq!(engine.outstanding_handles(), 1);
            session.start().unwrap();
            session.stop().unwrap();
            session.close().unwrap();
            assert_eq!(session.state(), StreamState::Closed);
            assert_eq!(engine.outstanding_handles(), 0);
        }
    }

    #[test]
    fn start_without_open_is_a_lifecycle_violation() {
        for _ in 0..100 {
            let engine = FakeAudioEngine::accept_all();
            let mut session = StreamSession::with_noise(engine.clone());
            let err = session.start().unwrap_err();
            assert_eq!(
                err,
                StreamError::LifecycleViolation {
                    operation: "start",
                    state: StreamState::Unopened,
                }
            );
            assert_eq!(engine.start_calls(), 0);
        }
    }

    #[test]
    fn start_after_failed_open_is_a_lifecycle_violation() {
        let engine = FakeAudioEngine::rejecting(EngineError::new(
            EngineStatus::Unsupported,
            "exclusive mode unavailable",
        ));
        let mut session = StreamSession::with_noise(engine.clone());

        let err = session.open(StreamConfiguration::recording()).unwrap_err();
        assert!(matches!(err, StreamError::ConfigurationUnsupported(ref e) if e.status == EngineStatus::Unsupported));
        assert_eq!(session.state(), StreamState::Unopened);
        assert_eq!(engine.outstanding_handles(), 0);

        assert!(matches!(
            session.start(),
            Err(StreamError::LifecycleViolation { operation: "start", .. })
        ));
    }

    #[test]
    fn stop_is_idempotent() {
        let engine = FakeAudioEngine::accept_all();
        let mut session = StreamSession::with_noise(engine.clone());
        session.open(StreamConfiguration::recording()).unwrap();
        session.start().unwrap();

        assert!(session.stop().is_ok());
        assert!(session.stop().is_ok());
        assert_eq!(engine.stop_calls(), 1);
        assert_eq!(session.state(), StreamState::Opened);
    }

    #[test]
    fn stop_before_open_is_rejected() {
        let mut session = StreamSession::with_noise(FakeAudioEngine::accept_all());
        assert!(matches!(
            session.stop(),
            Err(StreamError::LifecycleViolation { operation: "stop", .. })
        ));
    }

    #[test]
    fn open_twice_is_rejected() {
        let engine = FakeAudioEngine::accept_all();
        let mut session = StreamSession::with_noise(engine.clone());
        session.open(StreamConfiguration::recording()).unwrap();

        let err = session.open(StreamConfiguration::playback()).unwrap_err();
        assert_eq!(
            err,
            StreamError::LifecycleViolation {
                operation: "open",
                state: StreamState::Opened,
            }
        );
        assert_eq!(engine.outstanding_handles(), 1);
        assert_eq!(session.config(), Some(&StreamConfiguration::recording()));
    }

    #[test]
    fn invalid_configuration_never_reaches_the_engine() {
        let engine = FakeAudioEngine::accept_all();
        let mut session = StreamSession::with_noise(engine.clone());
        let config = StreamConfiguration {
            frames_per_callback: Some(0),
            ..StreamConfiguration::recording()
        };
        assert!(matches!(
            session.open(config),
            Err(StreamError::InvalidConfiguration(_))
        ));
        assert_eq!(engine.outstanding_handles(), 0);
    }

    #[test]
    fn session_can_restart_after_stop() {
        let engine = FakeAudioEngine::accept_all();
        let mut session = StreamSession::with_noise(engine.clone());
        session.open(StreamConfiguration::playback()).unwrap();

        session.start().unwrap();
        session.stop().unwrap();
        session.start().unwrap();
        assert!(engine.pump(32, SampleFormat::F32, 1).is_some());
        session.stop().unwrap();

        assert_eq!(engine.start_calls(), 2);
        assert_eq!(session.diagnostics().fill_count, 1);
    }

    #[test]
    fn close_stops_a_running_stream_and_releases_once() {
        let engine = FakeAudioEngine::accept_all();
        let mut session = StreamSession::with_noise(engine.clone());
        session.open(StreamConfiguration::recording()).unwrap();
        session.start().unwrap();

        session.close().unwrap();
        assert_eq!(engine.stop_calls(), 1);
        assert!(!engine.is_running());
        assert_eq!(engine.outstanding_handles(), 0);

        session.close().unwrap();
        assert_eq!(engine.outstanding_handles(), 0);
        assert!(matches!(
            session.start(),
            Err(StreamError::LifecycleViolation { state: StreamState::Closed, .. })
        ));
    }

    #[test]
    fn drop_releases_the_handle() {
        let engine = FakeAudioEngine::accept_all();
        {
            let mut session = StreamSession::with_noise(engine.clone());
            session.open(StreamConfiguration::recording()).unwrap();
            session.start().unwrap();
            assert_eq!(engine.outstanding_handles(), 1);
        }
        assert_eq!(engine.outstanding_handles(), 0);
        assert!(!engine.is_running());
    }

    #[test]
    fn noise_fill_writes_every_sample_within_amplitude() {
        let engine = FakeAudioEngine::accept_all();
        let mut session = StreamSession::with_noise(engine.clone());
        session.open(StreamConfiguration::playback()).unwrap();
        session.start().unwrap();

        for num_frames in [1usize, 64, 4096] {
            let (result, samples) = engine.pump(num_frames, SampleFormat::F32, 1).unwrap();
            assert_eq!(result, FillResult::Continue);
            let SampleBuffer::F32(samples) = samples else {
                panic!("expected float samples");
            };
            assert_eq!(samples.len(), num_frames);
            assert!(samples
                .iter()
                .all(|s| (-DEFAULT_NOISE_AMPLITUDE..=DEFAULT_NOISE_AMPLITUDE).contains(s)));
        }
        assert_eq!(session.diagnostics().frames_processed, 1 + 64 + 4096);
    }

    #[test]
    fn strategy_stop_halts_the_stream() {
        let engine = FakeAudioEngine::accept_all();
        let mut remaining = 3;
        let strategy = from_fn(move |buffer: &mut FrameBuffer<'_>, _num_frames| {
            buffer.fill_silence();
            remaining -= 1;
            if remaining == 0 {
                FillResult::Stop
            } else {
                FillResult::Continue
            }
        });
        let mut session = StreamSession::new(engine.clone(), strategy);
        session.open(StreamConfiguration::playback()).unwrap();
        session.start().unwrap();

        let mut results = Vec::new();
        while let Some((result, _)) = engine.pump(16, SampleFormat::F32, 1) {
            results.push(result);
        }
        assert_eq!(
            results,
            vec![FillResult::Continue, FillResult::Continue, FillResult::Stop]
        );

        let diagnostics = session.diagnostics();
        assert!(diagnostics.halted_by_strategy);
        assert_eq!(diagnostics.fill_count, 3);
        assert!(!session.is_streaming());

        session.stop().unwrap();
        assert_eq!(session.state(), StreamState::Opened);
    }

    #[test]
    fn late_callback_after_stop_never_reaches_the_strategy() {
        let engine = FakeAudioEngine::accept_all();
        let counter = Arc::new(AtomicUsize::new(0));
        let mut session = StreamSession::new(engine.clone(), counting_strategy(Arc::clone(&counter)));
        session.open(StreamConfiguration::playback()).unwrap();
        session.start().unwrap();
        engine.pump(8, SampleFormat::F32, 1).unwrap();
        session.stop().unwrap();

        assert_eq!(engine.pump_unchecked(8), Some(FillResult::Stop));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn recording_scenario_end_to_end() {
        let engine = FakeAudioEngine::accept_all();
        let counter = Arc::new(AtomicUsize::new(0));
        let mut session = StreamSession::new(engine.clone(), counting_strategy(Arc::clone(&counter)));

        let config = StreamConfiguration {
            direction: Direction::Capture,
            format: SampleFormat::I16,
            channel_count: ChannelCount::Mono,
            performance_mode: PerformanceMode::LowLatency,
            sharing_mode: SharingMode::Exclusive,
            sample_rate: None,
            frames_per_callback: None,
        };
        session.open(config).unwrap();
        assert_eq!(engine.outstanding_handles(), 1);
        session.start().unwrap();

        for _ in 0..10 {
            let (result, _) = engine.pump(96, SampleFormat::I16, 1).unwrap();
            assert_eq!(result, FillResult::Continue);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 10);

        session.stop().unwrap();
        for _ in 0..5 {
            assert!(engine.pump(96, SampleFormat::I16, 1).is_none());
        }
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert_eq!(session.diagnostics().fill_count, 10);
    }

    #[test]
    fn failed_start_leaves_an_opened_session_that_closes_cleanly() {
        let engine = FakeAudioEngine::failing_start(EngineError::new(
            EngineStatus::DeviceUnavailable,
            "device unplugged",
        ));
        let mut session = StreamSession::with_noise(engine.clone());
        session.open(StreamConfiguration::recording()).unwrap();

        let err = session.start().unwrap_err();
        assert!(matches!(err, StreamError::Engine(ref e) if e.status == EngineStatus::DeviceUnavailable));
        assert!(!session.is_streaming());
        assert_eq!(session.state(), StreamState::Opened);
        assert_eq!(engine.outstanding_handles(), 1);

        session.close().unwrap();
        assert_eq!(engine.outstanding_handles(), 0);
        assert_eq!(engine.stop_calls(), 0);
    }

    fn slow_fill_strategy(in_fill: Arc<AtomicBool>) -> impl FillStrategy {
        from_fn(move |buffer: &mut FrameBuffer<'_>, _num_frames| {
            in_fill.store(true, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(200));
            buffer.fill_silence();
            in_fill.store(false, Ordering::SeqCst);
            FillResult::Continue
        })
    }

    fn wait_for(flag: &AtomicBool) {
        for _ in 0..2000 {
            if flag.load(Ordering::SeqCst) {
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("fill never started");
    }

    #[test]
    fn stop_waits_for_an_in_flight_fill_on_a_non_draining_engine() {
        let engine = FakeAudioEngine::without_drain();
        let in_fill = Arc::new(AtomicBool::new(false));
        let mut session = StreamSession::new(engine.clone(), slow_fill_strategy(Arc::clone(&in_fill)));
        session.open(StreamConfiguration::playback()).unwrap();
        session.start().unwrap();

        let pumping = engine.clone();
        let worker = thread::spawn(move || pumping.pump(64, SampleFormat::F32, 1));
        wait_for(&in_fill);

        session.stop().unwrap();
        assert!(!in_fill.load(Ordering::SeqCst));
        assert_eq!(session.diagnostics().fill_count, 1);

        let (result, _) = worker.join().unwrap().unwrap();
        assert_eq!(result, FillResult::Continue);
    }

    #[test]
    fn close_waits_for_an_in_flight_fill_on_a_non_draining_engine() {
        let engine = FakeAudioEngine::without_drain();
        let in_fill = Arc::new(AtomicBool::new(false));
        let mut session = StreamSession::new(engine.clone(), slow_fill_strategy(Arc::clone(&in_fill)));
        session.open(StreamConfiguration::playback()).unwrap();
        session.start().unwrap();

        let pumping = engine.clone();
        let worker = thread::spawn(move || pumping.pump(64, SampleFormat::F32, 1));
        wait_for(&in_fill);

        session.close().unwrap();
        assert!(!in_fill.load(Ordering::SeqCst));
        assert_eq!(engine.outstanding_handles(), 0);
        worker.join().unwrap();
    }

    #[test]
    fn strategy_halt_keeps_running_state_until_stopped() {
        let engine = FakeAudioEngine::accept_all();
        let strategy = from_fn(|buffer: &mut FrameBuffer<'_>, _num_frames| {
            buffer.fill_silence();
            FillResult::Stop
        });
        let mut session = StreamSession::new(engine.clone(), strategy);
        session.open(StreamConfiguration::playback()).unwrap();
        session.start().unwrap();
        engine.pump(16, SampleFormat::F32, 1).unwrap();

        assert_eq!(session.state(), StreamState::Running);
        assert!(session.diagnostics().halted_by_strategy);
        assert!(matches!(
            session.start(),
            Err(StreamError::LifecycleViolation { state: StreamState::Running, .. })
        ));

        session.stop().unwrap();
        session.start().unwrap();
        assert!(!session.diagnostics().halted_by_strategy);
        assert!(session.is_streaming());
    }
}
