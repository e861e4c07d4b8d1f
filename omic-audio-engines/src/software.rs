//! Clock-driven audio engine.
//!
//! Invokes fill callbacks on a dedicated thread at the stream's frame
//! cadence without touching a device. Capture streams receive silence.
//! Useful for headless hosts and for exercising sessions with real threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use omic_audio_core::models::config::{Direction, SampleFormat, SharingMode, StreamConfiguration};
use omic_audio_core::models::error::{EngineError, EngineStatus};
use omic_audio_core::processing::frame_buffer::SampleBuffer;
use omic_audio_core::traits::audio_engine::{AudioEngine, FillCallback};
use omic_audio_core::traits::fill_strategy::FillResult;

/// Sample rate used when the configuration leaves it open.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Frames per callback when the configuration leaves it open (4ms at 48 kHz).
pub const DEFAULT_FRAMES_PER_CALLBACK: u32 = 192;

/// Stream shapes a `SoftwareEngine` agrees to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftwareCapabilities {
    pub formats: Vec<SampleFormat>,
    pub max_channels: u16,
    pub exclusive: bool,
    /// Accepted sample rates, or `None` for any.
    pub sample_rates: Option<Vec<u32>>,
}

impl Default for SoftwareCapabilities {
    fn default() -> Self {
        Self {
            formats: vec![SampleFormat::I16, SampleFormat::I32, SampleFormat::F32],
            max_channels: 2,
            exclusive: true,
            sample_rates: None,
        }
    }
}

/// Engine that paces fills with a timer instead of hardware.
#[derive(Debug, Clone, Default)]
pub struct SoftwareEngine {
    capabilities: SoftwareCapabilities,
}

impl SoftwareEngine {
    /// Engine accepting every stream shape.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capabilities(capabilities: SoftwareCapabilities) -> Self {
        Self { capabilities }
    }

    pub fn capabilities(&self) -> &SoftwareCapabilities {
        &self.capabilities
    }

    fn check_supported(&self, config: &StreamConfiguration) -> Result<(), EngineError> {
        let caps = &self.capabilities;
        if !caps.formats.contains(&config.format) {
            return Err(EngineError::new(
                EngineStatus::Unsupported,
                format!("sample format {:?} not supported", config.format),
            ));
        }
        if config.channel_count.count() > caps.max_channels {
            return Err(EngineError::new(
                EngineStatus::Unsupported,
                format!("{} channel(s) exceeds the maximum of {}", config.channel_count.count(), caps.max_channels),
            ));
        }
        if config.sharing_mode == SharingMode::Exclusive && !caps.exclusive {
            return Err(EngineError::new(
                EngineStatus::Unsupported,
                "exclusive sharing mode not available",
            ));
        }
        if let (Some(rate), Some(rates)) = (config.sample_rate, caps.sample_rates.as_ref()) {
            if !rates.contains(&rate) {
                return Err(EngineError::new(
                    EngineStatus::Unsupported,
                    format!("sample rate {} Hz not supported", rate),
                ));
            }
        }
        Ok(())
    }
}

/// Negotiated shape of a software stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftwareStreamFormat {
    pub direction: Direction,
    pub format: SampleFormat,
    pub channels: usize,
    pub sample_rate: u32,
    pub frames_per_callback: usize,
}

/// Stream handle for `SoftwareEngine`.
///
/// Dropping the handle stops and joins the render thread.
pub struct SoftwareStream {
    format: SoftwareStreamFormat,
    callback: Arc<Mutex<FillCallback>>,
    running: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl SoftwareStream {
    pub fn format(&self) -> SoftwareStreamFormat {
        self.format
    }

    /// Whether the render thread is still invoking the callback.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn halt(&mut self) -> Result<(), EngineError> {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.worker.take() {
            handle
                .join()
                .map_err(|_| EngineError::new(EngineStatus::Internal, "render thread panicked"))?;
        }
        Ok(())
    }
}

impl Drop for SoftwareStream {
    fn drop(&mut self) {
        if let Err(e) = self.halt() {
            log::error!("software stream teardown failed: {}", e);
        }
    }
}

impl AudioEngine for SoftwareEngine {
    type Stream = SoftwareStream;

    fn open_stream(
        &self,
        config: &StreamConfiguration,
        callback: FillCallback,
    ) -> Result<SoftwareStream, EngineError> {
        self.check_supported(config)?;

        let format = SoftwareStreamFormat {
            direction: config.direction,
            format: config.format,
            channels: config.channel_count.count() as usize,
            sample_rate: config.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE),
            frames_per_callback: config
                .frames_per_callback
                .unwrap_or(DEFAULT_FRAMES_PER_CALLBACK) as usize,
        };
        log::debug!("opened software stream: {:?}", format);

        Ok(SoftwareStream {
            format,
            callback: Arc::new(Mutex::new(callback)),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        })
    }

    fn request_start(&self, stream: &mut SoftwareStream) -> Result<(), EngineError> {
        if stream.is_running() {
            return Ok(());
        }
        // A previous run may have ended on its own after a `Stop`.
        stream.halt()?;

        stream.running.store(true, Ordering::Release);
        let running = Arc::clone(&stream.running);
        let callback = Arc::clone(&stream.callback);
        let format = stream.format;

        let handle = thread::Builder::new()
            .name("omic-software-stream".into())
            .spawn(move || render_loop(running, callback, format))
            .map_err(|e| {
                stream.running.store(false, Ordering::Release);
                EngineError::new(
                    EngineStatus::Internal,
                    format!("failed to spawn render thread: {}", e),
                )
            })?;

        stream.worker = Some(handle);
        Ok(())
    }

    fn request_stop(&self, stream: &mut SoftwareStream) -> Result<(), EngineError> {
        stream.halt()
    }

    fn close_stream(&self, stream: SoftwareStream) {
        drop(stream);
    }

    fn name(&self) -> &str {
        "software"
    }
}

/// Render loop running on the stream's thread.
///
/// Paces callbacks against an absolute deadline so sleep jitter does not
/// accumulate. After an overrun the schedule restarts from now.
fn render_loop(
    running: Arc<AtomicBool>,
    callback: Arc<Mutex<FillCallback>>,
    format: SoftwareStreamFormat,
) {
    let frames = format.frames_per_callback;
    let period = Duration::from_secs_f64(frames as f64 / format.sample_rate as f64);
    let mut samples = SampleBuffer::new(format.format, frames * format.channels);
    let mut deadline = Instant::now();

    while running.load(Ordering::Acquire) {
        let mut buffer = samples.as_frame_buffer();
        if format.direction == Direction::Capture {
            buffer.fill_silence();
        }

        let result = {
            let mut guard = callback.lock();
            let fill = &mut *guard;
            fill(&mut buffer, frames)
        };
        if result == FillResult::Stop {
            running.store(false, Ordering::Release);
            log::debug!("software stream halted by its callback");
            break;
        }

        deadline += period;
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        } else {
            deadline = now;
        }
    }
}
