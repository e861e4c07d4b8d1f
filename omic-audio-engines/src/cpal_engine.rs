//! Device audio engine backed by cpal.
//!
//! Opens the host's default input or output device with the requested
//! format, channel count, rate and buffer size. cpal exposes neither
//! performance nor sharing modes, so both are advisory here: an exclusive
//! request is opened shared and logged.
//!
//! Input buffers are read-only in cpal; they are copied into a per-stream
//! scratch buffer before the fill callback sees them.
//!
//! `pause` does not wait for a device callback already running, so each
//! invocation holds the stream's callback lock and `request_stop` takes it
//! once after pausing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;

use omic_audio_core::models::config::{Direction, SampleFormat, SharingMode, StreamConfiguration};
use omic_audio_core::models::error::{EngineError, EngineStatus};
use omic_audio_core::processing::frame_buffer::Sample;
use omic_audio_core::traits::audio_engine::{AudioEngine, FillCallback};
use omic_audio_core::traits::fill_strategy::FillResult;

/// Engine using the default cpal host.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalEngine;

impl CpalEngine {
    pub fn new() -> Self {
        Self
    }
}

/// Stream handle for `CpalEngine`.
///
/// `halted` is raised when the callback returns `Stop` or the stream is
/// paused; further device callbacks then produce silence without invoking
/// the fill callback. It is read under `callback`'s lock.
pub struct CpalStream {
    stream: cpal::Stream,
    callback: Arc<Mutex<FillCallback>>,
    halted: Arc<AtomicBool>,
    config: cpal::StreamConfig,
}

impl CpalStream {
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }
}

impl AudioEngine for CpalEngine {
    type Stream = CpalStream;

    fn open_stream(
        &self,
        config: &StreamConfiguration,
        callback: FillCallback,
    ) -> Result<CpalStream, EngineError> {
        let host = cpal::default_host();
        let device = match config.direction {
            Direction::Capture => host.default_input_device(),
            Direction::Playback => host.default_output_device(),
        }
        .ok_or_else(|| {
            EngineError::new(
                EngineStatus::DeviceUnavailable,
                format!("no default {:?} device", config.direction),
            )
        })?;

        if config.sharing_mode == SharingMode::Exclusive {
            log::debug!("cpal has no exclusive mode; opening the device shared");
        }

        let sample_rate = match config.sample_rate {
            Some(rate) => rate,
            None => default_sample_rate(&device, config.direction)?,
        };
        let stream_config = cpal::StreamConfig {
            channels: config.channel_count.count(),
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: match config.frames_per_callback {
                Some(frames) => cpal::BufferSize::Fixed(frames),
                None => cpal::BufferSize::Default,
            },
        };

        let halted = Arc::new(AtomicBool::new(true));
        let callback = Arc::new(Mutex::new(callback));
        let stream = match (config.direction, config.format) {
            (Direction::Capture, SampleFormat::I16) => {
                build_input::<i16>(&device, &stream_config, Arc::clone(&callback), Arc::clone(&halted))
            }
            (Direction::Capture, SampleFormat::I32) => {
                build_input::<i32>(&device, &stream_config, Arc::clone(&callback), Arc::clone(&halted))
            }
            (Direction::Capture, SampleFormat::F32) => {
                build_input::<f32>(&device, &stream_config, Arc::clone(&callback), Arc::clone(&halted))
            }
            (Direction::Playback, SampleFormat::I16) => {
                build_output::<i16>(&device, &stream_config, Arc::clone(&callback), Arc::clone(&halted))
            }
            (Direction::Playback, SampleFormat::I32) => {
                build_output::<i32>(&device, &stream_config, Arc::clone(&callback), Arc::clone(&halted))
            }
            (Direction::Playback, SampleFormat::F32) => {
                build_output::<f32>(&device, &stream_config, Arc::clone(&callback), Arc::clone(&halted))
            }
        }?;

        // Some backends start streams on creation.
        stream
            .pause()
            .map_err(|e| EngineError::new(EngineStatus::Internal, format!("failed to pause new stream: {}", e)))?;

        log::debug!(
            "opened cpal {:?} stream: {} Hz, {} channel(s)",
            config.direction,
            sample_rate,
            stream_config.channels
        );

        Ok(CpalStream {
            stream,
            callback,
            halted,
            config: stream_config,
        })
    }

    fn request_start(&self, stream: &mut CpalStream) -> Result<(), EngineError> {
        stream.halted.store(false, Ordering::Release);
        stream.stream.play().map_err(|e| {
            stream.halted.store(true, Ordering::Release);
            EngineError::new(EngineStatus::InvalidState, format!("failed to start stream: {}", e))
        })
    }

    fn request_stop(&self, stream: &mut CpalStream) -> Result<(), EngineError> {
        stream.halted.store(true, Ordering::Release);
        let paused = stream
            .stream
            .pause()
            .map_err(|e| EngineError::new(EngineStatus::InvalidState, format!("failed to stop stream: {}", e)));
        // Drain a callback that passed the halt check before it was raised.
        drop(stream.callback.lock());
        paused
    }

    fn close_stream(&self, stream: CpalStream) {
        stream.halted.store(true, Ordering::Release);
        drop(stream);
    }

    fn name(&self) -> &str {
        "cpal"
    }
}

fn default_sample_rate(device: &cpal::Device, direction: Direction) -> Result<u32, EngineError> {
    let config = match direction {
        Direction::Capture => device.default_input_config(),
        Direction::Playback => device.default_output_config(),
    }
    .map_err(|e| {
        EngineError::new(
            EngineStatus::DeviceUnavailable,
            format!("failed to query default device config: {}", e),
        )
    })?;
    Ok(config.sample_rate().0)
}

fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    callback: Arc<Mutex<FillCallback>>,
    halted: Arc<AtomicBool>,
) -> Result<cpal::Stream, EngineError>
where
    T: Sample + cpal::SizedSample,
{
    let channels = config.channels as usize;
    // Grown on the first callback to the device's period; reused afterwards.
    let mut scratch: Vec<T> = Vec::new();

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let mut callback = callback.lock();
                if halted.load(Ordering::Acquire) {
                    return;
                }
                scratch.clear();
                scratch.extend_from_slice(data);
                let frames = data.len() / channels;
                let mut buffer = T::frame_buffer(&mut scratch);
                let fill = &mut *callback;
                if fill(&mut buffer, frames) == FillResult::Stop {
                    halted.store(true, Ordering::Release);
                }
            },
            |err| log::error!("cpal input stream error: {}", err),
            None,
        )
        .map_err(build_error)
}

fn build_output<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    callback: Arc<Mutex<FillCallback>>,
    halted: Arc<AtomicBool>,
) -> Result<cpal::Stream, EngineError>
where
    T: Sample + cpal::SizedSample,
{
    let channels = config.channels as usize;

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut callback = callback.lock();
                if halted.load(Ordering::Acquire) {
                    data.fill(T::EQUILIBRIUM);
                    return;
                }
                let frames = data.len() / channels;
                let mut buffer = T::frame_buffer(data);
                let fill = &mut *callback;
                if fill(&mut buffer, frames) == FillResult::Stop {
                    halted.store(true, Ordering::Release);
                }
            },
            |err| log::error!("cpal output stream error: {}", err),
            None,
        )
        .map_err(build_error)
}

fn build_error(err: cpal::BuildStreamError) -> EngineError {
    let status = match err {
        cpal::BuildStreamError::DeviceNotAvailable => EngineStatus::DeviceUnavailable,
        cpal::BuildStreamError::StreamConfigNotSupported => EngineStatus::Unsupported,
        cpal::BuildStreamError::InvalidArgument => EngineStatus::InvalidArgument,
        _ => EngineStatus::Internal,
    };
    EngineError::new(status, format!("failed to build stream: {}", err))
}
