use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use cpal::traits::DeviceTrait;
use cpal::traits::HostTrait;
use cpal::traits::StreamTrait;
use cpal::BuildStreamError;
use cpal::SampleFormat;
use cpal::SizedSample;
use cpal::Stream;
use cpal::StreamConfig;
use log::error;
use log::info;
use log::warn;
use retrocloud_core::library::AudioSink;

/// Sample rate the emulation library produces audio at.
const SAMPLE_RATE: u32 = 44100;

/// Upper bound of queued stereo samples, a quarter second. Older samples are dropped when the
/// output falls behind.
const MAX_QUEUED_SAMPLES: usize = SAMPLE_RATE as usize / 4;

/// Plays the stereo samples produced by the emulation library.
///
/// The output stream is opened lazily with the first samples, so a game that never produces
/// audio never touches the audio device.
pub struct AudioOutput {
    stream: Option<Stream>,
    failed: bool,
    queue: Arc<Mutex<SampleQueue>>,
}

impl Default for AudioOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput {
    pub fn new() -> Self {
        Self {
            stream: None,
            failed: false,
            queue: Arc::new(Mutex::new(SampleQueue::default())),
        }
    }

    fn start(&mut self) {
        if self.stream.is_some() || self.failed {
            return;
        }

        info!("Starting audio output");
        let stream = match self.setup_audio_stream() {
            Ok(stream) => stream,
            Err(err) => {
                error!("Failed to setup audio stream: {err}");
                self.failed = true;
                return;
            }
        };

        if let Err(err) = stream.play() {
            error!("Error playing audio stream: {err}");
            self.failed = true;
            return;
        }
        self.stream = Some(stream);
    }

    fn setup_audio_stream(&self) -> Result<Stream, BuildStreamError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(BuildStreamError::DeviceNotAvailable)?;

        let supported_config = device
            .default_output_config()
            .map_err(|_| BuildStreamError::StreamConfigNotSupported)?;

        let config = StreamConfig {
            channels: 2,
            sample_rate: cpal::SampleRate(SAMPLE_RATE),
            buffer_size: cpal::BufferSize::Default,
        };

        match supported_config.sample_format() {
            SampleFormat::F32 => self.build_stream::<f32>(&device, &config),
            SampleFormat::I16 => self.build_stream::<i16>(&device, &config),
            SampleFormat::U16 => self.build_stream::<u16>(&device, &config),
            _ => Err(BuildStreamError::StreamConfigNotSupported),
        }
    }

    fn build_stream<T: SampleConverter>(
        &self,
        device: &cpal::Device,
        config: &StreamConfig,
    ) -> Result<Stream, BuildStreamError> {
        let queue = self.queue.clone();
        device.build_output_stream(
            config,
            move |data: &mut [T::Output], _: &cpal::OutputCallbackInfo| {
                if let Ok(mut queue) = queue.lock() {
                    for chunk in data.chunks_exact_mut(2) {
                        let (left, right) = queue.next_sample().unwrap_or((0.0, 0.0));
                        chunk[0] = T::convert(left);
                        chunk[1] = T::convert(right);
                    }
                }
            },
            |err| error!("Error in audio stream: {err}"),
            None,
        )
    }

    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            info!("Stopping audio output");
            drop(stream);
        }
        if let Ok(mut queue) = self.queue.lock() {
            queue.clear();
        }
    }
}

impl AudioSink for AudioOutput {
    fn push_samples(&mut self, samples: &[(f32, f32)]) {
        self.start();
        if self.stream.is_none() {
            return;
        }
        if let Ok(mut queue) = self.queue.lock() {
            queue.push(samples);
        }
    }

    fn close(&mut self) {
        self.stop();
    }
}

#[derive(Default)]
struct SampleQueue {
    samples: VecDeque<(f32, f32)>,
    dropped: usize,
}

impl SampleQueue {
    fn push(&mut self, samples: &[(f32, f32)]) {
        self.samples.extend(samples.iter().copied());
        let overflow = self.samples.len().saturating_sub(MAX_QUEUED_SAMPLES);
        if overflow > 0 {
            self.samples.drain(..overflow);
            self.dropped += overflow;
            if self.dropped >= SAMPLE_RATE as usize {
                warn!("Audio output is falling behind, dropped {} samples", self.dropped);
                self.dropped = 0;
            }
        }
    }

    fn next_sample(&mut self) -> Option<(f32, f32)> {
        self.samples.pop_front()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn clear(&mut self) {
        self.samples.clear();
        self.dropped = 0;
    }
}

/// Handles conversion between different sample formats
trait SampleConverter {
    type Output: SizedSample;
    fn convert(input: f32) -> Self::Output;
}

impl SampleConverter for f32 {
    type Output = f32;
    fn convert(input: f32) -> Self::Output {
        input.clamp(-1.0, 1.0)
    }
}

impl SampleConverter for i16 {
    type Output = i16;
    fn convert(input: f32) -> Self::Output {
        (input.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
    }
}

impl SampleConverter for u16 {
    type Output = u16;
    fn convert(input: f32) -> Self::Output {
        ((input.clamp(-1.0, 1.0) + 1.0) * 32767.5) as u16
    }
}
