//! The reminder tone.

use std::f32::consts::TAU;
use std::time::Duration;

use crate::config::AlertConfig;
use crate::error::{Error, Result};

/// A sine tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    /// Frequency in hertz.
    pub frequency_hz: f32,
    /// Peak amplitude, 0 to 1.
    pub amplitude: f32,
    /// How long it plays.
    pub duration: Duration,
}

impl Default for Tone {
    fn default() -> Self {
        Self {
            frequency_hz: 440.0,
            amplitude: 0.1,
            duration: Duration::from_millis(500),
        }
    }
}

impl Tone {
    /// The tone described by the alert configuration.
    #[must_use]
    pub fn from_config(config: &AlertConfig) -> Self {
        Self {
            frequency_hz: config.tone_frequency_hz,
            amplitude: config.tone_amplitude,
            duration: Duration::from_millis(config.tone_duration_ms),
        }
    }
}

/// Plays tones.
pub trait TonePlayer: Send + Sync + std::fmt::Debug {
    /// Play `tone` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Audio`] if there is no usable output device.
    fn play(&self, tone: &Tone) -> Result<()>;
}

/// Interleaved samples for `tone` at the given output format.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn sine_samples(tone: &Tone, sample_rate: u32, channels: u16) -> Vec<f32> {
    let frames = (tone.duration.as_secs_f64() * f64::from(sample_rate)).round() as usize;
    let step = TAU * tone.frequency_hz / sample_rate as f32;

    let mut samples = Vec::with_capacity(frames * usize::from(channels));
    for frame in 0..frames {
        let value = tone.amplitude * (step * frame as f32).sin();
        samples.extend(std::iter::repeat(value).take(usize::from(channels)));
    }
    samples
}

/// A player for builds without audio output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentTone;

impl TonePlayer for SilentTone {
    fn play(&self, _tone: &Tone) -> Result<()> {
        Err(Error::audio("medsense was built without the 'audio' feature"))
    }
}

/// Plays tones on the default output device.
#[cfg(feature = "audio")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SineTonePlayer;

#[cfg(feature = "audio")]
impl TonePlayer for SineTonePlayer {
    fn play(&self, tone: &Tone) -> Result<()> {
        use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
        use tracing::trace;

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::audio("no output device"))?;

        let supported = device
            .default_output_config()
            .map_err(|e| Error::audio(e.to_string()))?;
        let format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let samples = sine_samples(tone, config.sample_rate.0, config.channels);
        trace!(
            device = ?device.name(),
            sample_rate = config.sample_rate.0,
            ?format,
            samples = samples.len(),
            "Playing reminder tone"
        );

        let stream = match format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, samples),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, samples),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, samples),
            cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, samples),
            other => Err(Error::audio(format!("unsupported sample format {other:?}"))),
        }?;

        stream.play().map_err(|e| Error::audio(e.to_string()))?;
        // Let the buffer drain before the stream is dropped.
        std::thread::sleep(tone.duration + Duration::from_millis(50));
        Ok(())
    }
}

/// An output stream that plays `samples`, converted to `T`, then silence.
#[cfg(feature = "audio")]
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    samples: Vec<f32>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    use cpal::traits::DeviceTrait;

    let mut position = 0;
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _info: &cpal::OutputCallbackInfo| {
                position = fill_buffer(data, &samples, position);
            },
            move |err| {
                tracing::warn!("Audio output error: {err}");
            },
            None,
        )
        .map_err(|e| Error::audio(e.to_string()))
}

/// Copy `samples` from `position` into `data`, padding with silence.
/// Returns the next position.
#[cfg(feature = "audio")]
fn fill_buffer<T>(data: &mut [T], samples: &[f32], position: usize) -> usize
where
    T: cpal::Sample + cpal::FromSample<f32>,
{
    for (offset, out) in data.iter_mut().enumerate() {
        let value = samples.get(position + offset).copied().unwrap_or(0.0);
        *out = T::from_sample(value);
    }
    position + data.len()
}

/// The best player this build supports.
#[must_use]
pub fn default_tone_player() -> Box<dyn TonePlayer> {
    #[cfg(feature = "audio")]
    {
        Box::new(SineTonePlayer)
    }
    #[cfg(not(feature = "audio"))]
    {
        Box::new(SilentTone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tone() {
        let tone = Tone::default();
        assert!((tone.frequency_hz - 440.0).abs() < f32::EPSILON);
        assert!((tone.amplitude - 0.1).abs() < f32::EPSILON);
        assert_eq!(tone.duration, Duration::from_millis(500));
    }

    #[test]
    fn test_tone_from_config() {
        let config = AlertConfig {
            tone_frequency_hz: 880.0,
            tone_amplitude: 0.5,
            tone_duration_ms: 250,
            ..AlertConfig::default()
        };
        let tone = Tone::from_config(&config);
        assert!((tone.frequency_hz - 880.0).abs() < f32::EPSILON);
        assert_eq!(tone.duration, Duration::from_millis(250));
    }

    #[test]
    fn test_sine_samples_length_and_channels() {
        let samples = sine_samples(&Tone::default(), 48_000, 2);
        assert_eq!(samples.len(), 24_000 * 2);
        // Channels carry the same value.
        assert!((samples[100] - samples[101]).abs() < f32::EPSILON);
    }

    #[test]
    fn test_sine_samples_stay_within_amplitude() {
        let tone = Tone::default();
        let samples = sine_samples(&tone, 44_100, 1);
        assert!(samples[0].abs() < f32::EPSILON);
        let peak = samples.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!(peak <= tone.amplitude + f32::EPSILON);
        assert!(peak > tone.amplitude * 0.99);
    }

    #[test]
    fn test_sine_samples_zero_duration() {
        let tone = Tone {
            duration: Duration::ZERO,
            ..Tone::default()
        };
        assert!(sine_samples(&tone, 44_100, 2).is_empty());
    }

    #[test]
    fn test_silent_tone_reports_audio_error() {
        let err = SilentTone.play(&Tone::default()).unwrap_err();
        assert!(matches!(err, Error::Audio(_)));
    }

    #[cfg(feature = "audio")]
    #[test]
    fn test_fill_buffer_converts_integer_formats() {
        let samples = [0.5_f32, -0.5];

        let mut signed = [7_i16; 4];
        assert_eq!(fill_buffer(&mut signed, &samples, 0), 4);
        assert_eq!(signed, [16_384, -16_384, 0, 0]);

        let mut unsigned = [0_u16; 2];
        assert_eq!(fill_buffer(&mut unsigned, &samples, 2), 4);
        assert_eq!(unsigned, [32_768, 32_768]);
    }

    #[cfg(feature = "audio")]
    #[test]
    fn test_fill_buffer_continues_from_position() {
        let samples = [0.1_f32, 0.2, 0.3];
        let mut out = [0.0_f32; 2];
        let next = fill_buffer(&mut out, &samples, 1);
        assert_eq!(next, 3);
        assert!((out[0] - 0.2).abs() < f32::EPSILON);
        assert!((out[1] - 0.3).abs() < f32::EPSILON);
    }
}
