//! Sample sources for the analyzer
//!
//! Loads audio either from an in-memory WAV file or from PCM already
//! decoded by the host, and keeps a mono mixdown ready for analysis.

use std::io::Cursor;

use hound::{SampleFormat, WavReader};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to decode WAV data: {0}")]
    Wav(#[from] hound::Error),

    #[error("Unsupported sample format: {bits}-bit {format}")]
    UnsupportedFormat { bits: u16, format: &'static str },

    #[error("Invalid stream parameters: {0}")]
    InvalidParameters(String),
}

/// Metadata of a loaded source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_ms: u64,
    /// Origin of the samples ("WAV" or "PCM")
    pub format: &'static str,
}

/// Decoded audio held in memory
#[derive(Debug, Clone)]
pub struct SampleSource {
    info: AudioInfo,
    /// Interleaved samples in [-1, 1]
    samples: Vec<f32>,
    /// Frame-averaged mixdown
    mono: Vec<f32>,
}

impl SampleSource {
    /// Decode a WAV file held in memory
    ///
    /// Accepts 8/16/24/32-bit integer PCM and 32-bit float. Integer samples
    /// are scaled to [-1, 1).
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self, SourceError> {
        let reader = WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();

        let samples = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 32) => reader.into_samples::<f32>().collect::<Result<Vec<_>, _>>()?,
            (SampleFormat::Int, 8) => read_scaled::<i8>(reader, 128.0)?,
            (SampleFormat::Int, 16) => read_scaled::<i16>(reader, 32_768.0)?,
            (SampleFormat::Int, 24) => read_scaled::<i32>(reader, 8_388_608.0)?,
            (SampleFormat::Int, 32) => read_scaled::<i32>(reader, 2_147_483_648.0)?,
            (format, bits) => {
                return Err(SourceError::UnsupportedFormat {
                    bits,
                    format: match format {
                        SampleFormat::Float => "float",
                        SampleFormat::Int => "integer",
                    },
                })
            }
        };

        let source = Self::build(samples, spec.sample_rate, spec.channels, "WAV")?;
        log::info!(
            "Loaded WAV: {} Hz, {} channels, {}-bit, {} ms",
            source.info.sample_rate,
            source.info.channels,
            spec.bits_per_sample,
            source.info.duration_ms
        );
        Ok(source)
    }

    /// Wrap interleaved PCM decoded elsewhere
    ///
    /// A trailing partial frame is dropped.
    pub fn from_pcm(samples: &[f32], sample_rate: u32, channels: u16) -> Result<Self, SourceError> {
        let source = Self::build(samples.to_vec(), sample_rate, channels, "PCM")?;
        log::info!(
            "Loaded PCM: {} Hz, {} channels, {} ms",
            source.info.sample_rate,
            source.info.channels,
            source.info.duration_ms
        );
        Ok(source)
    }

    fn build(
        mut samples: Vec<f32>,
        sample_rate: u32,
        channels: u16,
        format: &'static str,
    ) -> Result<Self, SourceError> {
        if channels == 0 {
            return Err(SourceError::InvalidParameters("channel count is zero".into()));
        }
        if sample_rate == 0 {
            return Err(SourceError::InvalidParameters("sample rate is zero".into()));
        }

        let channel_count = channels as usize;
        let partial = samples.len() % channel_count;
        if partial != 0 {
            log::warn!(
                "Dropping {} trailing samples that do not form a complete {}-channel frame",
                partial,
                channels
            );
            samples.truncate(samples.len() - partial);
        }

        let mono = if channel_count == 1 {
            samples.clone()
        } else {
            samples
                .chunks_exact(channel_count)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };

        let duration_ms = mono.len() as u64 * 1000 / sample_rate as u64;

        Ok(Self {
            info: AudioInfo {
                sample_rate,
                channels,
                duration_ms,
                format,
            },
            samples,
            mono,
        })
    }

    pub fn info(&self) -> &AudioInfo {
        &self.info
    }

    /// Interleaved samples as loaded
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Single-channel stream for analysis
    pub fn mono(&self) -> &[f32] {
        &self.mono
    }

    /// Number of sample frames (samples per channel)
    pub fn frame_count(&self) -> usize {
        self.mono.len()
    }
}

fn read_scaled<S>(reader: WavReader<Cursor<&[u8]>>, full_scale: f32) -> Result<Vec<f32>, SourceError>
where
    S: hound::Sample + Into<i32>,
{
    reader
        .into_samples::<S>()
        .map(|sample| sample.map(|v| v.into() as f32 / full_scale).map_err(SourceError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn wav_bytes<F>(spec: WavSpec, write: F) -> Vec<u8>
    where
        F: FnOnce(&mut WavWriter<Cursor<&mut Vec<u8>>>),
    {
        let mut bytes = Vec::new();
        {
            let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
            write(&mut writer);
            writer.finalize().unwrap();
        }
        bytes
    }

    #[test]
    fn test_wav_16_bit_mono() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, |w| {
            for v in [0i16, 16_384, -32_768, 32_767] {
                w.write_sample(v).unwrap();
            }
        });

        let source = SampleSource::from_wav_bytes(&bytes).unwrap();

        assert_eq!(source.info().format, "WAV");
        assert_eq!(source.info().sample_rate, 8000);
        assert_eq!(source.frame_count(), 4);
        assert_eq!(source.mono(), &[0.0, 0.5, -1.0, 32_767.0 / 32_768.0]);
    }

    #[test]
    fn test_wav_8_bit_stereo_mixdown() {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 1000,
            bits_per_sample: 8,
            sample_format: SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, |w| {
            for v in [64i8, 0, -128, 0] {
                w.write_sample(v).unwrap();
            }
        });

        let source = SampleSource::from_wav_bytes(&bytes).unwrap();

        assert_eq!(source.info().channels, 2);
        assert_eq!(source.samples(), &[0.5, 0.0, -1.0, 0.0]);
        assert_eq!(source.mono(), &[0.25, -0.5]);
        assert_eq!(source.info().duration_ms, 2);
    }

    #[test]
    fn test_wav_float() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let bytes = wav_bytes(spec, |w| {
            for i in 0..48000 {
                w.write_sample((i as f32 * 0.01).sin()).unwrap();
            }
        });

        let source = SampleSource::from_wav_bytes(&bytes).unwrap();
        assert_eq!(source.frame_count(), 48000);
        assert_eq!(source.info().duration_ms, 1000);
        assert!((source.mono()[100] - 1.0f32.sin()).abs() < 1e-6);
    }

    #[test]
    fn test_not_a_wav() {
        let result = SampleSource::from_wav_bytes(b"definitely not RIFF data");
        assert!(matches!(result, Err(SourceError::Wav(_))));
    }

    #[test]
    fn test_pcm_source() {
        let source = SampleSource::from_pcm(&[0.1, 0.3, 0.5, 0.7, 0.9], 44100, 2).unwrap();

        assert_eq!(source.info().format, "PCM");
        // Trailing half frame dropped
        assert_eq!(source.samples().len(), 4);
        assert_eq!(source.frame_count(), 2);
        assert!((source.mono()[0] - 0.2).abs() < 1e-6);
        assert!((source.mono()[1] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_pcm_invalid_parameters() {
        assert!(matches!(
            SampleSource::from_pcm(&[0.0; 4], 44100, 0),
            Err(SourceError::InvalidParameters(_))
        ));
        assert!(matches!(
            SampleSource::from_pcm(&[0.0; 4], 0, 1),
            Err(SourceError::InvalidParameters(_))
        ));
    }
}
