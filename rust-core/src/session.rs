//! Analysis session: one loaded track plus the analyzer working on it
//!
//! A session is the host-facing context object. It replaces process-wide
//! decoder/analyzer singletons with an explicit value the host creates,
//! loads audio into, queries, and drops.

use thiserror::Error;

use crate::audio::source::{AudioInfo, SampleSource, SourceError};
use crate::audio::waveform::{WaveformPoint, WaveformSampler};
use crate::spectrum::{AnalyzerConfig, SpectrumAnalyzer, SpectrumError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No audio loaded")]
    NoAudioLoaded,

    #[error("Sample offset {offset} is beyond the end of the track ({frames} frames)")]
    OffsetOutOfRange { offset: usize, frames: usize },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Spectrum(#[from] SpectrumError),
}

/// Loaded audio with its analyzer and waveform sampler
pub struct AnalysisSession {
    config: AnalyzerConfig,
    source: Option<SampleSource>,
    analyzer: Option<SpectrumAnalyzer>,
    waveform: WaveformSampler,
}

impl AnalysisSession {
    /// Create an empty session
    ///
    /// `config` seeds the analyzer, which is built on first use; its
    /// `sample_rate` is replaced by the loaded track's rate.
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            config,
            source: None,
            analyzer: None,
            waveform: WaveformSampler::new(),
        }
    }

    /// Load a WAV file held in memory, replacing any previous track
    pub fn load_wav(&mut self, bytes: &[u8]) -> Result<&AudioInfo, SessionError> {
        let source = SampleSource::from_wav_bytes(bytes)?;
        Ok(self.install(source))
    }

    /// Load interleaved PCM decoded by the host, replacing any previous track
    pub fn load_pcm(
        &mut self,
        samples: &[f32],
        sample_rate: u32,
        channels: u16,
    ) -> Result<&AudioInfo, SessionError> {
        let source = SampleSource::from_pcm(samples, sample_rate, channels)?;
        Ok(self.install(source))
    }

    fn install(&mut self, source: SampleSource) -> &AudioInfo {
        self.config.sample_rate = source.info().sample_rate as f64;
        if let Some(analyzer) = self.analyzer.as_mut() {
            let mut config = analyzer.config().clone();
            config.sample_rate = self.config.sample_rate;
            // Only the sample rate changed, which cannot fail validation
            if let Err(e) = analyzer.update_config(config) {
                log::warn!("Keeping previous analyzer after config update failed: {}", e);
            }
        }

        self.source.insert(source).info()
    }

    /// Spectrum of the first `fft_size` frames of the track
    pub fn spectrum(&mut self, fft_size: usize) -> Result<&[f32], SessionError> {
        self.spectrum_at(0, fft_size)
    }

    /// Spectrum of `fft_size` frames starting at frame `offset`
    ///
    /// Reconfigures the analyzer when `fft_size` differs from the last call.
    /// Fewer than `fft_size` remaining frames follow the analyzer's
    /// insufficient-samples policy.
    pub fn spectrum_at(&mut self, offset: usize, fft_size: usize) -> Result<&[f32], SessionError> {
        let source = self.source.as_ref().ok_or(SessionError::NoAudioLoaded)?;
        let mono = source.mono();
        if offset >= mono.len() {
            return Err(SessionError::OffsetOutOfRange {
                offset,
                frames: mono.len(),
            });
        }

        let analyzer = match &mut self.analyzer {
            Some(analyzer) => {
                analyzer.configure(fft_size)?;
                analyzer
            }
            slot @ None => {
                let config = AnalyzerConfig {
                    fft_size,
                    ..self.config.clone()
                };
                slot.insert(SpectrumAnalyzer::new(config)?)
            }
        };

        Ok(analyzer.analyze(&mono[offset..])?)
    }

    /// Downsampled amplitude envelope of the whole track
    pub fn waveform(&mut self, resolution: usize) -> Result<&[WaveformPoint], SessionError> {
        let source = self.source.as_ref().ok_or(SessionError::NoAudioLoaded)?;
        Ok(self.waveform.generate(source.mono(), resolution))
    }

    /// Analyzer state, once a spectrum has been requested
    pub fn analyzer(&self) -> Option<&SpectrumAnalyzer> {
        self.analyzer.as_ref()
    }

    /// Timing of the most recent transform in milliseconds (0.0 before any)
    pub fn last_transform_duration(&self) -> f64 {
        self.analyzer
            .as_ref()
            .map_or(0.0, SpectrumAnalyzer::last_transform_duration)
    }

    pub fn info(&self) -> Option<&AudioInfo> {
        self.source.as_ref().map(SampleSource::info)
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    /// Interleaved sample count (0 when nothing is loaded)
    pub fn sample_count(&self) -> usize {
        self.source.as_ref().map_or(0, |s| s.samples().len())
    }

    /// Sample rate in Hz (0 when nothing is loaded)
    pub fn sample_rate(&self) -> u32 {
        self.info().map_or(0, |info| info.sample_rate)
    }

    /// Channel count (0 when nothing is loaded)
    pub fn channels(&self) -> u16 {
        self.info().map_or(0, |info| info.channels)
    }

    /// Drop the loaded track and the analyzer
    pub fn reset(&mut self) {
        self.source = None;
        self.analyzer = None;
        self.waveform = WaveformSampler::new();
        log::debug!("Analysis session reset");
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::InsufficientSamplesPolicy;
    use std::f32::consts::PI;

    fn tone(freq: f32, sample_rate: u32, frames: usize) -> Vec<f32> {
        (0..frames)
            .map(|n| (2.0 * PI * freq * n as f32 / sample_rate as f32).sin())
            .collect()
    }

    fn peak_bin(spectrum: &[f32]) -> usize {
        spectrum
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap()
            .0
    }

    #[test]
    fn test_empty_session() {
        let mut session = AnalysisSession::default();

        assert!(!session.is_loaded());
        assert_eq!(session.sample_count(), 0);
        assert_eq!(session.sample_rate(), 0);
        assert_eq!(session.channels(), 0);
        assert_eq!(session.last_transform_duration(), 0.0);
        assert!(matches!(session.spectrum(1024), Err(SessionError::NoAudioLoaded)));
        assert!(matches!(session.waveform(16), Err(SessionError::NoAudioLoaded)));
    }

    #[test]
    fn test_pcm_spectrum_at_offset() {
        let mut session = AnalysisSession::default();
        let mut samples = vec![0.0; 4096];
        // Silence, then a 3 kHz tone from frame 4096
        samples.extend(tone(3000.0, 48000, 4096));

        let info = session.load_pcm(&samples, 48000, 1).unwrap();
        assert_eq!(info.duration_ms, 170);
        assert_eq!(session.sample_count(), 8192);

        let quiet = session.spectrum(1024).unwrap();
        assert!(quiet.iter().all(|&m| m == 0.0));

        let loud = session.spectrum_at(4096, 1024).unwrap();
        assert_eq!(loud.len(), 512);
        assert!((peak_bin(loud) as i64 - 64).abs() <= 1);

        let analyzer = session.analyzer().unwrap();
        assert_eq!(analyzer.config().sample_rate, 48000.0);
        assert!((analyzer.bin_frequency_hz(64) - 3000.0).abs() < 1e-9);
    }

    #[test]
    fn test_stereo_is_mixed_down() {
        let mut session = AnalysisSession::default();
        let left = tone(1000.0, 8000, 512);
        let interleaved: Vec<f32> = left.iter().flat_map(|&l| [l, 0.0]).collect();

        session.load_pcm(&interleaved, 8000, 2).unwrap();
        assert_eq!(session.channels(), 2);
        assert_eq!(session.sample_count(), 1024);

        let spectrum = session.spectrum(512).unwrap();
        assert_eq!(peak_bin(spectrum), 64);
    }

    #[test]
    fn test_offset_out_of_range() {
        let mut session = AnalysisSession::default();
        session.load_pcm(&[0.1; 100], 8000, 1).unwrap();

        assert!(matches!(
            session.spectrum_at(100, 64),
            Err(SessionError::OffsetOutOfRange { offset: 100, frames: 100 })
        ));
    }

    #[test]
    fn test_tail_follows_policy() {
        let mut session = AnalysisSession::default();
        session.load_pcm(&[0.1; 100], 8000, 1).unwrap();
        assert!(session.spectrum_at(50, 64).unwrap().iter().all(|&m| m == 0.0));

        let mut strict = AnalysisSession::new(AnalyzerConfig {
            insufficient_samples: InsufficientSamplesPolicy::Reject,
            ..AnalyzerConfig::default()
        });
        strict.load_pcm(&[0.1; 100], 8000, 1).unwrap();
        assert!(matches!(
            strict.spectrum_at(50, 64),
            Err(SessionError::Spectrum(SpectrumError::InsufficientSamples { .. }))
        ));
    }

    #[test]
    fn test_invalid_size_keeps_analyzer() {
        let mut session = AnalysisSession::default();
        session.load_pcm(&[0.5; 2048], 8000, 1).unwrap();
        session.spectrum(256).unwrap();

        assert!(matches!(
            session.spectrum(300),
            Err(SessionError::Spectrum(SpectrumError::InvalidConfiguration { size: 300, .. }))
        ));
        assert_eq!(session.analyzer().unwrap().size(), 256);
        assert!(session.last_transform_duration() >= 0.0);
    }

    #[test]
    fn test_reload_updates_sample_rate() {
        let mut session = AnalysisSession::default();
        session.load_pcm(&[0.0; 1024], 8000, 1).unwrap();
        session.spectrum(512).unwrap();

        session.load_pcm(&[0.0; 1024], 16000, 1).unwrap();
        assert_eq!(session.analyzer().unwrap().config().sample_rate, 16000.0);
        assert_eq!(session.sample_rate(), 16000);
    }

    #[test]
    fn test_wav_load_and_analyze() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut bytes = Vec::new();
        {
            let mut writer = hound::WavWriter::new(std::io::Cursor::new(&mut bytes), spec).unwrap();
            for s in tone(2000.0, 16000, 2048) {
                writer.write_sample((s * 16_000.0) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }

        let mut session = AnalysisSession::default();
        let info = session.load_wav(&bytes).unwrap();
        assert_eq!(info.format, "WAV");
        assert_eq!(info.duration_ms, 128);

        // 2 kHz at 16 kHz with N=2048 is bin 256
        let spectrum = session.spectrum(2048).unwrap();
        assert!((peak_bin(spectrum) as i64 - 256).abs() <= 1);

        assert!(matches!(session.load_wav(b"RIFF"), Err(SessionError::Source(_))));
        // Failed load keeps the previous track
        assert_eq!(session.sample_rate(), 16000);
    }

    #[test]
    fn test_waveform_and_reset() {
        let mut session = AnalysisSession::default();
        session.load_pcm(&[0.5; 640], 8000, 1).unwrap();

        let points = session.waveform(10).unwrap();
        assert_eq!(points.len(), 10);
        assert!(points.iter().all(|p| (p.amplitude - 0.5).abs() < 1e-6));

        session.reset();
        assert!(!session.is_loaded());
        assert!(session.analyzer().is_none());
    }
}
