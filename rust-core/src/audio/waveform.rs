//! Waveform downsampling for line and surface displays

/// Samples averaged per point at most
const MAX_POINT_SPAN: usize = 64;

/// One point of a downsampled waveform
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WaveformPoint {
    /// Normalized time position in [0, 1)
    pub position: f32,
    /// Mean absolute amplitude around this position
    pub amplitude: f32,
}

/// Reduces a block of samples to a fixed number of amplitude points
///
/// The point buffer is kept between calls and only reallocated when the
/// requested resolution changes.
#[derive(Debug, Default)]
pub struct WaveformSampler {
    points: Vec<WaveformPoint>,
}

impl WaveformSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Downsample `samples` to `resolution` points
    ///
    /// Point `i` averages |x| over up to 64 samples starting at
    /// `i * max(1, len / resolution)`; points past the end are silent.
    pub fn generate(&mut self, samples: &[f32], resolution: usize) -> &[WaveformPoint] {
        if self.points.len() != resolution {
            self.points.resize(resolution, WaveformPoint::default());
        }

        let samples_per_point = (samples.len() / resolution.max(1)).max(1);
        let span = samples_per_point.min(MAX_POINT_SPAN);

        for (i, point) in self.points.iter_mut().enumerate() {
            let start = i * samples_per_point;
            let end = (start + span).min(samples.len());

            let amplitude = if start < end {
                let chunk = &samples[start..end];
                chunk.iter().map(|s| s.abs()).sum::<f32>() / chunk.len() as f32
            } else {
                0.0
            };

            *point = WaveformPoint {
                position: i as f32 / resolution as f32,
                amplitude,
            };
        }

        &self.points
    }

    /// Points from the most recent call
    pub fn points(&self) -> &[WaveformPoint] {
        &self.points
    }
}
