//! Streaming spectrum processor
//!
//! Drains a ring-buffer consumer in analysis-sized windows and hands out
//! each spectrum as an owned block, so callers can keep a history (e.g. a
//! spectrogram) while the analyzer keeps reusing its own output buffer.

use super::buffer::AudioConsumer;
use super::pool::{BlockPool, PooledBlock, DEFAULT_INITIAL_BLOCKS};
use crate::spectrum::{SpectrumAnalyzer, SpectrumError};

/// Pulls frames from a ring buffer and analyzes them
pub struct StreamProcessor {
    consumer: AudioConsumer,
    analyzer: SpectrumAnalyzer,
    /// Input window, reused between frames
    frame: Vec<f32>,
    /// Source of output blocks
    pool: BlockPool,
    /// Advance asked for by the caller, re-clamped on every resize
    requested_hop: usize,
    /// Samples to advance between frames
    hop: usize,
    frames_processed: u64,
}

impl StreamProcessor {
    /// Create a processor
    ///
    /// # Arguments
    /// * `consumer` - Ring buffer end to read from
    /// * `analyzer` - Analyzer to run on each window
    /// * `hop` - Advance between frames, clamped to [1, analyzer size]
    pub fn new(consumer: AudioConsumer, analyzer: SpectrumAnalyzer, hop: usize) -> Self {
        let size = analyzer.size();
        let requested_hop = hop;
        let hop = requested_hop.clamp(1, size);
        if size > consumer.capacity() {
            log::warn!(
                "Ring buffer capacity {} is smaller than the N={} analysis window; no frame will ever be produced",
                consumer.capacity(),
                size
            );
        }

        Self {
            consumer,
            frame: vec![0.0; size],
            pool: BlockPool::new(analyzer.num_bins(), DEFAULT_INITIAL_BLOCKS),
            analyzer,
            requested_hop,
            hop,
            frames_processed: 0,
        }
    }

    /// Analyze the next window if enough samples are queued
    ///
    /// # Returns
    /// `Ok(None)` while fewer than N samples are buffered, otherwise a copy of
    /// the spectrum in a pooled block. The buffer then advances by `hop`.
    pub fn next_frame(&mut self) -> Result<Option<PooledBlock>, SpectrumError> {
        if !self.consumer.peek(&mut self.frame) {
            return Ok(None);
        }

        let spectrum = self.analyzer.analyze(&self.frame)?;
        let mut block = self.pool.acquire();
        block.copy_from_slice(spectrum);

        self.consumer.discard(self.hop);
        self.frames_processed += 1;

        Ok(Some(block))
    }

    /// Analyze every complete window currently queued
    pub fn drain(&mut self) -> Result<Vec<PooledBlock>, SpectrumError> {
        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Change the analysis size; queued samples are kept
    ///
    /// The hop passed to [`StreamProcessor::new`] is clamped against the new
    /// size, so shrinking and then growing restores it.
    pub fn configure(&mut self, size: usize) -> Result<(), SpectrumError> {
        if size == self.analyzer.size() {
            return Ok(());
        }

        self.analyzer.configure(size)?;
        self.frame = vec![0.0; size];
        self.pool = BlockPool::new(self.analyzer.num_bins(), DEFAULT_INITIAL_BLOCKS);
        self.hop = self.requested_hop.clamp(1, size);
        Ok(())
    }

    pub fn analyzer(&self) -> &SpectrumAnalyzer {
        &self.analyzer
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Samples waiting in the ring buffer
    pub fn pending(&self) -> usize {
        self.consumer.len()
    }
}
