//! Sample sources, buffering and streaming around the analyzer

pub mod buffer;
pub mod pool;
pub mod processor;
pub mod source;
pub mod waveform;

pub use buffer::{AudioConsumer, AudioProducer, AudioRingBuffer};
pub use pool::{BlockPool, PooledBlock};
pub use processor::StreamProcessor;
pub use source::{AudioInfo, SampleSource, SourceError};
pub use waveform::{WaveformPoint, WaveformSampler};
