//! Lock-free ring buffer for audio data
//!
//! Single-producer/single-consumer queue that carries mono samples from a
//! producer running at the host's block rate to the analysis side.

use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

/// Audio ring buffer, split into its two ends before use
pub struct AudioRingBuffer {
    producer: HeapProducer<f32>,
    consumer: HeapConsumer<f32>,
    capacity: usize,
}

impl AudioRingBuffer {
    /// Create new ring buffer with given capacity
    ///
    /// # Arguments
    /// * `capacity` - Buffer capacity in samples
    pub fn new(capacity: usize) -> Self {
        let rb = HeapRb::<f32>::new(capacity);
        let (producer, consumer) = rb.split();

        Self {
            producer,
            consumer,
            capacity,
        }
    }

    /// Split into producer and consumer ends
    pub fn split(self) -> (AudioProducer, AudioConsumer) {
        (
            AudioProducer {
                producer: self.producer,
                capacity: self.capacity,
            },
            AudioConsumer {
                consumer: self.consumer,
                capacity: self.capacity,
            },
        )
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Producer end of audio ring buffer (for writing)
pub struct AudioProducer {
    producer: HeapProducer<f32>,
    capacity: usize,
}

impl AudioProducer {
    /// Write samples to buffer
    ///
    /// # Returns
    /// Number of samples actually written (less than `samples.len()` when full)
    pub fn write(&mut self, samples: &[f32]) -> usize {
        self.producer.push_slice(samples)
    }

    /// Check if buffer has space for n samples
    pub fn has_space(&self, n: usize) -> bool {
        self.producer.free_len() >= n
    }

    pub fn free_len(&self) -> usize {
        self.producer.free_len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Consumer end of audio ring buffer (for reading)
pub struct AudioConsumer {
    consumer: HeapConsumer<f32>,
    capacity: usize,
}

impl AudioConsumer {
    /// Read samples from buffer
    ///
    /// # Returns
    /// Number of samples actually read (less than `buffer.len()` when short)
    pub fn read(&mut self, buffer: &mut [f32]) -> usize {
        self.consumer.pop_slice(buffer)
    }

    /// Drop up to `n` of the oldest samples, returning how many were dropped
    pub fn discard(&mut self, n: usize) -> usize {
        let mut dropped = 0;
        while dropped < n && self.consumer.pop().is_some() {
            dropped += 1;
        }
        dropped
    }

    /// Copy the oldest `buffer.len()` samples without consuming them
    ///
    /// Returns `false` (and leaves `buffer` untouched) if fewer are queued.
    pub fn peek(&self, buffer: &mut [f32]) -> bool {
        if self.consumer.len() < buffer.len() {
            return false;
        }

        let (head, tail) = self.consumer.as_slices();
        let from_head = head.len().min(buffer.len());
        buffer[..from_head].copy_from_slice(&head[..from_head]);
        let rest = buffer.len() - from_head;
        buffer[from_head..].copy_from_slice(&tail[..rest]);
        true
    }

    /// Drop everything queued
    pub fn clear(&mut self) -> usize {
        self.discard(self.consumer.len())
    }

    /// Check if buffer has n samples available
    pub fn has_data(&self, n: usize) -> bool {
        self.consumer.len() >= n
    }

    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_write_read() {
        let rb = AudioRingBuffer::new(1024);
        let (mut producer, mut consumer) = rb.split();

        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(producer.write(&data), 5);

        let mut output = vec![0.0; 5];
        assert_eq!(consumer.read(&mut output), 5);
        assert_eq!(output, data);
        assert!(consumer.is_empty());
    }

    #[test]
    fn test_ring_buffer_overflow() {
        let rb = AudioRingBuffer::new(10);
        let (mut producer, mut consumer) = rb.split();

        let written = producer.write(&[1.0; 20]);
        assert_eq!(written, 10);
        assert!(!producer.has_space(1));

        let mut output = vec![0.0; 20];
        assert_eq!(consumer.read(&mut output), written);
    }

    #[test]
    fn test_ring_buffer_underflow() {
        let rb = AudioRingBuffer::new(1024);
        let (_producer, mut consumer) = rb.split();

        let mut output = vec![0.0; 10];
        assert_eq!(consumer.read(&mut output), 0);
    }

    #[test]
    fn test_peek_across_wrap() {
        let (mut producer, mut consumer) = AudioRingBuffer::new(8).split();

        producer.write(&[0.0; 6]);
        assert_eq!(consumer.discard(6), 6);
        // Next writes wrap around the end of the storage
        producer.write(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        let mut window = [0.0; 4];
        assert!(consumer.peek(&mut window));
        assert_eq!(window, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(consumer.len(), 5);

        let mut too_long = [0.0; 6];
        assert!(!consumer.peek(&mut too_long));
    }

    #[test]
    fn test_clear() {
        let (mut producer, mut consumer) = AudioRingBuffer::new(16).split();
        producer.write(&[0.5; 12]);

        assert_eq!(consumer.clear(), 12);
        assert!(consumer.is_empty());
        assert!(!consumer.has_data(1));
        assert_eq!(producer.free_len(), 16);
    }
}
