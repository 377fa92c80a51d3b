use std::collections::VecDeque;

/// Ring of the most recent PCM chunks, used to preload a newly opened
/// recognizer stream so speech straddling a stream boundary is not lost.
pub struct OverlapBuffer {
    buffer: VecDeque<Vec<u8>>,
    capacity: usize,
}

impl OverlapBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, chunk: Vec<u8>) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(chunk);
    }

    /// Buffered chunks in arrival order, oldest first.
    pub fn snapshot(&self) -> Vec<Vec<u8>> {
        self.buffer.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(tag: u8) -> Vec<u8> {
        vec![tag; 4]
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut ring = OverlapBuffer::new(3);
        for i in 0..10u8 {
            ring.push(chunk(i));
            assert!(ring.len() <= 3);
        }
    }

    #[test]
    fn snapshot_is_arrival_ordered_suffix() {
        let mut ring = OverlapBuffer::new(3);
        for i in 0..5u8 {
            ring.push(chunk(i));
        }
        let snap = ring.snapshot();
        assert_eq!(snap, vec![chunk(2), chunk(3), chunk(4)]);
    }

    #[test]
    fn snapshot_does_not_consume() {
        let mut ring = OverlapBuffer::new(4);
        ring.push(chunk(1));
        assert_eq!(ring.snapshot(), ring.snapshot());
        assert_eq!(ring.len(), 1);
    }
}
