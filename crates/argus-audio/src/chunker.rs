/// Stateful splitter turning an arbitrary PCM byte stream into exact
/// fixed-size chunks.
///
/// Invariant: every returned chunk is exactly `chunk_bytes` long and the
/// retained residue is strictly smaller than `chunk_bytes` between calls,
/// so concatenating all chunks plus the residue reproduces the input.
pub struct PcmChunker {
    chunk_bytes: usize,
    buffer: Vec<u8>,
}

impl PcmChunker {
    pub fn new(sample_rate: u32, frame_ms: u32) -> Self {
        let chunk_bytes = (sample_rate as usize * frame_ms as usize / 1000) * 2;
        Self {
            chunk_bytes,
            buffer: Vec::with_capacity(chunk_bytes * 2),
        }
    }

    pub fn chunk_bytes(&self) -> usize {
        self.chunk_bytes
    }

    pub fn residue_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn push(&mut self, pcm: &[u8]) -> Vec<Vec<u8>> {
        self.buffer.extend_from_slice(pcm);

        let full = self.buffer.len() / self.chunk_bytes;
        let mut chunks = Vec::with_capacity(full);
        for _ in 0..full {
            let chunk: Vec<u8> = self.buffer.drain(..self.chunk_bytes).collect();
            chunks.push(chunk);
        }
        chunks
    }
}
