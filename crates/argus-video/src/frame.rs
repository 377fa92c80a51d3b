use std::sync::Arc;
use std::time::Instant;

/// Decoded BGR24 raster, row-major, as the detector expects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgrImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl BgrImage {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width as usize) * (height as usize) * 3);
        Self {
            width,
            height,
            data,
        }
    }

    /// Uniform fill, handy for tests and probes.
    pub fn filled(width: u32, height: u32, bgr: [u8; 3]) -> Self {
        let pixels = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            data.extend_from_slice(&bgr);
        }
        Self {
            width,
            height,
            data,
        }
    }
}

/// One video frame in flight through the pipeline. The index is assigned
/// at ingest in strict arrival order; frames replaced in the slot buffer
/// still consume their index.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub index: u64,
    pub image: Arc<BgrImage>,
    pub received_at: Instant,
}

impl VideoFrame {
    pub fn new(index: u64, image: BgrImage) -> Self {
        Self {
            index,
            image: Arc::new(image),
            received_at: Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_image_has_expected_size() {
        let img = BgrImage::filled(4, 2, [1, 2, 3]);
        assert_eq!(img.data.len(), 4 * 2 * 3);
        assert_eq!(&img.data[..3], &[1, 2, 3]);
    }
}
