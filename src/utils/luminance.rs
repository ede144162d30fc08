/// Minimal luminance-to-bit-matrix ambient stack: a `LuminanceSource`
/// adapter trait plus a block-local-average `HybridBinarizer`. Binarization
/// strategy selection and fallback chains are an external collaborator's
/// concern, not this crate's — this is the smallest adapter that makes
/// `detect_from_luminance` real and testable.
use crate::models::BitMatrix;

/// A source of 8-bit luminance samples over a rectangular grid, the input
/// `HybridBinarizer` consumes to produce a `BitMatrix`.
pub trait LuminanceSource {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn luminance_at(&self, x: usize, y: usize) -> u8;
}

/// A `LuminanceSource` backed by an owned row-major byte buffer.
pub struct GrayscaleBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl GrayscaleBuffer {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Self {
        assert_eq!(data.len(), width * height);
        Self { width, height, data }
    }
}

impl LuminanceSource for GrayscaleBuffer {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn luminance_at(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}

const BLOCK_SIZE: usize = 8;

/// Block-local-average adaptive binarizer: each `BLOCK_SIZE x BLOCK_SIZE`
/// tile is thresholded against its own mean luminance, so shading gradients
/// across the image don't defeat a single global threshold.
pub struct HybridBinarizer;

impl HybridBinarizer {
    pub fn binarize(source: &dyn LuminanceSource) -> BitMatrix {
        let width = source.width();
        let height = source.height();
        let mut out = BitMatrix::new(width, height);
        if width == 0 || height == 0 {
            return out;
        }

        let blocks_x = width.div_ceil(BLOCK_SIZE);
        let blocks_y = height.div_ceil(BLOCK_SIZE);
        let mut block_means = vec![0u32; blocks_x * blocks_y];

        for by in 0..blocks_y {
            for bx in 0..blocks_x {
                let x0 = bx * BLOCK_SIZE;
                let y0 = by * BLOCK_SIZE;
                let x1 = (x0 + BLOCK_SIZE).min(width);
                let y1 = (y0 + BLOCK_SIZE).min(height);

                let mut sum = 0u32;
                let mut count = 0u32;
                for y in y0..y1 {
                    for x in x0..x1 {
                        sum += source.luminance_at(x, y) as u32;
                        count += 1;
                    }
                }
                block_means[by * blocks_x + bx] = if count > 0 { sum / count } else { 128 };
            }
        }

        for y in 0..height {
            for x in 0..width {
                let bx = x / BLOCK_SIZE;
                let by = y / BLOCK_SIZE;
                let threshold = block_means[by * blocks_x + bx];
                let is_black = (source.luminance_at(x, y) as u32) < threshold;
                out.set(x, y, is_black);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_bit_matrix_round_trips_through_the_binarizer() {
        let width = 5;
        let height = 4;
        let mut bits = BitMatrix::new(width, height);
        for (x, y) in [(2, 0), (4, 1), (1, 2), (0, 3)] {
            bits.set(x, y, true);
        }

        let mut data = vec![200u8; width * height];
        for y in 0..height {
            for x in 0..width {
                if bits.get(x, y) {
                    data[y * width + x] = 10;
                }
            }
        }

        let source = GrayscaleBuffer::new(width, height, data);
        let recovered = HybridBinarizer::binarize(&source);

        for y in 0..height {
            for x in 0..width {
                assert_eq!(recovered.get(x, y), bits.get(x, y), "mismatch at ({x},{y})");
            }
        }
    }

    #[test]
    fn uniform_image_has_no_black_pixels() {
        let source = GrayscaleBuffer::new(4, 4, vec![128u8; 16]);
        let out = HybridBinarizer::binarize(&source);
        for y in 0..4 {
            for x in 0..4 {
                assert!(!out.get(x, y));
            }
        }
    }
}
