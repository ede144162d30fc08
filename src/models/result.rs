use super::{BitMatrix, Point};
use std::fmt;

/// Result of a successful Aztec detection and rectification pass.
#[derive(Debug, Clone)]
pub struct AztecDetectorResult {
    /// The resampled, upright, one-bit-per-module matrix, ready for
    /// downstream Reed-Solomon-protected payload decoding.
    pub matrix: BitMatrix,
    /// The four outer corners of the symbol in the original image's pixel
    /// space, in `[nw, ne, sw, se]` order.
    pub points: [Point; 4],
    /// Whether this is a compact (no reference lines, 8-bit mode message)
    /// or full (reference lines, 16-bit mode message) Aztec symbol.
    pub compact: bool,
    /// Number of data codewords carried by the symbol, recovered from the
    /// mode message.
    pub num_data_words: usize,
    /// Number of concentric data layers, recovered from the mode message.
    pub num_layers: usize,
}

/// Error taxonomy for the detection pipeline. The detection core only ever
/// produces `NotFound`; `Format` and `Checksum` are reserved for a
/// downstream payload decoder operating on the rectified matrix this crate
/// produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AztecError {
    /// No barcode could be located and rectified in this image.
    NotFound,
    /// Reserved: malformed payload structure, never raised by detection.
    Format,
    /// Reserved: payload checksum mismatch, never raised by detection.
    Checksum,
}

impl fmt::Display for AztecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AztecError::NotFound => write!(f, "no Aztec barcode found in this image"),
            AztecError::Format => write!(f, "malformed Aztec payload"),
            AztecError::Checksum => write!(f, "Aztec payload checksum mismatch"),
        }
    }
}

impl std::error::Error for AztecError {}
