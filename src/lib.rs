//! RustAztec - Aztec 2D barcode detection and geometric rectification
//!
//! Locates and geometrically normalizes an Aztec barcode within a binarized
//! (black/white) image: 4-connected component labeling, topological
//! bull's-eye detection, corner-finding, mode-message sampling with GF(16)
//! Reed-Solomon correction, iterative perspective-transform refinement
//! using reference grid lines, and canonical resampling into a one-bit-
//! per-module output matrix. Image binarization and Aztec payload decoding
//! from the rectified matrix are external collaborators.

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Debug helpers (env-driven)
pub(crate) mod debug;
/// Aztec detection modules (component labeling, quadrilateral finding,
/// GF(16) Reed-Solomon, the orchestrating detector)
pub mod detector;
/// Core data structures (BitMatrix, Point, Envelope, result/error types)
pub mod models;
/// Utility functions (perspective geometry, luminance/binarization)
pub mod utils;

pub use models::{AztecDetectorResult, AztecError, BitMatrix, Point, PointI};
pub use utils::luminance::{GrayscaleBuffer, HybridBinarizer, LuminanceSource};

/// Locate and rectify an Aztec barcode in a previously binarized image.
///
/// This is the crate's core entry point: single-threaded, strictly
/// sequential, one `BitMatrix` in, one `AztecDetectorResult` or
/// `AztecError::NotFound` out. Binarization strategy is the caller's
/// concern — see [`detect_from_luminance`] for a convenience path that
/// handles it via [`HybridBinarizer`].
pub fn detect(bit_matrix: &BitMatrix) -> Result<AztecDetectorResult, AztecError> {
    detector::aztec::detect(bit_matrix)
}

/// Binarize a luminance source with [`HybridBinarizer`] and detect.
pub fn detect_from_luminance(
    source: &dyn LuminanceSource,
) -> Result<AztecDetectorResult, AztecError> {
    let bit_matrix = HybridBinarizer::binarize(source);
    detect(&bit_matrix)
}

/// Detect across independent images in parallel. Each `BitMatrix` is
/// processed by its own sequential detector instance; no state is shared
/// across images, matching the concurrency model's single-threaded-per-
/// image requirement.
pub fn detect_many(bit_matrices: &[BitMatrix]) -> Vec<Result<AztecDetectorResult, AztecError>> {
    use rayon::prelude::*;
    bit_matrices.par_iter().map(detect).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_on_blank_matrix_is_not_found() {
        let matrix = BitMatrix::new(40, 40);
        assert!(matches!(detect(&matrix), Err(AztecError::NotFound)));
    }

    #[test]
    fn detect_many_processes_every_image_independently() {
        let matrices = vec![BitMatrix::new(20, 20), BitMatrix::new(30, 30)];
        let results = detect_many(&matrices);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| matches!(r, Err(AztecError::NotFound))));
    }

    #[test]
    fn detect_from_luminance_on_blank_source_is_not_found() {
        let source = GrayscaleBuffer::new(20, 20, vec![200u8; 400]);
        assert!(matches!(
            detect_from_luminance(&source),
            Err(AztecError::NotFound)
        ));
    }
}
