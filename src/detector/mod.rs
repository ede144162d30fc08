//! Aztec detection modules: the pixel-level analysis stages feeding the
//! orchestrating `AztecDetector`.
//!
//! - Connected-component labeling (bull's-eye ring candidates)
//! - Quadrilateral corner finding (ring boundary extreme pixels)
//! - GF(16) Reed-Solomon correction (mode message)
//! - The orchestrating state machine itself

/// Orchestrating state machine: bull's-eye to rectified matrix
pub mod aztec;
/// Two-pass union-find bicolor component labeling
pub mod connected_components;
/// Diagonal-sweep corner finder over a labeled ring component
pub mod quadrilateral;
/// GF(16) Reed-Solomon decoder for the mode message
pub mod reed_solomon;
