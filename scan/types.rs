// ========================================================================================
//                             High-Level Data Contracts
// ========================================================================================

// This file is ONLY for types that are SHARED BETWEEN FILES, not types that only are used in one file.

use thiserror::Error;

/// Precondition violations, reported before any traversal starts.
///
/// An out-of-range node index is not represented here: it means the index
/// arithmetic disagrees with the tree size, which is a defect and panics.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanError {
    #[error("Input length {0} is not a power of two; the implicit tree needs 2^k leaves.")]
    NotPowerOfTwo(usize),

    #[error("Output buffer holds {found} elements, but the input has {expected}.")]
    LengthMismatch { expected: usize, found: usize },
}
