//! Error types crossing the public API boundary.

use thiserror::Error;

/// Raised by an [`crate::arena::Allocator`] when it cannot satisfy an
/// allocation without growing first.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("arena has no space for another page")]
pub struct ArenaFull;

/// Errors returned by [`crate::tree::SignatureTree`] operations.
#[derive(Error, Debug)]
pub enum SigTreeError {
    /// A key longer than the diff encoding can address was passed to `add`.
    #[error("key of {len} bytes exceeds the maximum of {max} bytes")]
    KeyTooLong {
        /// Length of the rejected key, in bytes.
        len: usize,
        /// Maximum key length this tree can address.
        max: usize,
    },

    /// The arena could not satisfy an allocation even after `grow()`.
    #[error("arena exhausted: {0}")]
    ArenaExhausted(#[from] ArenaFull),

    /// `rebuild` was called with the destination tree equal to the source.
    #[error("cannot rebuild a tree into itself")]
    RebuildIntoSelf,
}
