//! Error types for object emission.
//!
//! Using thiserror for more idiomatic error handling. Nothing here is
//! retried or swallowed inside the emitter: every variant is terminal
//! for the current output file and propagates to the caller, which is
//! expected to discard the partial file.

use std::path::PathBuf;

use thiserror::Error;

use crate::node::RelocKind;

/// Main error type for object emission.
#[derive(Error, Debug)]
pub enum EmitError {
    /// The native container could not open the output file.
    #[error("failed to open object writer for {}", .path.display())]
    WriterInit { path: PathBuf },

    /// A relocation kind without a width/addressing entry was seen.
    #[error("unsupported relocation kind {kind:?} at offset {offset}")]
    UnsupportedRelocation { kind: RelocKind, offset: usize },

    /// A frame blob on a Unix target is not a whole number of CFI records.
    #[error("CFI blob length {len} is not a multiple of the record size")]
    MalformedCfiBlob { len: usize },

    /// A frame was opened while one is open, or closed while none is.
    #[error("frame directive overlap at offset {offset}")]
    FrameOverlap { offset: usize },

    /// Two nodes in the same output file share a name (debug builds only).
    #[error("duplicate node name: {name}")]
    DuplicateNodeName { name: String },
}

/// Result type alias for emission operations.
pub type EmitResult<T> = Result<T, EmitError>;
