//! objemit - native object-file emission for AOT compiled code.
//!
//! Serializes the output of an ahead-of-time compiler's dependency
//! graph walk into a native linkable object file (COFF on Windows,
//! ELF/Mach-O on Unix/OSX). Each node carries raw bytes, alignment,
//! symbol definitions at byte offsets, relocations, unwind information
//! and optional source-line records; the emitter interleaves all of
//! them at the correct offsets and forwards directives to the
//! container library that encodes the file format.
//!
//! # Primary Usage
//!
//! ```ignore
//! use objemit::{emit_object, TargetOs};
//!
//! // Nodes implement objemit::ObjectNode, the factory implements
//! // objemit::NodeFactory (target OS, alternate symbol names).
//! emit_object(path.as_ref(), &nodes, &factory)?;
//! ```
//!
//! Backends other than the native container plug in through the
//! [`ObjectWriter`] trait and [`emit_nodes`].
//!
//! # Architecture
//!
//! - [`emit`] - the driver loop and the four per-node maps
//! - [`writer`] - the container seam and its backends
//! - [`node`] - the collaborator model the compiler implements
//! - [`target`] - target OS dispatch
//! - [`error`] - emission errors

pub mod emit;
pub mod error;
pub mod node;
pub mod target;
pub mod writer;

pub use emit::emit_nodes;
pub use error::{EmitError, EmitResult};
pub use node::{
    DebugLocInfo, FrameInfo, NodeFactory, ObjectNode, RelocKind, Relocation, SymbolDef,
};
pub use target::TargetOs;
pub use writer::ObjectWriter;

#[cfg(feature = "native-writer")]
pub use emit::emit_object;
