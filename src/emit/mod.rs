//! Object emission components.
//!
//! The driver is a strict leaf over four independent per-node maps; it
//! consumes from them and forwards directives to the writer seam:
//!
//! - [`driver`] - node loop, section switching, byte-granular
//!   interleave protocol
//! - [`symbols`] - offset to emit-name index, platform mangling,
//!   alternate-name aliasing
//! - [`relocs`] - sorted relocation walk and the kind to slot-shape
//!   table
//! - [`frames`] - Windows unwind blobs vs the Unix CFI stream
//! - [`debug`] - global file table and per-node line records

pub mod debug;
pub mod driver;
pub mod frames;
pub mod relocs;
pub mod symbols;

pub use debug::DebugLineEngine;
pub use driver::emit_nodes;
pub use frames::{FrameEngine, CFI_RECORD_SIZE};
pub use relocs::{slot_shape, RelocationCursor};
pub use symbols::{platform_name, SymbolMap};

#[cfg(feature = "native-writer")]
pub use driver::emit_object;
