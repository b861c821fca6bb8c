//! Relocation cursor.
//!
//! A node's relocations arrive sorted strictly ascending by offset, so
//! the driver never searches: it keeps one index into the array and
//! compares the current byte offset against the next relocation's
//! start. On a hit the driver emits a symbol reference and skips the
//! slot's bytes entirely; the container consumes the slot width itself.

use crate::error::{EmitError, EmitResult};
use crate::node::{RelocKind, Relocation};

/// Slot width in bytes and pc-relative bit for a relocation kind.
///
/// The emitter is a minimum viable backend for two ABIs. A new kind is
/// supported by adding its entry here explicitly; there is no generic
/// fallback.
pub fn slot_shape(kind: RelocKind, offset: usize) -> EmitResult<(u8, bool)> {
    match kind {
        RelocKind::Abs64 => Ok((8, false)),
        RelocKind::Rel32 => Ok((4, true)),
        RelocKind::Abs32 | RelocKind::Branch26 => {
            Err(EmitError::UnsupportedRelocation { kind, offset })
        }
    }
}

/// Cursor over a node's sorted relocation array.
#[derive(Debug)]
pub struct RelocationCursor<'a> {
    relocs: &'a [Relocation],
    next: usize,
}

impl<'a> RelocationCursor<'a> {
    pub fn new(relocs: &'a [Relocation]) -> Self {
        Self { relocs, next: 0 }
    }

    /// The relocation whose slot begins at `offset`, if the cursor is
    /// parked on one. Advances past it on a match.
    pub fn take_at(&mut self, offset: usize) -> Option<&'a Relocation> {
        let reloc = self.relocs.get(self.next)?;
        if reloc.offset == offset {
            self.next += 1;
            Some(reloc)
        } else {
            None
        }
    }
}
