//! Frame and unwind emission.
//!
//! Two disjoint strategies, selected by target OS:
//! - Windows: one opaque UNWIND_INFO record per frame, emitted whole in
//!   the node's trailing pass. Nothing interleaves with the data bytes.
//! - Unix: the frame blob is a stream of fixed-size CFI records. A
//!   pre-pass expands each node's frames into per-offset state (start
//!   set, end set, rebased record lists) so the driver can fire the
//!   right directives while walking the data bytes.
//!
//! A single frame-open flag enforces that `[start, end)` ranges never
//! overlap. At an offset where one frame ends exactly where the next
//! begins, the end directive must fire before the start directive;
//! [`FrameEngine::emit_at`] hard-codes that order.

use std::collections::{HashMap, HashSet};

use crate::error::{EmitError, EmitResult};
use crate::node::FrameInfo;
use crate::target::TargetOs;
use crate::writer::ObjectWriter;

/// Size of one CFI record in a Unix frame blob. The record's first
/// byte is the code offset relative to the frame start.
pub const CFI_RECORD_SIZE: usize = 8;

/// Per-node unwind state for one emission strategy.
#[derive(Debug)]
pub struct FrameEngine {
    os: TargetOs,
    cfi_starts: HashSet<usize>,
    cfi_ends: HashSet<usize>,
    cfi_records: HashMap<usize, Vec<[u8; CFI_RECORD_SIZE]>>,
    frame_open: bool,
}

impl FrameEngine {
    pub fn new(os: TargetOs) -> Self {
        Self {
            os,
            cfi_starts: HashSet::new(),
            cfi_ends: HashSet::new(),
            cfi_records: HashMap::new(),
            frame_open: false,
        }
    }

    /// Rebuild the engine from one node's frame infos.
    ///
    /// On Unix targets this expands every blob into per-offset records,
    /// rebasing each record's code offset by its frame start. Windows
    /// blobs stay opaque and nothing is indexed.
    pub fn build(&mut self, frames: &[FrameInfo]) -> EmitResult<()> {
        self.cfi_starts.clear();
        self.cfi_ends.clear();
        self.cfi_records.clear();
        self.frame_open = false;

        if self.os.uses_windows_unwind() {
            return Ok(());
        }

        for frame in frames {
            if frame.blob.len() % CFI_RECORD_SIZE != 0 {
                return Err(EmitError::MalformedCfiBlob {
                    len: frame.blob.len(),
                });
            }
            self.cfi_starts.insert(frame.start_offset);
            self.cfi_ends.insert(frame.end_offset);
            for chunk in frame.blob.chunks_exact(CFI_RECORD_SIZE) {
                let mut record = [0u8; CFI_RECORD_SIZE];
                record.copy_from_slice(chunk);
                let code_offset = frame.start_offset + usize::from(record[0]);
                self.cfi_records.entry(code_offset).or_default().push(record);
            }
        }
        Ok(())
    }

    /// Emit the CFI directives that apply at `offset`.
    ///
    /// Fixed order: close the ending frame, open the starting frame,
    /// then the records. No-op on Windows targets.
    pub fn emit_at<W: ObjectWriter>(&mut self, offset: usize, writer: &mut W) -> EmitResult<()> {
        if self.cfi_ends.contains(&offset) {
            if !self.frame_open {
                return Err(EmitError::FrameOverlap { offset });
            }
            writer.emit_cfi_end(offset);
            self.frame_open = false;
        }
        if self.cfi_starts.contains(&offset) {
            if self.frame_open {
                return Err(EmitError::FrameOverlap { offset });
            }
            writer.emit_cfi_start(offset);
            self.frame_open = true;
        }
        if let Some(records) = self.cfi_records.get(&offset) {
            if !self.frame_open {
                return Err(EmitError::FrameOverlap { offset });
            }
            for record in records {
                writer.emit_cfi_blob(offset, record);
            }
        }
        Ok(())
    }

    /// Emit the node's Windows unwind records. No-op on Unix targets,
    /// where the CFI stream was interleaved instead.
    pub fn emit_win_frames<W: ObjectWriter>(
        &self,
        node_name: &str,
        frames: &[FrameInfo],
        writer: &mut W,
    ) {
        if !self.os.uses_windows_unwind() {
            return;
        }
        for frame in frames {
            writer.emit_win_frame_info(
                node_name,
                frame.start_offset,
                frame.end_offset,
                &frame.blob,
                frame.personality.as_deref(),
                &frame.lsda,
            );
        }
    }
}
