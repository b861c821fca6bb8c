//! Container writer seam.
//!
//! The object-file container (COFF, ELF or Mach-O byte-level encoding)
//! lives in a native emitter library behind a narrow C ABI. This module
//! captures that ABI as the [`ObjectWriter`] trait so the emission core
//! stays testable and backend independent:
//! - [`recording::RecordingWriter`] captures the directive stream as
//!   typed values; the test suite asserts on it and dry runs can
//!   inspect it.
//! - [`native::NativeWriter`] (behind the `native-writer` feature)
//!   forwards every call to the native library and owns its opaque
//!   handle.
//!
//! The emitter is responsible for directive ordering and selection
//! only; everything below this trait is the container's business.

pub mod recording;

#[cfg(feature = "native-writer")]
pub mod native;

pub use recording::{Directive, RecordingWriter};

#[cfg(feature = "native-writer")]
pub use native::NativeWriter;

/// Sink for container directives, one method per C ABI entry point.
///
/// Directives apply at the container's current section cursor; there is
/// no backpatching. Calls are infallible by contract with the
/// container: after a successful open it buffers directives and reports
/// problems only at finalization.
pub trait ObjectWriter {
    /// Make `name` the current section.
    ///
    /// Idempotent; re-switching to the current section is used as a
    /// per-node boundary marker.
    fn switch_section(&mut self, name: &str);

    /// Align the section cursor to `bytes`.
    fn emit_alignment(&mut self, bytes: u32);

    /// Append literal bytes at the cursor.
    fn emit_blob(&mut self, bytes: &[u8]);

    /// Append a little-endian integer of `size` bytes (1, 2, 4 or 8).
    fn emit_int(&mut self, value: u64, size: u8);

    /// Define `name` at the cursor.
    fn emit_symbol_def(&mut self, name: &str);

    /// Emit a reference to `name`, consuming `size` bytes of cursor.
    /// The linker fills the slot; `delta` is the signed addend.
    fn emit_symbol_ref(&mut self, name: &str, size: u8, pc_relative: bool, delta: i64);

    /// Emit one Windows unwind record for `method` covering
    /// `[start, end)`, with its opaque UNWIND_INFO blob, optional
    /// personality routine symbol and LSDA blob.
    fn emit_win_frame_info(
        &mut self,
        method: &str,
        start: usize,
        end: usize,
        blob: &[u8],
        personality: Option<&str>,
        lsda: &[u8],
    );

    /// Open a CFI region at `offset`.
    fn emit_cfi_start(&mut self, offset: usize);

    /// Close the CFI region at `offset`.
    fn emit_cfi_end(&mut self, offset: usize);

    /// Emit one fixed-size CFI record applying at `offset`.
    fn emit_cfi_blob(&mut self, offset: usize, record: &[u8]);

    /// Publish the debug file table; file ids are the array indices.
    fn emit_debug_file_info(&mut self, files: &[String]);

    /// Record a source location for the byte at `offset`.
    fn emit_debug_loc(&mut self, offset: usize, file_id: u32, line: u32, col: u32);

    /// Close out the debug ranges of `method`, `method_size` bytes long.
    fn flush_debug_locs(&mut self, method: &str, method_size: usize);
}
