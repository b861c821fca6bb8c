//! Native container binding.
//!
//! Forwards every [`ObjectWriter`] call to the native emitter library
//! through its C ABI. The library owns all byte-level encoding; this
//! side owns exactly one opaque handle per output file.
//!
//! Compiled only with the `native-writer` feature. The feature does not
//! locate or link the library itself; the embedding build supplies it.

use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_void};
use std::path::Path;

use crate::error::{EmitError, EmitResult};

use super::ObjectWriter;

mod sys {
    use std::os::raw::{c_char, c_int, c_uchar, c_void};

    extern "C" {
        pub fn init_writer(path: *const c_char) -> *mut c_void;
        pub fn finish_writer(handle: *mut c_void);
        pub fn switch_section(handle: *mut c_void, name: *const c_char);
        pub fn emit_alignment(handle: *mut c_void, bytes: c_int);
        pub fn emit_blob(handle: *mut c_void, size: c_int, bytes: *const c_uchar);
        pub fn emit_int(handle: *mut c_void, value: u64, size: c_int);
        pub fn emit_symbol_def(handle: *mut c_void, name: *const c_char);
        pub fn emit_symbol_ref(
            handle: *mut c_void,
            name: *const c_char,
            size: c_int,
            pc_relative: c_int,
            delta: i64,
        );
        pub fn emit_win_frame_info(
            handle: *mut c_void,
            method: *const c_char,
            start: c_int,
            end: c_int,
            blob_size: c_int,
            blob: *const c_uchar,
            personality: *const c_char,
            lsda_size: c_int,
            lsda: *const c_uchar,
        );
        pub fn emit_cfi_start(handle: *mut c_void, offset: c_int);
        pub fn emit_cfi_end(handle: *mut c_void, offset: c_int);
        pub fn emit_cfi_blob(handle: *mut c_void, offset: c_int, record: *const c_uchar);
        pub fn emit_debug_file_info(
            handle: *mut c_void,
            count: c_int,
            names: *const *const c_char,
        );
        pub fn emit_debug_loc(
            handle: *mut c_void,
            offset: c_int,
            file_id: c_int,
            line: c_int,
            col: c_int,
        );
        pub fn flush_debug_locs(
            handle: *mut c_void,
            method: *const c_char,
            method_size: c_int,
        );
    }
}

// Mangled names and section names never carry interior NULs.
fn c_str(s: &str) -> CString {
    CString::new(s).expect("interior NUL in container string")
}

/// Owned handle to the native container writer.
///
/// The handle is held exclusively for the lifetime of one output file
/// and released exactly once on every exit path: [`NativeWriter::finish`]
/// consumes the writer on the normal path, and `Drop` closes the handle
/// when the emitter bails out early. The pointer is nulled at the first
/// close, so a double close cannot happen.
pub struct NativeWriter {
    handle: *mut c_void,
}

impl NativeWriter {
    /// Open the container for `path`.
    pub fn create(path: &Path) -> EmitResult<Self> {
        let c_path = c_str(&path.to_string_lossy());
        let handle = unsafe { sys::init_writer(c_path.as_ptr()) };
        if handle.is_null() {
            return Err(EmitError::WriterInit {
                path: path.to_path_buf(),
            });
        }
        Ok(Self { handle })
    }

    /// Finalize the output file and release the handle.
    pub fn finish(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if !self.handle.is_null() {
            unsafe { sys::finish_writer(self.handle) };
            self.handle = std::ptr::null_mut();
        }
    }
}

impl Drop for NativeWriter {
    fn drop(&mut self) {
        self.close();
    }
}

impl ObjectWriter for NativeWriter {
    fn switch_section(&mut self, name: &str) {
        let name = c_str(name);
        unsafe { sys::switch_section(self.handle, name.as_ptr()) };
    }

    fn emit_alignment(&mut self, bytes: u32) {
        unsafe { sys::emit_alignment(self.handle, bytes as c_int) };
    }

    fn emit_blob(&mut self, bytes: &[u8]) {
        unsafe { sys::emit_blob(self.handle, bytes.len() as c_int, bytes.as_ptr()) };
    }

    fn emit_int(&mut self, value: u64, size: u8) {
        unsafe { sys::emit_int(self.handle, value, c_int::from(size)) };
    }

    fn emit_symbol_def(&mut self, name: &str) {
        let name = c_str(name);
        unsafe { sys::emit_symbol_def(self.handle, name.as_ptr()) };
    }

    fn emit_symbol_ref(&mut self, name: &str, size: u8, pc_relative: bool, delta: i64) {
        let name = c_str(name);
        unsafe {
            sys::emit_symbol_ref(
                self.handle,
                name.as_ptr(),
                c_int::from(size),
                c_int::from(pc_relative),
                delta,
            )
        };
    }

    fn emit_win_frame_info(
        &mut self,
        method: &str,
        start: usize,
        end: usize,
        blob: &[u8],
        personality: Option<&str>,
        lsda: &[u8],
    ) {
        let method = c_str(method);
        let personality = personality.map(c_str);
        unsafe {
            sys::emit_win_frame_info(
                self.handle,
                method.as_ptr(),
                start as c_int,
                end as c_int,
                blob.len() as c_int,
                blob.as_ptr(),
                personality
                    .as_ref()
                    .map_or(std::ptr::null(), |p| p.as_ptr()),
                lsda.len() as c_int,
                lsda.as_ptr(),
            )
        };
    }

    fn emit_cfi_start(&mut self, offset: usize) {
        unsafe { sys::emit_cfi_start(self.handle, offset as c_int) };
    }

    fn emit_cfi_end(&mut self, offset: usize) {
        unsafe { sys::emit_cfi_end(self.handle, offset as c_int) };
    }

    fn emit_cfi_blob(&mut self, offset: usize, record: &[u8]) {
        unsafe { sys::emit_cfi_blob(self.handle, offset as c_int, record.as_ptr()) };
    }

    fn emit_debug_file_info(&mut self, files: &[String]) {
        let names: Vec<CString> = files.iter().map(|f| c_str(f)).collect();
        let ptrs: Vec<*const c_char> = names.iter().map(|n| n.as_ptr()).collect();
        unsafe { sys::emit_debug_file_info(self.handle, ptrs.len() as c_int, ptrs.as_ptr()) };
    }

    fn emit_debug_loc(&mut self, offset: usize, file_id: u32, line: u32, col: u32) {
        unsafe {
            sys::emit_debug_loc(
                self.handle,
                offset as c_int,
                file_id as c_int,
                line as c_int,
                col as c_int,
            )
        };
    }

    fn flush_debug_locs(&mut self, method: &str, method_size: usize) {
        let method = c_str(method);
        unsafe { sys::flush_debug_locs(self.handle, method.as_ptr(), method_size as c_int) };
    }
}
