//! Directive capture backend.
//!
//! [`RecordingWriter`] appends one typed [`Directive`] per container
//! call instead of encoding anything. The emitter's observable behavior
//! is exactly its directive stream, so tests assert against the
//! recorded sequence, and a dry run over a node list can be inspected
//! without touching the native library.

use super::ObjectWriter;

/// One recorded container call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    SwitchSection {
        name: String,
    },
    Alignment {
        bytes: u32,
    },
    Blob {
        bytes: Vec<u8>,
    },
    Int {
        value: u64,
        size: u8,
    },
    SymbolDef {
        name: String,
    },
    SymbolRef {
        name: String,
        size: u8,
        pc_relative: bool,
        delta: i64,
    },
    WinFrameInfo {
        method: String,
        start: usize,
        end: usize,
        blob: Vec<u8>,
        personality: Option<String>,
        lsda: Vec<u8>,
    },
    CfiStart {
        offset: usize,
    },
    CfiEnd {
        offset: usize,
    },
    CfiBlob {
        offset: usize,
        record: Vec<u8>,
    },
    DebugFileInfo {
        files: Vec<String>,
    },
    DebugLoc {
        offset: usize,
        file_id: u32,
        line: u32,
        col: u32,
    },
    FlushDebugLocs {
        method: String,
        method_size: usize,
    },
}

/// Writer backend that records the directive stream.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    directives: Vec<Directive>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded directives, in emission order.
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Consume the recorder and return the stream.
    pub fn into_directives(self) -> Vec<Directive> {
        self.directives
    }

    /// Concatenation of all literal data bytes emitted so far.
    ///
    /// Bytes consumed by symbol references do not appear here; the
    /// container fills those slots itself.
    pub fn emitted_data(&self) -> Vec<u8> {
        let mut data = Vec::new();
        for directive in &self.directives {
            if let Directive::Blob { bytes } = directive {
                data.extend_from_slice(bytes);
            }
        }
        data
    }
}

impl ObjectWriter for RecordingWriter {
    fn switch_section(&mut self, name: &str) {
        self.directives.push(Directive::SwitchSection {
            name: name.to_owned(),
        });
    }

    fn emit_alignment(&mut self, bytes: u32) {
        self.directives.push(Directive::Alignment { bytes });
    }

    fn emit_blob(&mut self, bytes: &[u8]) {
        self.directives.push(Directive::Blob {
            bytes: bytes.to_vec(),
        });
    }

    fn emit_int(&mut self, value: u64, size: u8) {
        self.directives.push(Directive::Int { value, size });
    }

    fn emit_symbol_def(&mut self, name: &str) {
        self.directives.push(Directive::SymbolDef {
            name: name.to_owned(),
        });
    }

    fn emit_symbol_ref(&mut self, name: &str, size: u8, pc_relative: bool, delta: i64) {
        self.directives.push(Directive::SymbolRef {
            name: name.to_owned(),
            size,
            pc_relative,
            delta,
        });
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
        self.directives.push(Directive::WinFrameInfo {
            method: method.to_owned(),
            start,
            end,
            blob: blob.to_vec(),
            personality: personality.map(str::to_owned),
            lsda: lsda.to_vec(),
        });
    }

    fn emit_cfi_start(&mut self, offset: usize) {
        self.directives.push(Directive::CfiStart { offset });
    }

    fn emit_cfi_end(&mut self, offset: usize) {
        self.directives.push(Directive::CfiEnd { offset });
    }

    fn emit_cfi_blob(&mut self, offset: usize, record: &[u8]) {
        self.directives.push(Directive::CfiBlob {
            offset,
            record: record.to_vec(),
        });
    }

    fn emit_debug_file_info(&mut self, files: &[String]) {
        self.directives.push(Directive::DebugFileInfo {
            files: files.to_vec(),
        });
    }

    fn emit_debug_loc(&mut self, offset: usize, file_id: u32, line: u32, col: u32) {
        self.directives.push(Directive::DebugLoc {
            offset,
            file_id,
            line,
            col,
        });
    }

    fn flush_debug_locs(&mut self, method: &str, method_size: usize) {
        self.directives.push(Directive::FlushDebugLocs {
            method: method.to_owned(),
            method_size,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_call_order() {
        let mut writer = RecordingWriter::new();
        writer.switch_section("text");
        writer.emit_blob(&[0x90]);
        writer.emit_symbol_def("foo");

        assert_eq!(
            writer.directives(),
            &[
                Directive::SwitchSection {
                    name: "text".into()
                },
                Directive::Blob { bytes: vec![0x90] },
                Directive::SymbolDef { name: "foo".into() },
            ]
        );
    }

    #[test]
    fn emitted_data_skips_non_blob_directives() {
        let mut writer = RecordingWriter::new();
        writer.emit_blob(&[1, 2]);
        writer.emit_symbol_ref("bar", 4, true, 0);
        writer.emit_blob(&[3]);

        assert_eq!(writer.emitted_data(), vec![1, 2, 3]);
    }
}
