//! Debug line emission.
//!
//! Runs in two phases. Phase 1, once per output file and before any
//! node: walk every node the driver will emit, assign each distinct
//! filename a 0-based id in first-seen order and publish the table to
//! the container. Phase 2, per node: index the node's records by byte
//! offset, emit each one as the driver's cursor reaches it, and flush
//! with the node's total size afterwards.
//!
//! Debug records are only produced for Windows targets for now; the
//! engine stays inert elsewhere and the file table remains empty.
//! TODO: DWARF line emission for the ELF/Mach-O containers.

use std::collections::HashMap;

use indexmap::IndexSet;

use crate::node::{DebugLocInfo, ObjectNode};
use crate::target::TargetOs;
use crate::writer::ObjectWriter;

/// Global filename table plus per-node line records.
#[derive(Debug)]
pub struct DebugLineEngine {
    os: TargetOs,
    files: IndexSet<String>,
    by_offset: HashMap<usize, DebugLocInfo>,
    emitted_any: bool,
}

impl DebugLineEngine {
    pub fn new(os: TargetOs) -> Self {
        Self {
            os,
            files: IndexSet::new(),
            by_offset: HashMap::new(),
            emitted_any: false,
        }
    }

    fn enabled(&self) -> bool {
        matches!(self.os, TargetOs::Windows)
    }

    /// Phase 1: assign file ids across the nodes that will be emitted
    /// and publish the table if any file was seen.
    ///
    /// The driver hands over only non-skipped nodes; a skipped node
    /// contributes no filenames and cannot be the reason the table is
    /// published.
    pub fn build_file_table<'n, N, I, W>(&mut self, nodes: I, writer: &mut W)
    where
        N: ObjectNode + 'n,
        I: IntoIterator<Item = &'n N>,
        W: ObjectWriter,
    {
        if !self.enabled() {
            return;
        }
        for node in nodes {
            for loc in node.debug_locs() {
                if !self.files.contains(&loc.file_name) {
                    self.files.insert(loc.file_name.clone());
                }
            }
        }
        if !self.files.is_empty() {
            let names: Vec<String> = self.files.iter().cloned().collect();
            writer.emit_debug_file_info(&names);
        }
    }

    /// Phase 2: rebuild the per-node offset index.
    pub fn build_node_map(&mut self, locs: &[DebugLocInfo]) {
        self.by_offset.clear();
        self.emitted_any = false;
        if !self.enabled() {
            return;
        }
        for loc in locs {
            self.by_offset.insert(loc.native_offset, loc.clone());
        }
    }

    /// Emit the line record at `offset`, if the node has one there.
    pub fn emit_at<W: ObjectWriter>(&mut self, offset: usize, writer: &mut W) {
        let Some(loc) = self.by_offset.get(&offset) else {
            return;
        };
        // The phase 1 pre-pass saw every filename the nodes carry.
        let Some(file_id) = self.files.get_index_of(&loc.file_name) else {
            debug_assert!(false, "file {} missing from table", loc.file_name);
            return;
        };
        writer.emit_debug_loc(offset, file_id as u32, loc.line_number, loc.col_number);
        self.emitted_any = true;
    }

    /// Flush the node's line records, recording its total size. Emits
    /// nothing when the node produced no line records.
    pub fn flush_node<W: ObjectWriter>(
        &mut self,
        node_name: &str,
        node_size: usize,
        writer: &mut W,
    ) {
        if self.emitted_any {
            writer.flush_debug_locs(node_name, node_size);
            self.emitted_any = false;
        }
        self.by_offset.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Relocation, SymbolDef};
    use crate::writer::{Directive, RecordingWriter};

    struct LocNode {
        locs: Vec<DebugLocInfo>,
    }

    impl ObjectNode for LocNode {
        fn section(&self) -> &str {
            "text"
        }
        fn alignment(&self) -> u32 {
            1
        }
        fn data(&self) -> &[u8] {
            &[]
        }
        fn defined_symbols(&self) -> &[SymbolDef] {
            &[]
        }
        fn relocations(&self) -> &[Relocation] {
            &[]
        }
        fn debug_locs(&self) -> &[DebugLocInfo] {
            &self.locs
        }
        fn name(&self) -> &str {
            "node"
        }
    }

    fn loc(offset: usize, file: &str, line: u32) -> DebugLocInfo {
        DebugLocInfo {
            native_offset: offset,
            file_name: file.into(),
            line_number: line,
            col_number: 1,
        }
    }

    #[test]
    fn file_ids_follow_first_seen_order_across_nodes() {
        let nodes = [
            LocNode {
                locs: vec![loc(0, "b.c", 1), loc(1, "a.c", 2)],
            },
            LocNode {
                locs: vec![loc(0, "c.c", 3), loc(1, "b.c", 4)],
            },
        ];

        let mut engine = DebugLineEngine::new(TargetOs::Windows);
        let mut writer = RecordingWriter::new();
        engine.build_file_table(&nodes, &mut writer);

        assert_eq!(
            writer.directives(),
            &[Directive::DebugFileInfo {
                files: vec!["b.c".into(), "a.c".into(), "c.c".into()],
            }]
        );

        engine.build_node_map(&nodes[1].locs);
        engine.emit_at(0, &mut writer);
        engine.emit_at(1, &mut writer);
        assert_eq!(
            &writer.directives()[1..],
            &[
                Directive::DebugLoc {
                    offset: 0,
                    file_id: 2,
                    line: 3,
                    col: 1,
                },
                Directive::DebugLoc {
                    offset: 1,
                    file_id: 0,
                    line: 4,
                    col: 1,
                },
            ]
        );
    }

    #[test]
    fn empty_table_is_not_published() {
        let nodes: [LocNode; 1] = [LocNode { locs: Vec::new() }];
        let mut engine = DebugLineEngine::new(TargetOs::Windows);
        let mut writer = RecordingWriter::new();
        engine.build_file_table(&nodes, &mut writer);
        assert!(writer.directives().is_empty());
    }

    #[test]
    fn non_windows_targets_stay_inert() {
        let nodes = [LocNode {
            locs: vec![loc(0, "a.c", 1)],
        }];

        for os in [TargetOs::Linux, TargetOs::MacOs] {
            let mut engine = DebugLineEngine::new(os);
            let mut writer = RecordingWriter::new();
            engine.build_file_table(&nodes, &mut writer);
            engine.build_node_map(&nodes[0].locs);
            engine.emit_at(0, &mut writer);
            engine.flush_node("node", 0, &mut writer);
            assert!(writer.directives().is_empty());
        }
    }

    #[test]
    fn flush_fires_only_after_a_record() {
        let nodes = [LocNode {
            locs: vec![loc(2, "a.c", 7)],
        }];

        let mut engine = DebugLineEngine::new(TargetOs::Windows);
        let mut writer = RecordingWriter::new();
        engine.build_file_table(&nodes, &mut writer);

        // A node whose offsets are never reached emits no flush.
        engine.build_node_map(&nodes[0].locs);
        engine.flush_node("first", 4, &mut writer);
        assert_eq!(writer.directives().len(), 1);

        engine.build_node_map(&nodes[0].locs);
        engine.emit_at(2, &mut writer);
        engine.flush_node("second", 4, &mut writer);
        assert_eq!(
            writer.directives().last(),
            Some(&Directive::FlushDebugLocs {
                method: "second".into(),
                method_size: 4,
            })
        );
    }
}
