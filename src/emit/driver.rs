//! Top-level emission driver.
//!
//! Walks the dependency nodes in caller order and forwards container
//! directives through the [`ObjectWriter`] seam. The per-node loop is
//! byte granular rather than a block copy: symbol definitions, CFI
//! directives and line records must land at exact byte offsets, and
//! the container only accepts directives at its current cursor.
//!
//! Per node the driver: switches section when it changes, emits the
//! alignment, rebuilds the four per-node maps (symbols, frames, debug
//! lines, relocation cursor), then walks byte offsets `0..=N`. At each
//! offset it emits symbol definitions, frame directives and the line
//! record before deciding whether the offset starts a relocation slot
//! (emit a symbol reference and jump the cursor past the slot) or is a
//! literal byte. Offset `N` exists so end labels and closing CFI
//! directives land after the last byte. A trailing pass emits Windows
//! unwind records, flushes the node's line records and re-switches the
//! current section as a boundary marker.

#[cfg(debug_assertions)]
use std::collections::HashSet;
#[cfg(feature = "native-writer")]
use std::path::Path;

use log::{debug, trace};

use crate::emit::debug::DebugLineEngine;
use crate::emit::frames::FrameEngine;
use crate::emit::relocs::{slot_shape, RelocationCursor};
use crate::emit::symbols::{platform_name, SymbolMap};
use crate::error::EmitResult;
use crate::node::{NodeFactory, ObjectNode};
use crate::writer::ObjectWriter;

#[cfg(feature = "native-writer")]
use crate::writer::NativeWriter;

/// Emit `nodes`, in order, into `writer`.
///
/// The writer is left open so the caller controls finalization. All
/// per-file state (the debug file table, the duplicate-name guard) is
/// created here and dropped on return.
pub fn emit_nodes<W, N, F>(writer: &mut W, nodes: &[N], factory: &F) -> EmitResult<()>
where
    W: ObjectWriter,
    N: ObjectNode,
    F: NodeFactory,
{
    Emission::new(writer, factory).run(nodes, factory)
}

/// Produce the object file at `path` from `nodes`.
///
/// Opens the native container writer, emits every node and finalizes
/// the file. The handle is released even when emission fails; the
/// partial file left on disk is the caller's to delete.
#[cfg(feature = "native-writer")]
pub fn emit_object<N, F>(path: &Path, nodes: &[N], factory: &F) -> EmitResult<()>
where
    N: ObjectNode,
    F: NodeFactory,
{
    let mut writer = NativeWriter::create(path)?;
    emit_nodes(&mut writer, nodes, factory)?;
    writer.finish();
    Ok(())
}

/// Per-file emission state.
struct Emission<'w, W> {
    writer: &'w mut W,
    current_section: Option<String>,
    symbols: SymbolMap,
    frames: FrameEngine,
    debug_lines: DebugLineEngine,
    #[cfg(debug_assertions)]
    seen_names: HashSet<String>,
}

impl<'w, W: ObjectWriter> Emission<'w, W> {
    fn new<F: NodeFactory>(writer: &'w mut W, factory: &F) -> Self {
        let os = factory.target_os();
        Self {
            writer,
            current_section: None,
            symbols: SymbolMap::default(),
            frames: FrameEngine::new(os),
            debug_lines: DebugLineEngine::new(os),
            #[cfg(debug_assertions)]
            seen_names: HashSet::new(),
        }
    }

    fn run<N: ObjectNode, F: NodeFactory>(
        &mut self,
        nodes: &[N],
        factory: &F,
    ) -> EmitResult<()> {
        // Skipped nodes never reach the loop below; their filenames
        // must not leak into the table either.
        self.debug_lines
            .build_file_table(nodes.iter().filter(|n| !n.should_skip()), self.writer);

        for node in nodes {
            if node.should_skip() {
                trace!("skipping node {}", node.name());
                continue;
            }
            self.emit_node(node, factory)?;
        }
        Ok(())
    }

    fn emit_node<N: ObjectNode, F: NodeFactory>(
        &mut self,
        node: &N,
        factory: &F,
    ) -> EmitResult<()> {
        self.check_duplicate_name(node.name())?;

        let data = node.data();
        let len = data.len();
        debug!(
            "emitting node {} ({} bytes, {} relocs) into {}",
            node.name(),
            len,
            node.relocations().len(),
            node.section()
        );

        if self.current_section.as_deref() != Some(node.section()) {
            self.writer.switch_section(node.section());
            self.current_section = Some(node.section().to_owned());
        }
        self.writer.emit_alignment(node.alignment());

        self.symbols.build(node.defined_symbols(), factory);
        self.frames.build(node.frame_infos())?;
        self.debug_lines.build_node_map(node.debug_locs());

        let os = factory.target_os();
        let mut relocs = RelocationCursor::new(node.relocations());
        let mut offset = 0usize;
        loop {
            self.symbols.emit_at(offset, self.writer);
            self.frames.emit_at(offset, self.writer)?;
            self.debug_lines.emit_at(offset, self.writer);

            if offset == len {
                break;
            }

            if let Some(reloc) = relocs.take_at(offset) {
                let (width, pc_relative) = slot_shape(reloc.kind, reloc.offset)?;
                trace!(
                    "reloc at {offset}: {:?} against {} delta {}",
                    reloc.kind,
                    reloc.target,
                    reloc.delta
                );
                self.writer.emit_symbol_ref(
                    &platform_name(os, &reloc.target),
                    width,
                    pc_relative,
                    reloc.delta,
                );
                // The container consumes the whole slot; the data bytes
                // under it carry no value and are never emitted.
                offset += usize::from(width);
            } else {
                self.writer.emit_blob(&data[offset..offset + 1]);
                offset += 1;
            }
        }

        self.frames
            .emit_win_frames(node.name(), node.frame_infos(), self.writer);
        self.debug_lines.flush_node(node.name(), len, self.writer);

        // The container treats a repeated switch to the current section
        // as an idempotent node boundary marker.
        if let Some(section) = &self.current_section {
            self.writer.switch_section(section);
        }
        Ok(())
    }

    #[cfg(debug_assertions)]
    fn check_duplicate_name(&mut self, name: &str) -> EmitResult<()> {
        use crate::error::EmitError;

        if !self.seen_names.insert(name.to_owned()) {
            return Err(EmitError::DuplicateNodeName {
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    #[cfg(not(debug_assertions))]
    fn check_duplicate_name(&mut self, _name: &str) -> EmitResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Relocation, RelocKind, SymbolDef};
    use crate::target::TargetOs;
    use crate::writer::{Directive, RecordingWriter};

    struct Node {
        section: &'static str,
        data: Vec<u8>,
        symbols: Vec<SymbolDef>,
        relocations: Vec<Relocation>,
        skip: bool,
    }

    impl Node {
        fn text(name: &str, data: Vec<u8>) -> Self {
            Self {
                section: "text",
                data,
                symbols: vec![SymbolDef::new(name, 0)],
                relocations: Vec::new(),
                skip: false,
            }
        }
    }

    impl ObjectNode for Node {
        fn section(&self) -> &str {
            self.section
        }
        fn alignment(&self) -> u32 {
            1
        }
        fn data(&self) -> &[u8] {
            &self.data
        }
        fn defined_symbols(&self) -> &[SymbolDef] {
            &self.symbols
        }
        fn relocations(&self) -> &[Relocation] {
            &self.relocations
        }
        fn name(&self) -> &str {
            &self.symbols[0].name
        }
        fn should_skip(&self) -> bool {
            self.skip
        }
    }

    struct Factory(TargetOs);

    impl NodeFactory for Factory {
        fn target_os(&self) -> TargetOs {
            self.0
        }
        fn alternate_name(&self, _symbol: &str) -> Option<&str> {
            None
        }
    }

    #[test]
    fn section_switches_only_on_change() {
        let mut a = Node::text("a", vec![0x01]);
        let mut b = Node::text("b", vec![0x02]);
        let mut c = Node::text("c", vec![0x03]);
        a.section = "text";
        b.section = "text";
        c.section = "data";

        let mut writer = RecordingWriter::new();
        emit_nodes(&mut writer, &[a, b, c], &Factory(TargetOs::Linux)).unwrap();

        let switches: Vec<&str> = writer
            .directives()
            .iter()
            .filter_map(|d| match d {
                Directive::SwitchSection { name } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        // One real switch per section change plus one terminator per
        // node.
        assert_eq!(switches, ["text", "text", "text", "data", "data"]);
    }

    #[test]
    fn skipped_nodes_emit_nothing() {
        let mut skipped = Node::text("gone", vec![0xFF]);
        skipped.skip = true;
        let kept = Node::text("kept", vec![0x01]);

        let mut writer = RecordingWriter::new();
        emit_nodes(&mut writer, &[skipped, kept], &Factory(TargetOs::Linux)).unwrap();

        assert!(writer
            .directives()
            .iter()
            .all(|d| !matches!(d, Directive::SymbolDef { name } if name == "gone")));
        assert_eq!(writer.emitted_data(), vec![0x01]);
    }

    #[test]
    fn relocation_slot_bytes_are_skipped() {
        let mut node = Node::text("f", vec![0xAA, 1, 2, 3, 4, 0xBB]);
        node.relocations = vec![Relocation {
            offset: 1,
            kind: RelocKind::Rel32,
            target: "callee".into(),
            delta: -4,
        }];

        let mut writer = RecordingWriter::new();
        emit_nodes(&mut writer, &[node], &Factory(TargetOs::Linux)).unwrap();

        assert_eq!(writer.emitted_data(), vec![0xAA, 0xBB]);
        assert!(writer.directives().contains(&Directive::SymbolRef {
            name: "callee".into(),
            size: 4,
            pc_relative: true,
            delta: -4,
        }));
    }

    #[test]
    fn unsupported_relocation_kind_aborts() {
        let mut node = Node::text("f", vec![0; 8]);
        node.relocations = vec![Relocation {
            offset: 0,
            kind: RelocKind::Abs32,
            target: "t".into(),
            delta: 0,
        }];

        let mut writer = RecordingWriter::new();
        let err = emit_nodes(&mut writer, &[node], &Factory(TargetOs::Linux)).unwrap_err();
        assert!(matches!(
            err,
            crate::error::EmitError::UnsupportedRelocation { offset: 0, .. }
        ));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn duplicate_node_names_abort_in_debug_builds() {
        let first = Node::text("twin", vec![0x01]);
        let second = Node::text("twin", vec![0x02]);

        let mut writer = RecordingWriter::new();
        let err = emit_nodes(&mut writer, &[first, second], &Factory(TargetOs::Linux))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::EmitError::DuplicateNodeName { name } if name == "twin"
        ));
    }

    #[test]
    fn end_labels_follow_the_last_byte() {
        let mut node = Node::text("f", vec![0x90, 0x90]);
        node.symbols.push(SymbolDef::new("f_end", 2));

        let mut writer = RecordingWriter::new();
        emit_nodes(&mut writer, &[node], &Factory(TargetOs::Linux)).unwrap();

        let tail: Vec<&Directive> = writer.directives().iter().rev().take(2).collect();
        assert_eq!(
            tail[1],
            &Directive::SymbolDef {
                name: "f_end".into()
            }
        );
        assert_eq!(
            tail[0],
            &Directive::SwitchSection {
                name: "text".into()
            }
        );
    }
}
