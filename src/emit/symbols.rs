//! Per-node symbol definition map.
//!
//! Indexes a node's defined symbols by byte offset so the driver can
//! emit every definition exactly when its byte is reached. Names pass
//! through the platform rule here, and a factory-supplied alternate
//! name is appended right after its primary at the same offset, which
//! is how one offset gets exported under two names.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::node::{NodeFactory, SymbolDef};
use crate::target::TargetOs;
use crate::writer::ObjectWriter;

/// Apply the platform symbol naming rule to a mangled name.
pub fn platform_name(os: TargetOs, mangled: &str) -> Cow<'_, str> {
    match os.symbol_prefix() {
        "" => Cow::Borrowed(mangled),
        prefix => Cow::Owned(format!("{prefix}{mangled}")),
    }
}

/// Offset-indexed symbol definitions for one node.
///
/// The name list at each offset preserves input order; the symbol at
/// offset 0, first in that order, is the node's canonical name.
#[derive(Debug, Default)]
pub struct SymbolMap {
    by_offset: HashMap<usize, Vec<String>>,
}

impl SymbolMap {
    /// Rebuild the map from a node's defined symbols.
    pub fn build<F: NodeFactory>(&mut self, symbols: &[SymbolDef], factory: &F) {
        self.by_offset.clear();
        let os = factory.target_os();
        for sym in symbols {
            let names = self.by_offset.entry(sym.offset).or_default();
            names.push(platform_name(os, &sym.name).into_owned());
            if let Some(alternate) = factory.alternate_name(&sym.name) {
                names.push(platform_name(os, alternate).into_owned());
            }
        }
    }

    /// Emit every definition registered at `offset`, in input order.
    pub fn emit_at<W: ObjectWriter>(&self, offset: usize, writer: &mut W) {
        if let Some(names) = self.by_offset.get(&offset) {
            for name in names {
                writer.emit_symbol_def(name);
            }
        }
    }
}
