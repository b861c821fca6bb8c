//! Emission target selection.
//!
//! The emitter covers the {Windows, Linux, OSX} x {x86_64, arm64}
//! matrix, and only the operating system changes its behavior: it picks
//! the unwind strategy, gates debug-line output and decides the symbol
//! prefix rule. A single enum value is threaded through and consulted
//! at each decision point; there is no virtual dispatch.

/// Operating system of the emission target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    Windows,
    Linux,
    MacOs,
}

impl TargetOs {
    /// Whether the target uses the Windows unwind model (one opaque
    /// UNWIND_INFO record per frame) instead of a DWARF CFI stream.
    pub fn uses_windows_unwind(self) -> bool {
        matches!(self, TargetOs::Windows)
    }

    /// Prefix applied to every emitted symbol name.
    ///
    /// OSX follows the System V C calling convention and prepends an
    /// underscore; the other targets emit mangled names unchanged.
    pub fn symbol_prefix(self) -> &'static str {
        match self {
            TargetOs::MacOs => "_",
            TargetOs::Windows | TargetOs::Linux => "",
        }
    }
}
