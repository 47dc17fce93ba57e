use thiserror::Error;

/// The generic Error type, which provides coverage for all errors this library can
/// potentially return.
///
/// Errors split into two categories with very different severities:
///
/// # Structural Errors
///
/// - [`Error::Empty`] - No instructions were provided
/// - [`Error::UnresolvedTarget`] - A jump instruction names an address no
///   instruction occupies
/// - [`Error::GraphError`] - An internal graph invariant was violated
///
/// Structural errors fail the decompilation of the affected script: continuing
/// with a dangling vertex reference would corrupt every later pass and the code
/// emitted from it.
///
/// # Soft Diagnostics
///
/// Inconsistent stack levels and declined classifications are *not* errors.
/// They are logged (or silently ignored) and the pipeline continues; an
/// unclassified group is an acceptable, bounded degradation that downstream
/// consumers must tolerate.
///
/// # Examples
///
/// ```rust
/// use stackflow::{ControlFlowGraph, Error, FunctionTable};
///
/// match ControlFlowGraph::new(Vec::new(), FunctionTable::new()) {
///     Err(Error::Empty) => println!("nothing to decompile"),
///     Err(e) => println!("error: {}", e),
///     Ok(_) => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// Provided instruction sequence was empty.
    ///
    /// This error occurs when a control-flow graph is requested for a script
    /// with no instructions. There is nothing to build a graph from.
    #[error("Provided instruction sequence was empty")]
    Empty,

    /// A jump instruction targets an address that no instruction occupies.
    ///
    /// Every jump destination must resolve 1:1 to a vertex at construction
    /// time. A miss means the disassembly and the script disagree about the
    /// address space, and any graph built over it would be mis-linked.
    ///
    /// # Fields
    ///
    /// * `site` - Address of the jump instruction itself
    /// * `target` - The destination address that failed to resolve
    #[error("Jump at 0x{site:08x} targets unmapped address 0x{target:08x}")]
    UnresolvedTarget {
        /// Address of the jump instruction that could not be linked
        site: u32,
        /// The destination address with no owning vertex
        target: u32,
    },

    /// An address was looked up that no live vertex owns.
    ///
    /// After construction the address lookup table covers every instruction
    /// address; this error indicates a query outside the script's address
    /// space.
    #[error("No vertex owns address 0x{0:08x}")]
    UnknownAddress(u32),

    /// Graph-structure error.
    ///
    /// Violation of an internal graph invariant, such as adding an edge to a
    /// vertex that does not exist or a group partition that no longer covers
    /// the instruction sequence.
    #[error("{0}")]
    GraphError(String),
}
