//! # stackflow Prelude
//!
//! This module provides a convenient prelude for the most commonly used types
//! from the stackflow library. Import it to get quick access to the essential
//! types for control-flow recovery.
//!
//! # Example
//!
//! ```rust
//! use stackflow::prelude::*;
//!
//! let insts = ScriptBuilder::new().op("nop", 0).ret().build();
//! let mut cfg = ControlFlowGraph::new(insts, FunctionTable::new())?;
//! cfg.create_groups();
//! cfg.analyze();
//! # Ok::<(), Error>(())
//! ```

/// The main error type for all stackflow operations
pub use crate::Error;

/// The result type used throughout stackflow
pub use crate::Result;

/// The control-flow pipeline and its annotations
pub use crate::analysis::cfg::{CfgOptions, ControlFlowGraph, FlowEdgeKind, Group, GroupKind};

/// The disassembler-facing input model
pub use crate::script::{
    FunctionTable, Instruction, InstructionKind, ScriptBuilder, ScriptFunction,
};

/// Graph identifiers, for callers walking the graph directly
pub use crate::utils::graph::{EdgeId, NodeId};
