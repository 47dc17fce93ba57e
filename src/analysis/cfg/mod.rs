//! Control Flow Graph (CFG) construction and structure recovery.
//!
//! This module turns a linear instruction sequence into an annotated graph of
//! statement groups, recovering the high-level control constructs (if/else,
//! while, do-while, break, continue) that a code generator needs to emit
//! structured output.
//!
//! # Architecture
//!
//! The CFG builds upon the generic [`crate::utils::graph::DirectedGraph`]
//! infrastructure: vertices carry [`Group`] records, edges carry a
//! [`FlowEdgeKind`]. The pipeline runs three stages over one mutable graph:
//!
//! 1. **Construction** ([`ControlFlowGraph::new`]) - one vertex per
//!    instruction, fall-through and jump edges, function-entry back-links
//! 2. **Grouping** ([`ControlFlowGraph::create_groups`]) - stack levels are
//!    propagated from every function entry, then consecutive vertices are
//!    merged into statement groups using stack-level equilibrium
//! 3. **Classification** ([`ControlFlowGraph::analyze`]) - a fixed sequence
//!    of passes tags groups as loop conditions, breaks, continues and
//!    conditionals, and records if/else block associations
//!
//! The output is the same graph, annotated in place. Groups that no pass can
//! classify stay [`GroupKind::Normal`]; downstream consumers must tolerate
//! that as a bounded degradation rather than an error.
//!
//! # Key Components
//!
//! - [`ControlFlowGraph`] - The pipeline and the finished product
//! - [`Group`] - One merged run of instructions with its classification
//! - [`GroupKind`] - The recovered construct tags
//! - [`FlowEdgeKind`] - Fall-through vs. explicit jump edges
//! - [`CfgOptions`] - Host-supplied knobs (pure grouping)
//!
//! # Examples
//!
//! ```rust
//! use stackflow::{ControlFlowGraph, FunctionTable, ScriptBuilder};
//!
//! let insts = ScriptBuilder::new()
//!     .op("push_flag", 1)
//!     .cond_jump(4)
//!     .op("body", 0)
//!     .uncond_jump(0)
//!     .ret()
//!     .build();
//!
//! let mut cfg = ControlFlowGraph::new(insts, FunctionTable::new())?;
//! cfg.create_groups();
//! cfg.analyze();
//!
//! for (_, group) in cfg.groups() {
//!     println!("{} [{}..{}]", group.kind(), group.start_index(), group.end_index());
//! }
//! # Ok::<(), stackflow::Error>(())
//! ```

mod edge;
mod graph;
mod group;
mod grouping;
mod structure;

pub use edge::FlowEdgeKind;
pub use graph::{CfgOptions, ControlFlowGraph};
pub use group::{Group, GroupKind};
