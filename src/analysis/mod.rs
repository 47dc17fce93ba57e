//! Static analysis over disassembled scripts.
//!
//! Currently this hosts the control-flow recovery pipeline ([`cfg`]); other
//! analyses building on the recovered structure belong alongside it.

pub mod cfg;

pub use cfg::{CfgOptions, ControlFlowGraph, FlowEdgeKind, Group, GroupKind};
