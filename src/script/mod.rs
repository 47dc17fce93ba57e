//! Script-level input model consumed by the control-flow analysis.
//!
//! The decompiler does not decode bytecode itself; a target-specific
//! disassembler produces an ordered sequence of [`Instruction`] values and an
//! optional [`FunctionTable`] of entry points, and this module defines those
//! contracts.
//!
//! # Key Components
//!
//! - [`Instruction`] - One decoded instruction: address, mnemonic, stack
//!   effect, and its control-flow classification
//! - [`InstructionKind`] - Closed set of control-flow classes; the analysis
//!   only ever consults these predicates, never opcode semantics
//! - [`ScriptFunction`] / [`FunctionTable`] - Known function entry/exit
//!   points, seeded by the disassembler
//! - [`ScriptBuilder`] - Convenience constructor of synthetic instruction
//!   sequences for tests and benchmarks

mod builder;
mod function;
mod instruction;

pub use builder::ScriptBuilder;
pub use function::{FunctionTable, ScriptFunction};
pub use instruction::{Instruction, InstructionKind};
