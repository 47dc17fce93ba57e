// Copyright 2025 The stackflow developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # stackflow
//!
//! Structured control-flow recovery for stack-machine script bytecode.
//!
//! `stackflow` takes the linear instruction sequence a disassembler produces
//! for a stack-based script VM and recovers the high-level control constructs
//! the script compiler flattened away: if/else, while, do-while, break and
//! continue. The result is an annotated control-flow graph a code generator
//! can walk to emit structured scripting-language output instead of a goto
//! soup.
//!
//! The library was built for the field and world-map script engines of
//! late-90s console games, whose bytecode is irregular and frequently looks
//! hand-compiled. The recovery passes are therefore deliberately
//! conservative: classifications are validated before they are committed, and
//! a shape that does not structure cleanly simply stays unclassified rather
//! than producing wrong nesting.
//!
//! ## Pipeline
//!
//! 1. **Construction** - one graph vertex per instruction, fall-through and
//!    jump edges, address→vertex lookup, function-entry back-links
//! 2. **Grouping** - operand-stack levels are propagated from every function
//!    entry, then consecutive vertices merge into statement groups wherever
//!    the stack has not returned to its resting level
//! 3. **Classification** - a fixed sequence of passes tags loop conditions,
//!    breaks, continues and conditionals, and records else-branch extents
//!
//! ## Quick Start
//!
//! ```rust
//! use stackflow::{ControlFlowGraph, FunctionTable, GroupKind, ScriptBuilder};
//!
//! // while (flag) { body; }
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
//! let condition = cfg.find(0)?;
//! assert_eq!(cfg.group(condition).unwrap().kind(), GroupKind::While);
//! # Ok::<(), stackflow::Error>(())
//! ```
//!
//! ## Scope
//!
//! The crate deliberately stops at the graph. Opcode tables, operand
//! decoding, resource loading and text emission are the host's business; the
//! contract is the [`Instruction`] predicates plus an optional
//! [`FunctionTable`], and the output is the annotated [`ControlFlowGraph`].
//!
//! Known limitation: short-circuited conditions (`&&`/`||` chains spanning
//! two condition groups) are not folded and appear as nested ifs.
//!
//! ## Threading
//!
//! The pipeline is single-threaded and synchronous, with no internal locking.
//! Hosts that decompile many scripts concurrently give each script its own
//! `ControlFlowGraph`; instances share nothing.

pub(crate) mod error;

/// Static analysis over disassembled scripts.
///
/// Hosts the control-flow recovery pipeline: graph construction, statement
/// grouping and structure classification. See [`analysis::cfg`] for the
/// pipeline documentation.
pub mod analysis;

/// Convenience re-exports of the most commonly used types.
///
/// ```rust,no_run
/// use stackflow::prelude::*;
/// ```
pub mod prelude;

/// Script-level input model: instructions, function tables, and the
/// synthetic-script builder used by tests and benchmarks.
pub mod script;

/// Shared infrastructure: the generic directed-graph arena used by the
/// control-flow analysis.
pub mod utils;

/// `stackflow` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is
/// always [`Error`]. Used consistently throughout the crate for all fallible
/// operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `stackflow` Error type
///
/// The main error type for all operations in this crate. Structural problems
/// (unresolvable jump targets, empty input) are hard failures; everything
/// else the pipeline degrades through gracefully.
pub use error::Error;

/// The annotated control-flow graph and its pipeline entry points.
pub use analysis::cfg::{CfgOptions, ControlFlowGraph, FlowEdgeKind, Group, GroupKind};

/// The instruction contract between disassembler and analysis.
pub use script::{FunctionTable, Instruction, InstructionKind, ScriptBuilder, ScriptFunction};

/// Graph identifiers, for callers walking the recovered graph directly.
pub use utils::graph::{EdgeId, NodeId};
