//! Control flow graph construction and vertex bookkeeping.
//!
//! This module provides the main [`ControlFlowGraph`] structure: the owned
//! instruction sequence, the directed graph of [`Group`] vertices, the
//! address→vertex lookup table and the function table. The grouping and
//! classification stages live in sibling modules and operate on this
//! structure in place.

use std::{collections::HashMap, fmt::Write};

use crate::{
    analysis::cfg::{edge::FlowEdgeKind, group::Group},
    script::{FunctionTable, Instruction, ScriptFunction},
    utils::graph::{DirectedGraph, NodeId},
    Error, Result,
};

/// Host-supplied configuration for control-flow analysis.
///
/// Different VM dialects compile stack usage differently; the host engine
/// selects the grouping behavior that matches its target.
///
/// # Examples
///
/// ```rust
/// use stackflow::CfgOptions;
///
/// let default = CfgOptions::default();
/// assert!(!default.pure_grouping);
///
/// let pure = CfgOptions::pure();
/// assert!(pure.pure_grouping);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CfgOptions {
    /// Disables the balanced-stack merge exception during grouping.
    ///
    /// With the default heuristic grouping, a statement-group boundary falls
    /// wherever the running stack level returns to the expected level —
    /// except that condition-producing code stays attached to an immediately
    /// following conditional jump. Pure grouping drops that entire heuristic
    /// and merges purely on structural criteria, for dialects where stack
    /// equilibrium does not delimit statements.
    pub pure_grouping: bool,
}

impl CfgOptions {
    /// Returns options with pure grouping enabled.
    #[must_use]
    pub const fn pure() -> Self {
        CfgOptions {
            pure_grouping: true,
        }
    }
}

/// A control flow graph over a disassembled script.
///
/// Owns the instruction sequence and everything derived from it: one vertex
/// per instruction at construction, merged into statement groups by
/// [`create_groups`](Self::create_groups) and annotated by
/// [`analyze`](Self::analyze). The graph, its address lookup and the function
/// table are mutated in place through the pipeline and then read by code
/// generation.
///
/// # Construction
///
/// ```rust
/// use stackflow::{ControlFlowGraph, FunctionTable, ScriptBuilder};
///
/// let insts = ScriptBuilder::new()
///     .op("push_x", 1)
///     .op("push_y", 1)
///     .op("cmp", -1)
///     .cond_jump(5)
///     .call("submit")
///     .ret()
///     .build();
///
/// let mut cfg = ControlFlowGraph::new(insts, FunctionTable::new())?;
/// cfg.create_groups();
/// cfg.analyze();
/// # Ok::<(), stackflow::Error>(())
/// ```
///
/// # Concurrency
///
/// The pipeline is single-threaded and synchronous. A host that decompiles
/// many scripts in parallel gives each its own `ControlFlowGraph`; nothing is
/// shared between instances.
#[derive(Debug)]
pub struct ControlFlowGraph {
    /// The disassembled instruction sequence, in program order
    pub(crate) insts: Vec<Instruction>,
    /// Vertices are statement groups, edges are control transfers
    pub(crate) graph: DirectedGraph<Group, FlowEdgeKind>,
    /// Maps every instruction address to the vertex currently owning it
    pub(crate) addr_map: HashMap<u32, NodeId>,
    /// Known functions, each linked back to its entry vertex
    pub(crate) functions: FunctionTable,
    /// Host configuration
    pub(crate) options: CfgOptions,
    /// Vertex of the first instruction; head of the program-order list
    entry: NodeId,
}

impl ControlFlowGraph {
    /// Builds a control flow graph with default options.
    ///
    /// See [`with_options`](Self::with_options).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] for an empty instruction sequence and
    /// [`Error::UnresolvedTarget`] if any jump destination has no owning
    /// instruction.
    pub fn new(insts: Vec<Instruction>, functions: FunctionTable) -> Result<Self> {
        Self::with_options(insts, functions, CfgOptions::default())
    }

    /// Builds a control flow graph from a disassembled instruction sequence.
    ///
    /// Construction performs, in order:
    ///
    /// 1. If `functions` is empty, synthesizes one function spanning the whole
    ///    sequence, so later passes never special-case missing function info.
    /// 2. Creates one vertex per instruction, threads the program-order
    ///    `prev`/`next` list, fills the address lookup table and links each
    ///    function to its entry vertex.
    /// 3. Adds fall-through edges between consecutive instructions, except
    ///    after unconditional jumps and returns, and never into the first
    ///    instruction of a function.
    /// 4. Adds one jump edge per jump instruction to its destination vertex.
    ///
    /// # Arguments
    ///
    /// * `insts` - Instruction sequence in program order, addresses unique
    /// * `functions` - Known function boundaries; may be empty
    /// * `options` - Host configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] for an empty instruction sequence.
    ///
    /// Returns [`Error::UnresolvedTarget`] if a jump destination resolves to
    /// no instruction. Construction fails as a whole in that case: linking a
    /// dangling vertex would corrupt every later pass and the code generated
    /// from the result.
    pub fn with_options(
        insts: Vec<Instruction>,
        mut functions: FunctionTable,
        options: CfgOptions,
    ) -> Result<Self> {
        let (Some(first), Some(last)) = (insts.first(), insts.last()) else {
            return Err(Error::Empty);
        };

        if functions.is_empty() {
            functions.insert(ScriptFunction::new(first.address(), last.address()));
        }

        let mut graph: DirectedGraph<Group, FlowEdgeKind> =
            DirectedGraph::with_capacity(insts.len(), insts.len() + insts.len() / 4);
        let mut addr_map: HashMap<u32, NodeId> = HashMap::with_capacity(insts.len());

        // One vertex per instruction, threaded into the program-order list
        let last_index = insts.len() - 1;
        for (index, inst) in insts.iter().enumerate() {
            let prev = (index > 0).then(|| NodeId::new(index - 1));
            let next = (index < last_index).then(|| NodeId::new(index + 1));
            let node = graph.add_node(Group::new(index, prev, next));

            addr_map.insert(inst.address(), node);
            if let Some(function) = functions.get_mut(inst.address()) {
                function.set_entry(node);
            }
        }

        // Fall-through edges. The flag is cleared at function entries so
        // functions never silently fall into each other.
        let mut add_edge = false;
        for (index, inst) in insts.iter().enumerate() {
            if functions.contains(inst.address()) {
                add_edge = false;
            }
            if add_edge {
                graph.add_edge(
                    NodeId::new(index - 1),
                    NodeId::new(index),
                    FlowEdgeKind::FallThrough,
                )?;
            }
            add_edge = !(inst.is_uncond_jump() || inst.is_return());
        }

        // Jump edges; every destination must resolve to a vertex
        for (index, inst) in insts.iter().enumerate() {
            if !inst.is_jump() {
                continue;
            }
            if let Some(dest) = inst.dest_address() {
                let Some(&target) = addr_map.get(&dest) else {
                    log::error!(
                        "jump at 0x{:08x} targets unmapped address 0x{dest:08x}",
                        inst.address()
                    );
                    return Err(Error::UnresolvedTarget {
                        site: inst.address(),
                        target: dest,
                    });
                };
                graph.add_edge(NodeId::new(index), target, FlowEdgeKind::Jump)?;
            }
        }

        Ok(ControlFlowGraph {
            insts,
            graph,
            addr_map,
            functions,
            options,
            entry: NodeId::new(0),
        })
    }

    /// Returns the vertex currently owning the instruction at `address`.
    ///
    /// After merging, several addresses resolve into the same vertex; the
    /// lookup table is updated on every merge so this always names the live
    /// owner.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAddress`] if no instruction occupies `address`.
    pub fn find(&self, address: u32) -> Result<NodeId> {
        self.addr_map
            .get(&address)
            .copied()
            .ok_or(Error::UnknownAddress(address))
    }

    /// Returns the group at the given vertex.
    ///
    /// # Returns
    ///
    /// `Some(&Group)` for a live vertex, `None` if the vertex was absorbed by
    /// a merge or never existed.
    #[must_use]
    pub fn group(&self, node: NodeId) -> Option<&Group> {
        self.graph.node(node)
    }

    /// Returns the instruction span covered by the group at `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a live vertex.
    #[must_use]
    pub fn group_instructions(&self, node: NodeId) -> &[Instruction] {
        let group = &self.graph[node];
        &self.insts[group.start..=group.end]
    }

    /// Returns the address of the first instruction of the group at `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a live vertex.
    #[must_use]
    pub fn start_address(&self, node: NodeId) -> u32 {
        self.insts[self.graph[node].start].address()
    }

    /// Returns the address of the last instruction of the group at `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a live vertex.
    #[must_use]
    pub fn end_address(&self, node: NodeId) -> u32 {
        self.insts[self.graph[node].end].address()
    }

    /// Returns the full instruction sequence this graph was built over.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.insts
    }

    /// Returns the function table, with entry vertices linked.
    #[must_use]
    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Returns the configuration this graph was built with.
    #[must_use]
    pub fn options(&self) -> CfgOptions {
        self.options
    }

    /// Returns the underlying directed graph.
    ///
    /// This provides access to the full graph API for custom traversals.
    #[must_use]
    pub fn graph(&self) -> &DirectedGraph<Group, FlowEdgeKind> {
        &self.graph
    }

    /// Returns the vertex of the first instruction.
    #[must_use]
    pub const fn entry(&self) -> NodeId {
        self.entry
    }

    /// Returns an iterator over the groups in program order.
    ///
    /// This is the order a code generator walks: the `next` chain from the
    /// first group to the end of the script, one element per live group.
    pub fn groups(&self) -> impl Iterator<Item = (NodeId, &Group)> + '_ {
        std::iter::successors(Some(self.entry), |&node| self.graph[node].next)
            .map(|node| (node, &self.graph[node]))
    }

    /// Merges vertex `b` into vertex `a`, where `b` is `a`'s sole
    /// continuation.
    ///
    /// Extends `a`'s span to cover `b`'s, repoints every address in `b`'s
    /// span at `a`, re-sources `b`'s outgoing edges from `a` (edge kinds
    /// preserved), splices `b` out of the program-order list, and removes `b`
    /// together with its remaining edges — including the edge from `a` to
    /// `b`, which disappears into the merge.
    pub(crate) fn merge(&mut self, a: NodeId, b: NodeId) {
        let (b_start, b_end, b_next) = {
            let absorbed = &self.graph[b];
            (absorbed.start, absorbed.end, absorbed.next)
        };

        for index in b_start..=b_end {
            self.addr_map.insert(self.insts[index].address(), a);
        }

        {
            let surviving = &mut self.graph[a];
            surviving.end = b_end;
            surviving.next = b_next;
        }

        self.graph.redirect_outgoing(b, a);
        self.graph.remove_node(b);

        if let Some(next) = b_next {
            self.graph[next].prev = Some(a);
        }
    }

    /// Checks that the live groups still partition the instruction sequence.
    ///
    /// Walks the program-order list and verifies the spans are contiguous,
    /// non-overlapping and cover every instruction. Useful as a post-pipeline
    /// assertion in tests and host integrations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`] naming the first gap or overlap found.
    pub fn verify_coverage(&self) -> Result<()> {
        let mut expected = 0usize;
        for (node, group) in self.groups() {
            if group.start != expected {
                return Err(Error::GraphError(format!(
                    "group {node} starts at instruction {} but {} was expected",
                    group.start, expected
                )));
            }
            if group.end < group.start || group.end >= self.insts.len() {
                return Err(Error::GraphError(format!(
                    "group {node} has invalid span [{}, {}]",
                    group.start, group.end
                )));
            }
            expected = group.end + 1;
        }
        if expected != self.insts.len() {
            return Err(Error::GraphError(format!(
                "groups cover {expected} of {} instructions",
                self.insts.len()
            )));
        }
        Ok(())
    }

    /// Generates a DOT representation of the annotated graph.
    ///
    /// Each group node lists its address range, classification, stack level
    /// and instructions; edges are labeled with their kind. Render with
    /// Graphviz (`dot -Tsvg`) to inspect what the passes recovered.
    ///
    /// # Arguments
    ///
    /// * `title` - Optional graph title (e.g. script name)
    #[must_use]
    pub fn to_dot(&self, title: Option<&str>) -> String {
        let mut dot = String::new();

        dot.push_str("digraph script {\n");
        if let Some(name) = title {
            let _ = writeln!(dot, "    label=\"{}\";", name.replace('"', "\\\""));
        }
        dot.push_str("    node [shape=box, fontname=\"Courier\", fontsize=10];\n\n");

        for node in self.graph.node_ids() {
            let group = &self.graph[node];
            let mut label = format!(
                "[0x{:04x}..0x{:04x}] {} (stack {})",
                self.start_address(node),
                self.end_address(node),
                group.kind,
                group.stack_level
            );
            if group.start_else {
                label.push_str(" start-else");
            }
            label.push_str("\\l");
            for inst in &self.insts[group.start..=group.end] {
                let _ = write!(label, "{inst}\\l");
            }
            let _ = writeln!(dot, "    {node} [label=\"{label}\"];");
        }

        dot.push('\n');
        for node in self.graph.node_ids() {
            for (_, target, kind) in self.graph.outgoing_edges(node) {
                let _ = writeln!(dot, "    {node} -> {target} [label=\"{kind}\"];");
            }
        }

        dot.push_str("}\n");
        dot
    }

    /// Owner vertex of the instruction at position `index`.
    pub(crate) fn owner(&self, index: usize) -> NodeId {
        self.addr_map[&self.insts[index].address()]
    }

    /// Stack level of the group at `node`, `-1` when unreachable.
    pub(crate) fn stack_level(&self, node: NodeId) -> i32 {
        self.graph[node].stack_level
    }

    /// True if the group is a single bare unconditional jump.
    pub(crate) fn is_bare_jump(&self, node: NodeId) -> bool {
        let group = &self.graph[node];
        group.start == group.end && self.insts[group.start].is_uncond_jump()
    }
}
