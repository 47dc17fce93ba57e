//! Classification of statement groups into control constructs.
//!
//! After grouping, the graph still only knows about edges. These passes
//! pattern-match graph shapes to recover the constructs the script compiler
//! flattened away: loop conditions, breaks, continues, conditionals and
//! else-branch extents.
//!
//! The pass order is fixed and significant — loop conditions must exist
//! before break/continue detection can reference them, and if-detection must
//! run after both so it only claims the conditional jumps nothing else
//! explained. Every pass only refines [`GroupKind::Normal`] groups; a tag,
//! once assigned, is never taken back.
//!
//! Hand-compiled bytecode does not always structure cleanly. The two
//! validators reject classifications that would cross loop scopes or leak
//! else blocks into each other; a rejected candidate simply stays `Normal`,
//! which downstream consumers must tolerate. Validation runs *before* a tag
//! is committed, never after.

use crate::{
    analysis::cfg::{graph::ControlFlowGraph, group::GroupKind},
    utils::graph::NodeId,
};

impl ControlFlowGraph {
    /// Runs the classification passes over the grouped graph.
    ///
    /// Call after [`create_groups`](Self::create_groups). The passes run in
    /// a fixed order, each mutating group kinds and else markers in place:
    ///
    /// 1. Do-while conditions (conditional back-jumps)
    /// 2. While conditions (conditions entered from below)
    /// 3. Breaks (validated jumps out of a loop)
    /// 4. Continues (validated jumps to a loop condition)
    /// 5. Ifs (every conditional jump still unexplained)
    /// 6. Else extents (recorded on the groups bounding each else body)
    pub fn analyze(&mut self) {
        self.detect_do_while();
        self.detect_while();
        self.detect_break();
        self.detect_continue();
        self.detect_if();
        self.detect_else();
    }

    /// Tags conditional jumps whose branch goes backwards as do-while
    /// conditions.
    ///
    /// A group with two successors ends in a conditional jump; if either
    /// successor starts at a lower address than the group itself, the jump
    /// closes a post-tested loop.
    fn detect_do_while(&mut self) {
        let nodes: Vec<NodeId> = self.graph.node_ids().collect();
        for node in nodes {
            if self.graph[node].kind != GroupKind::Normal || self.graph.out_degree(node) != 2 {
                continue;
            }
            let own = self.start_address(node);
            let jumps_back = self
                .graph
                .successors(node)
                .any(|target| self.start_address(target) < own);
            if jumps_back {
                self.graph[node].kind = GroupKind::DoWhile;
            }
        }
    }

    /// Tags conditional jumps entered from below as while conditions.
    ///
    /// A condition with an in-edge from a higher address is re-entered from
    /// the end of a loop body, making it pre-tested — unless that in-edge is
    /// the back-jump of a do-while, which already owns the cycle.
    fn detect_while(&mut self) {
        let nodes: Vec<NodeId> = self.graph.node_ids().collect();
        for node in nodes {
            if self.graph[node].kind != GroupKind::Normal || self.graph.out_degree(node) != 2 {
                continue;
            }
            let own = self.start_address(node);
            let entered_from_below = self.graph.predecessors(node).any(|source| {
                self.start_address(source) > own && self.graph[source].kind != GroupKind::DoWhile
            });
            if entered_from_below {
                self.graph[node].kind = GroupKind::While;
            }
        }
    }

    /// Tags validated forward jumps out of a loop as breaks.
    ///
    /// The jump must land either on the group immediately after a do-while
    /// condition (the loop's fall-out point) or on a while condition's own
    /// group; in both cases the jump leaves the loop from inside.
    fn detect_break(&mut self) {
        let nodes: Vec<NodeId> = self.graph.node_ids().collect();
        for node in nodes {
            let (kind, end) = {
                let group = &self.graph[node];
                (group.kind, group.end)
            };
            if kind != GroupKind::Normal
                || !self.insts[end].is_uncond_jump()
                || self.graph.out_degree(node) != 1
            {
                continue;
            }
            let Some(dest) = self.insts[end].dest_address() else {
                continue;
            };
            if dest <= self.start_address(node) {
                continue;
            }
            let Some(target) = self.graph.successors(node).next() else {
                continue;
            };

            let condition = match self.graph[target].prev {
                Some(prev) if self.graph[prev].kind == GroupKind::DoWhile => prev,
                _ if self.graph[target].kind == GroupKind::While => target,
                _ => continue,
            };

            if self.validate_break_or_continue(node, condition) {
                self.graph[node].kind = GroupKind::Break;
            }
        }
    }

    /// Tags validated jumps to a loop condition as continues.
    ///
    /// Two shapes are excluded before validation: the closing jump of a
    /// while loop (the while's own exit lands exactly on the jump's
    /// successor), and jumps from code lying past every exit of the loop,
    /// which cannot be inside it.
    fn detect_continue(&mut self) {
        let nodes: Vec<NodeId> = self.graph.node_ids().collect();
        for node in nodes {
            let (kind, end, next) = {
                let group = &self.graph[node];
                (group.kind, group.end, group.next)
            };
            if kind != GroupKind::Normal
                || !self.insts[end].is_uncond_jump()
                || self.graph.out_degree(node) != 1
            {
                continue;
            }
            let Some(target) = self.graph.successors(node).next() else {
                continue;
            };
            let target_kind = self.graph[target].kind;
            if !target_kind.is_loop_condition() {
                continue;
            }

            let own = self.start_address(node);
            let mut is_continue = true;
            let mut inside_loop = false;
            for (_, succ, edge) in self.graph.outgoing_edges(target) {
                if target_kind == GroupKind::While && edge.is_jump() && Some(succ) == next {
                    // The while's exit lands right after this jump: this is
                    // the loop's closing jump, not a continue
                    is_continue = false;
                }
                if self.start_address(succ) > own {
                    inside_loop = true;
                }
            }

            if is_continue
                && inside_loop
                && self.validate_break_or_continue(node, target)
            {
                self.graph[node].kind = GroupKind::Continue;
            }
        }
    }

    /// Tags every remaining conditional jump as an if condition.
    fn detect_if(&mut self) {
        let nodes: Vec<NodeId> = self.graph.node_ids().collect();
        for node in nodes {
            let end = self.graph[node].end;
            if self.graph[node].kind == GroupKind::Normal && self.insts[end].is_cond_jump() {
                self.graph[node].kind = GroupKind::If;
            }
        }
    }

    /// Discovers else branches and records their extents.
    ///
    /// For an if condition, the out-edge with the highest target address
    /// skips the then-branch. When the group just before that target ends in
    /// an unconditional forward jump (and is no break or continue), the jump
    /// skips an else body lying between the two targets. Subject to
    /// [`validate_else_block`](Self::validate_else_block), the body's first
    /// group is marked as opening the else and the if is recorded on the
    /// group closing it.
    fn detect_else(&mut self) {
        let nodes: Vec<NodeId> = self.graph.node_ids().collect();
        for node in nodes {
            if self.graph[node].kind != GroupKind::If {
                continue;
            }

            // Out-edge with the highest target address: the jump-past target
            let mut target: Option<(u32, NodeId)> = None;
            for succ in self.graph.successors(node) {
                let address = self.start_address(succ);
                if target.map_or(true, |(max, _)| address > max) {
                    target = Some((address, succ));
                }
            }
            let Some((target_address, target)) = target else {
                continue;
            };

            let Some(before_target) = self.graph[target].prev else {
                continue;
            };
            let (before_kind, before_end) = {
                let group = &self.graph[before_target];
                (group.kind, group.end)
            };
            if matches!(before_kind, GroupKind::Break | GroupKind::Continue) {
                continue;
            }
            if !self.insts[before_end].is_uncond_jump() {
                continue;
            }
            let Some(dest) = self.insts[before_end].dest_address() else {
                continue;
            };
            // The then-side jump must skip past the else body
            if dest <= target_address {
                continue;
            }
            let Ok(end_node) = self.find(dest) else {
                continue;
            };

            if self.validate_else_block(node, target, end_node) {
                self.graph[target].start_else = true;
                let last = self.graph[end_node].prev;
                if let Some(last) = last {
                    self.graph[last].end_else.push(node);
                }
            }
        }
    }

    /// Checks that a break/continue candidate stays within one loop scope.
    ///
    /// The scan range runs from the candidate to a do-while condition, or
    /// from the group after a while condition to the candidate. Every loop
    /// condition of the same kind found inside the range must keep all of its
    /// edges inside it: a target outside the range, or an opposite-kind loop
    /// feeding such a target from outside, means the candidate would cross
    /// into a differently-scoped loop and the classification is abandoned.
    pub(crate) fn validate_break_or_continue(&self, group: NodeId, condition: NodeId) -> bool {
        let condition_kind = self.graph[condition].kind;
        let (from, to) = if condition_kind == GroupKind::DoWhile {
            (group, condition)
        } else {
            match self.graph[condition].next {
                Some(after) => (after, group),
                None => return true,
            }
        };
        let opposite = if condition_kind == GroupKind::DoWhile {
            GroupKind::While
        } else {
            GroupKind::DoWhile
        };

        let from_address = self.start_address(from);
        let to_address = self.start_address(to);

        let mut cursor = from;
        while cursor != to {
            if self.graph[cursor].kind == condition_kind {
                for target in self.graph.successors(cursor) {
                    let address = self.start_address(target);
                    if address < from_address || address > to_address {
                        return false;
                    }
                    for source in self.graph.predecessors(target) {
                        if self.graph[source].kind == opposite {
                            let source_address = self.start_address(source);
                            if source_address < from_address || source_address > to_address {
                                return false;
                            }
                        }
                    }
                }
            }
            match self.graph[cursor].next {
                Some(next) => cursor = next,
                None => break,
            }
        }
        true
    }

    /// Checks that `[start, end)` forms a self-contained else body.
    ///
    /// Walks the candidate body in program order and rejects when:
    ///
    /// - a nested condition group has an edge leaving the body,
    /// - an earlier else, opened before this body, ends inside it, or
    /// - a condition group is entered from outside the body — unless the
    ///   entering group is a bare unconditional jump or the very if
    ///   condition this else belongs to.
    ///
    /// Groups that are themselves a bare unconditional jump are skipped
    /// past the in-edge check; they are then-branch exits, not body code.
    pub(crate) fn validate_else_block(&self, if_group: NodeId, start: NodeId, end: NodeId) -> bool {
        let start_address = self.start_address(start);
        let end_address = self.start_address(end);

        let mut cursor = start;
        while cursor != end {
            let kind = self.graph[cursor].kind;

            if kind.is_condition() {
                for target in self.graph.successors(cursor) {
                    let address = self.start_address(target);
                    if address < start_address || address > end_address {
                        return false;
                    }
                }
            }

            if let Some(prev) = self.graph[cursor].prev {
                let closed: Vec<NodeId> = self.graph[prev].end_else.clone();
                for earlier_if in closed {
                    if let Some(else_start) = self.else_start_address(earlier_if) {
                        if else_start < start_address {
                            return false;
                        }
                    }
                }
            }

            if self.is_bare_jump(cursor) {
                match self.graph[cursor].next {
                    Some(next) => {
                        cursor = next;
                        continue;
                    }
                    None => break,
                }
            }

            if kind.is_condition() {
                for source in self.graph.predecessors(cursor) {
                    let address = self.start_address(source);
                    if (address < start_address || address > end_address)
                        && source != if_group
                        && !self.is_bare_jump(source)
                    {
                        return false;
                    }
                }
            }

            match self.graph[cursor].next {
                Some(next) => cursor = next,
                None => break,
            }
        }
        true
    }

    /// Address where the else branch of `if_node` begins: the highest
    /// start address among its successors.
    fn else_start_address(&self, if_node: NodeId) -> Option<u32> {
        self.graph
            .successors(if_node)
            .map(|target| self.start_address(target))
            .max()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        analysis::cfg::{ControlFlowGraph, GroupKind},
        script::{FunctionTable, ScriptBuilder},
    };

    fn analyzed(insts: Vec<crate::Instruction>) -> ControlFlowGraph {
        let mut cfg = ControlFlowGraph::new(insts, FunctionTable::new()).unwrap();
        cfg.create_groups();
        cfg.analyze();
        cfg
    }

    fn kind_at(cfg: &ControlFlowGraph, address: u32) -> GroupKind {
        let node = cfg.find(address).unwrap();
        cfg.group(node).unwrap().kind()
    }

    #[test]
    fn test_backward_cond_jump_is_do_while() {
        let cfg = analyzed(
            ScriptBuilder::new()
                .op("body", 0)
                .op("push_flag", 1)
                .cond_jump(0)
                .ret()
                .build(),
        );

        assert_eq!(kind_at(&cfg, 2), GroupKind::DoWhile);
        assert_ne!(kind_at(&cfg, 2), GroupKind::While);
    }

    #[test]
    fn test_condition_entered_from_below_is_while() {
        let cfg = analyzed(
            ScriptBuilder::new()
                .op("push_flag", 1)
                .cond_jump(5)
                .op("body", 0)
                .op("body2", 0)
                .uncond_jump(0)
                .ret()
                .build(),
        );

        assert_eq!(kind_at(&cfg, 0), GroupKind::While);
        // The closing jump is neither a break nor a continue
        assert_eq!(kind_at(&cfg, 4), GroupKind::Normal);
    }

    #[test]
    fn test_forward_jump_past_do_while_is_break() {
        let cfg = analyzed(
            ScriptBuilder::new()
                .op("body", 0)
                .uncond_jump(4)
                .op("push_flag", 1)
                .cond_jump(0)
                .op("after", 0)
                .ret()
                .build(),
        );

        assert_eq!(kind_at(&cfg, 3), GroupKind::DoWhile);
        assert_eq!(kind_at(&cfg, 1), GroupKind::Break);
    }

    #[test]
    fn test_jump_to_while_condition_is_continue() {
        // while (flag) { if (skip) continue; body2 }
        let cfg = analyzed(
            ScriptBuilder::new()
                .op("push_flag", 1)
                .cond_jump(8)
                .op("push_skip", 1)
                .cond_jump(5)
                .uncond_jump(0)
                .op("body2", 0)
                .op("body3", 0)
                .uncond_jump(0)
                .ret()
                .build(),
        );

        assert_eq!(kind_at(&cfg, 0), GroupKind::While);
        assert_eq!(kind_at(&cfg, 4), GroupKind::Continue);
        assert_eq!(kind_at(&cfg, 7), GroupKind::Normal);
        assert_eq!(kind_at(&cfg, 2), GroupKind::If);
    }

    #[test]
    fn test_remaining_cond_jump_is_if() {
        let cfg = analyzed(
            ScriptBuilder::new()
                .op("push_x", 1)
                .op("push_y", 1)
                .op("cmp", -1)
                .cond_jump(5)
                .call("submit")
                .ret()
                .build(),
        );

        assert_eq!(kind_at(&cfg, 0), GroupKind::If);
        assert_eq!(kind_at(&cfg, 4), GroupKind::Normal);
    }

    #[test]
    fn test_if_else_association() {
        let cfg = analyzed(
            ScriptBuilder::new()
                .op("push_flag", 1)
                .cond_jump(4)
                .op("then_body", 0)
                .uncond_jump(5)
                .op("else_body", 0)
                .ret()
                .build(),
        );

        let if_node = cfg.find(0).unwrap();
        assert_eq!(cfg.group(if_node).unwrap().kind(), GroupKind::If);

        let else_node = cfg.find(4).unwrap();
        let else_group = cfg.group(else_node).unwrap();
        assert!(else_group.starts_else());
        assert_eq!(else_group.end_else(), &[if_node]);

        // The then-side exit jump keeps its Normal kind
        assert_eq!(kind_at(&cfg, 3), GroupKind::Normal);
    }

    #[test]
    fn test_no_else_without_then_side_jump() {
        // The group before the jump-past target falls through, so there is
        // no else to attach
        let cfg = analyzed(
            ScriptBuilder::new()
                .op("push_flag", 1)
                .cond_jump(4)
                .op("then_body", 0)
                .op("then_tail", 0)
                .op("after", 0)
                .ret()
                .build(),
        );

        assert_eq!(kind_at(&cfg, 0), GroupKind::If);
        for (_, group) in cfg.groups() {
            assert!(!group.starts_else());
            assert!(group.end_else().is_empty());
        }
    }

    #[test]
    fn test_do_while_and_while_are_exclusive() {
        // A do-while back-jump's source must never also count as the
        // below-entry of a while
        let cfg = analyzed(
            ScriptBuilder::new()
                .op("push_a", 1)
                .cond_jump(4)
                .op("push_b", 1)
                .cond_jump(0)
                .ret()
                .build(),
        );

        assert_eq!(kind_at(&cfg, 2), GroupKind::DoWhile);
        // The condition at 0 has an in-edge only from the do-while source,
        // which is excluded, so it stays an if
        assert_eq!(kind_at(&cfg, 0), GroupKind::If);
    }

    #[test]
    fn test_break_revalidates_after_classification() {
        let cfg = analyzed(
            ScriptBuilder::new()
                .op("body", 0)
                .uncond_jump(4)
                .op("push_flag", 1)
                .cond_jump(0)
                .op("after", 0)
                .ret()
                .build(),
        );

        let breaker = cfg.find(1).unwrap();
        let condition = cfg.find(3).unwrap();
        assert_eq!(cfg.group(breaker).unwrap().kind(), GroupKind::Break);
        assert!(cfg.validate_break_or_continue(breaker, condition));
    }
}
