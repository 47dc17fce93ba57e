//! Stack-level propagation and statement-group formation.
//!
//! Grouping decides where statement boundaries fall. The key signal is the
//! operand-stack level: a statement's sub-expressions push intermediate
//! values, and the stack returns to its resting level when the statement
//! completes. Propagation assigns every reachable vertex the depth expected
//! on entry; the grouping scan then merges consecutive vertices until the
//! running level returns to that resting level, with structural boundaries
//! (jumps, returns, join points) always ending a group.
//!
//! Hand-compiled scripts do not always balance per statement, so two
//! corrections apply: a lower expected level in the next vertex is adopted
//! retroactively, and explicit stack operations re-anchor the expected level
//! outright.

use std::collections::HashSet;

use crate::{
    analysis::cfg::{graph::ControlFlowGraph, group::STACK_LEVEL_UNSET},
    script::ScriptFunction,
    utils::graph::NodeId,
};

impl ControlFlowGraph {
    /// Merges the per-instruction vertices into statement groups.
    ///
    /// First propagates stack levels from every function entry (level 0),
    /// then scans consecutive instruction pairs in program order and merges
    /// them into groups. A group boundary is forced:
    ///
    /// - after any jump instruction,
    /// - after a return,
    /// - before a join point (a vertex with more than one predecessor), and
    /// - in the default grouping mode, wherever the running stack level
    ///   returns to the expected level — unless the group so far only
    ///   consumes stack values, or a conditional jump follows immediately
    ///   (its condition-producing code must stay attached).
    ///
    /// Unreachable instructions (never assigned a stack level) are left as
    /// single-instruction groups.
    ///
    /// Calling this a second time is a no-op: stack levels survive on the
    /// groups, and a graph whose first function entry already has one has
    /// been processed.
    pub fn create_groups(&mut self) {
        if let Some(entry) = self.functions.first().and_then(ScriptFunction::entry) {
            if self.stack_level(entry) != STACK_LEVEL_UNSET {
                return;
            }
        }

        let entries: Vec<NodeId> = self
            .functions
            .iter()
            .filter_map(ScriptFunction::entry)
            .collect();
        for entry in entries {
            self.set_stack_level(entry, 0);
        }

        let mut stack_level = 0;
        for index in 0..self.insts.len().saturating_sub(1) {
            let cur = self.owner(index);
            let next = self.owner(index + 1);

            // Unreachable code is never grouped
            if self.stack_level(cur) < 0 {
                stack_level = self.stack_level(next);
                continue;
            }

            let mut expected = self.stack_level(cur);
            let next_level = self.stack_level(next);
            // A lower expected level downstream wins for the current group too
            if expected > next_level && next_level >= 0 {
                expected = next_level;
                self.graph[cur].stack_level = expected;
            }

            stack_level += self.insts[index].stack_change();

            // Explicit stack operations re-anchor what "balanced" means
            if self.insts[index].is_stack_op() {
                expected = stack_level;
                self.graph[next].stack_level = stack_level;
            }

            // Structural boundaries
            if self.insts[index].is_jump()
                || self.insts[index].is_return()
                || self.graph.in_degree(next) != 1
            {
                stack_level = self.stack_level(next);
                continue;
            }

            if !self.options.pure_grouping {
                let (start, end) = {
                    let group = &self.graph[cur];
                    (group.start, group.end)
                };
                let force_merge = !self.insts[start..=end]
                    .iter()
                    .any(|inst| inst.stack_change() >= 0);
                // Balanced stack closes the statement, unless the group only
                // consumed values or a conditional jump needs its condition
                if stack_level == expected
                    && !force_merge
                    && !self.insts[index + 1].is_cond_jump()
                {
                    continue;
                }
            }

            self.merge(cur, next);
        }

        self.detect_short_circuit();
    }

    /// Assigns stack levels to every vertex reachable from `entry`.
    ///
    /// Iterative depth-first traversal with an explicit stack; recursion
    /// would overflow on deeply nested or malformed scripts. Vertices are
    /// marked seen when pushed, which guarantees termination on cycles. A
    /// vertex reached again with a different level keeps its first level and
    /// logs a warning; propagation never aborts.
    ///
    /// Runs before any merging, so the stack effect of a vertex is the stack
    /// effect of its single instruction.
    fn set_stack_level(&mut self, entry: NodeId, level: i32) {
        let mut worklist = vec![(entry, level)];
        let mut seen: HashSet<NodeId> = HashSet::new();
        seen.insert(entry);

        while let Some((node, level)) = worklist.pop() {
            let current = self.stack_level(node);
            if current != STACK_LEVEL_UNSET {
                if current != level {
                    log::warn!(
                        "inconsistent stack level for instruction at 0x{:08x} ({current} != {level})",
                        self.start_address(node)
                    );
                }
                continue;
            }
            self.graph[node].stack_level = level;

            let effect = self.insts[self.graph[node].start].stack_change();
            for succ in self.graph.successors(node) {
                if seen.insert(succ) {
                    worklist.push((succ, level + effect));
                }
            }
        }
    }

    // Hook for folding `&&`/`||` chains (two condition groups feeding one
    // branch) into a single group. Code generation cannot emit the combined
    // condition yet, so the pass stays a no-op and short-circuited conditions
    // come out as nested ifs.
    fn detect_short_circuit(&mut self) {}
}

#[cfg(test)]
mod tests {
    use crate::{
        analysis::cfg::{CfgOptions, ControlFlowGraph},
        script::{FunctionTable, ScriptBuilder, ScriptFunction},
        utils::graph::NodeId,
    };

    fn grouped(cfg: &ControlFlowGraph) -> Vec<(usize, usize)> {
        cfg.groups()
            .map(|(_, g)| (g.start_index(), g.end_index()))
            .collect()
    }

    #[test]
    fn test_condition_chain_merges_up_to_the_jump() {
        // push/push/cmp/cond-jump collapse into one statement group; the call
        // stands alone; the return is a join point and starts its own group.
        let insts = ScriptBuilder::new()
            .op("push_x", 1)
            .op("push_y", 1)
            .op("cmp", -1)
            .cond_jump(5)
            .call("submit")
            .ret()
            .build();

        let mut cfg = ControlFlowGraph::new(insts, FunctionTable::new()).unwrap();
        cfg.create_groups();

        assert_eq!(grouped(&cfg), vec![(0, 3), (4, 4), (5, 5)]);
        cfg.verify_coverage().unwrap();
    }

    #[test]
    fn test_balanced_stack_ends_group() {
        // Three statements, each stack-neutral, stay three groups
        let insts = ScriptBuilder::new()
            .op("a", 0)
            .op("b", 0)
            .ret()
            .build();

        let mut cfg = ControlFlowGraph::new(insts, FunctionTable::new()).unwrap();
        cfg.create_groups();

        assert_eq!(grouped(&cfg), vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn test_pure_grouping_ignores_stack_equilibrium() {
        let insts = ScriptBuilder::new()
            .op("a", 0)
            .op("b", 0)
            .ret()
            .build();

        let mut cfg =
            ControlFlowGraph::with_options(insts, FunctionTable::new(), CfgOptions::pure())
                .unwrap();
        cfg.create_groups();

        assert_eq!(grouped(&cfg), vec![(0, 2)]);
    }

    #[test]
    fn test_balanced_group_still_attaches_to_cond_jump() {
        // `a` is balanced, but a conditional jump follows immediately, so the
        // two merge anyway
        let insts = ScriptBuilder::new()
            .op("a", 0)
            .cond_jump(3)
            .op("body", 0)
            .ret()
            .build();

        let mut cfg = ControlFlowGraph::new(insts, FunctionTable::new()).unwrap();
        cfg.create_groups();

        assert_eq!(grouped(&cfg)[0], (0, 1));
    }

    #[test]
    fn test_stack_op_reanchors_expected_level() {
        // The dup leaves a value on the stack on purpose; the new level is
        // adopted instead of forcing an endless unbalanced merge chain
        let insts = ScriptBuilder::new()
            .stack_op("dup", 1)
            .op("use", 0)
            .op("use2", 0)
            .ret()
            .build();

        let mut cfg = ControlFlowGraph::new(insts, FunctionTable::new()).unwrap();
        cfg.create_groups();

        let groups = grouped(&cfg);
        // dup group re-anchored the level to 1; `use` is balanced against it
        assert_eq!(groups[0], (0, 0));
        assert!(cfg.groups().all(|(_, g)| g.stack_level() >= 0));
    }

    #[test]
    fn test_unreachable_code_is_not_grouped() {
        let insts = ScriptBuilder::new()
            .ret()
            .op("dead_a", 1)
            .op("dead_b", 1)
            .build();

        let mut cfg = ControlFlowGraph::new(insts, FunctionTable::new()).unwrap();
        cfg.create_groups();

        assert_eq!(grouped(&cfg), vec![(0, 0), (1, 1), (2, 2)]);
        assert_eq!(cfg.group(NodeId::new(1)).unwrap().stack_level(), -1);
        assert_eq!(cfg.group(NodeId::new(2)).unwrap().stack_level(), -1);
    }

    #[test]
    fn test_create_groups_is_idempotent() {
        let insts = ScriptBuilder::new()
            .op("push_x", 1)
            .op("push_y", 1)
            .op("cmp", -1)
            .cond_jump(5)
            .call("submit")
            .ret()
            .build();

        let mut cfg = ControlFlowGraph::new(insts, FunctionTable::new()).unwrap();
        cfg.create_groups();
        let first = grouped(&cfg);
        let levels: Vec<i32> = cfg.groups().map(|(_, g)| g.stack_level()).collect();

        cfg.create_groups();
        assert_eq!(grouped(&cfg), first);
        let levels_again: Vec<i32> = cfg.groups().map(|(_, g)| g.stack_level()).collect();
        assert_eq!(levels_again, levels);
    }

    #[test]
    fn test_first_seen_stack_level_wins() {
        // fn1 jumps into fn2's body with level 0; fn2's own propagation
        // arrives there with level 1. The first assignment stands.
        let insts = ScriptBuilder::new()
            .op("a", 0)
            .uncond_jump(4)
            .ret()
            .op("push", 1)
            .op("shared", 0)
            .ret()
            .build();
        let mut functions = FunctionTable::new();
        functions.insert(ScriptFunction::new(0, 2));
        functions.insert(ScriptFunction::new(3, 5));

        let mut cfg = ControlFlowGraph::new(insts, functions).unwrap();
        cfg.create_groups();

        let shared = cfg.find(4).unwrap();
        assert_eq!(cfg.group(shared).unwrap().stack_level(), 0);
    }
}
