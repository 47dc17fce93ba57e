//! Fluent construction of synthetic instruction sequences.
//!
//! Tests and benchmarks need small hand-written scripts with consistent
//! addressing. [`ScriptBuilder`] assigns addresses automatically from a start
//! address and a fixed instruction width, so a script reads as a straight
//! listing and jump targets can be computed from instruction positions.

use crate::script::instruction::{Instruction, InstructionKind};

/// Builder for synthetic instruction sequences.
///
/// Every appended instruction occupies `width` address units; with the
/// default layout (start 0, width 1) an instruction's address equals its
/// index, which keeps jump targets in tests easy to read.
///
/// # Examples
///
/// ```rust
/// use stackflow::ScriptBuilder;
///
/// let insts = ScriptBuilder::new()
///     .op("push_x", 1)
///     .op("push_y", 1)
///     .op("cmp", -1)
///     .cond_jump(5)
///     .call("foo")
///     .ret()
///     .build();
///
/// assert_eq!(insts.len(), 6);
/// assert_eq!(insts[3].dest_address(), Some(5));
/// ```
#[derive(Debug)]
pub struct ScriptBuilder {
    instructions: Vec<Instruction>,
    address: u32,
    width: u32,
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptBuilder {
    /// Creates a builder starting at address 0 with one address unit per
    /// instruction.
    #[must_use]
    pub fn new() -> Self {
        Self::with_layout(0, 1)
    }

    /// Creates a builder with an explicit start address and instruction width.
    ///
    /// # Arguments
    ///
    /// * `start` - Address of the first instruction
    /// * `width` - Address units each instruction occupies
    #[must_use]
    pub fn with_layout(start: u32, width: u32) -> Self {
        ScriptBuilder {
            instructions: Vec::new(),
            address: start,
            width,
        }
    }

    /// Returns the address the next appended instruction will receive.
    #[must_use]
    pub const fn next_address(&self) -> u32 {
        self.address
    }

    fn push(mut self, mnemonic: &str, stack_change: i32, kind: InstructionKind) -> Self {
        let opcode = self.instructions.len() as u32;
        self.instructions.push(Instruction::new(
            self.address,
            opcode,
            mnemonic,
            stack_change,
            kind,
        ));
        self.address += self.width;
        self
    }

    /// Appends a plain instruction with the given stack effect.
    #[must_use]
    pub fn op(self, mnemonic: &str, stack_change: i32) -> Self {
        self.push(mnemonic, stack_change, InstructionKind::Default)
    }

    /// Appends an explicit stack-manipulation instruction.
    #[must_use]
    pub fn stack_op(self, mnemonic: &str, stack_change: i32) -> Self {
        self.push(mnemonic, stack_change, InstructionKind::StackOp)
    }

    /// Appends a conditional jump to `target` that pops its condition.
    #[must_use]
    pub fn cond_jump(self, target: u32) -> Self {
        self.push("jz", -1, InstructionKind::CondJump { target })
    }

    /// Appends an unconditional jump to `target`.
    #[must_use]
    pub fn uncond_jump(self, target: u32) -> Self {
        self.push("jmp", 0, InstructionKind::UncondJump { target })
    }

    /// Appends a call to another script function.
    #[must_use]
    pub fn call(self, mnemonic: &str) -> Self {
        self.push(mnemonic, 0, InstructionKind::FuncCall)
    }

    /// Appends a return instruction.
    #[must_use]
    pub fn ret(self) -> Self {
        self.push("ret", 0, InstructionKind::Return)
    }

    /// Consumes the builder, returning the instruction sequence.
    #[must_use]
    pub fn build(self) -> Vec<Instruction> {
        self.instructions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_follow_layout() {
        let insts = ScriptBuilder::with_layout(0x100, 4)
            .op("push", 1)
            .op("pop", -1)
            .ret()
            .build();

        let addresses: Vec<u32> = insts.iter().map(Instruction::address).collect();
        assert_eq!(addresses, vec![0x100, 0x104, 0x108]);
    }

    #[test]
    fn test_kinds_and_effects() {
        let insts = ScriptBuilder::new()
            .stack_op("dup", 1)
            .cond_jump(3)
            .uncond_jump(0)
            .call("foo")
            .ret()
            .build();

        assert!(insts[0].is_stack_op());
        assert!(insts[1].is_cond_jump());
        assert_eq!(insts[1].stack_change(), -1);
        assert!(insts[2].is_uncond_jump());
        assert!(insts[3].is_func_call());
        assert!(insts[4].is_return());
    }

    #[test]
    fn test_next_address_tracks_cursor() {
        let builder = ScriptBuilder::new().op("a", 0).op("b", 0);
        assert_eq!(builder.next_address(), 2);
    }
}
