//! Script instruction representation and control-flow predicates.
//!
//! This module defines the instruction contract between a target-specific
//! disassembler and the control-flow analysis. An [`Instruction`] carries the
//! few facts the analysis needs — its address, its net stack effect, and a
//! control-flow classification — and nothing about opcode semantics.
//!
//! # Architecture
//!
//! The original systems this crate targets dispatch `is_jump`-style queries
//! through a virtual-call hierarchy with one class per opcode family. The
//! opcode set of any given VM dialect is fixed, so the same contract is
//! expressed here as a closed tagged variant ([`InstructionKind`]) carrying
//! the operands each class needs, with the predicates as plain methods over
//! the variant.

use std::fmt;

/// Control-flow classification of a script instruction.
///
/// This enum captures how an instruction affects control flow and the operand
/// stack, which is all the structure-recovery passes ever inspect. Opcode
/// semantics (what the instruction *does*) stay with the disassembler.
///
/// # Examples
///
/// ```rust
/// use stackflow::InstructionKind;
///
/// let branch = InstructionKind::CondJump { target: 0x40 };
/// assert_eq!(branch.dest_address(), Some(0x40));
/// ```
///
/// # Thread Safety
///
/// [`InstructionKind`] is [`Send`] and [`Sync`] as it only contains primitive
/// data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum InstructionKind {
    /// Plain instruction: loads, arithmetic, comparisons, anything that
    /// continues to the next instruction and needs no special handling
    Default,
    /// Explicit operand-stack manipulation (duplications, raw stack
    /// adjustments); these re-anchor the expected stack level during
    /// statement grouping
    StackOp,
    /// Conditional branch to `target`, falling through when not taken
    CondJump {
        /// Destination address when the branch is taken
        target: u32,
    },
    /// Unconditional branch to `target`; execution never falls through
    UncondJump {
        /// Destination address of the branch
        target: u32,
    },
    /// Call to another script function; control returns after the call
    FuncCall,
    /// Return from the current script function
    Return,
}

impl InstructionKind {
    /// Returns the branch destination for jump-class instructions.
    ///
    /// # Returns
    ///
    /// `Some(address)` for [`CondJump`](Self::CondJump) and
    /// [`UncondJump`](Self::UncondJump), `None` for every other kind.
    #[must_use]
    pub const fn dest_address(&self) -> Option<u32> {
        match self {
            InstructionKind::CondJump { target } | InstructionKind::UncondJump { target } => {
                Some(*target)
            }
            _ => None,
        }
    }
}

/// A single decoded script instruction.
///
/// Instructions are produced by a disassembler in program order; their
/// addresses are unique and strictly increasing along the sequence. Identity
/// is the address: the control-flow graph resolves every jump destination
/// through an address lookup, and after statement grouping several addresses
/// map into the same merged vertex.
///
/// The instruction is immutable once constructed, except for the address,
/// which disassemblers may relocate while laying out a script
/// ([`set_address`](Self::set_address)).
///
/// # Examples
///
/// ```rust
/// use stackflow::{Instruction, InstructionKind};
///
/// let push = Instruction::new(0x10, 0x110, "push", 1, InstructionKind::Default);
/// assert_eq!(push.address(), 0x10);
/// assert_eq!(push.stack_change(), 1);
/// assert!(!push.is_jump());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Address of this instruction within the script
    address: u32,
    /// Raw opcode value, preserved for diagnostics
    opcode: u32,
    /// Mnemonic assigned by the disassembler
    mnemonic: String,
    /// Net effect on the operand-stack depth
    stack_change: i32,
    /// Control-flow classification
    kind: InstructionKind,
}

impl Instruction {
    /// Creates a new instruction.
    ///
    /// # Arguments
    ///
    /// * `address` - Address of the instruction within the script
    /// * `opcode` - Raw opcode value
    /// * `mnemonic` - Human-readable name assigned by the disassembler
    /// * `stack_change` - Net effect on the operand-stack depth
    /// * `kind` - Control-flow classification
    #[must_use]
    pub fn new(
        address: u32,
        opcode: u32,
        mnemonic: impl Into<String>,
        stack_change: i32,
        kind: InstructionKind,
    ) -> Self {
        Instruction {
            address,
            opcode,
            mnemonic: mnemonic.into(),
            stack_change,
            kind,
        }
    }

    /// Returns the address of this instruction.
    #[must_use]
    pub const fn address(&self) -> u32 {
        self.address
    }

    /// Relocates this instruction to a new address.
    ///
    /// Only meaningful before control-flow analysis begins; the graph records
    /// addresses at construction time.
    pub fn set_address(&mut self, address: u32) {
        self.address = address;
    }

    /// Returns the raw opcode value.
    #[must_use]
    pub const fn opcode(&self) -> u32 {
        self.opcode
    }

    /// Returns the mnemonic assigned by the disassembler.
    #[must_use]
    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    /// Returns the net effect of this instruction on the operand-stack depth.
    #[must_use]
    pub const fn stack_change(&self) -> i32 {
        self.stack_change
    }

    /// Returns the control-flow classification of this instruction.
    #[must_use]
    pub const fn kind(&self) -> &InstructionKind {
        &self.kind
    }

    /// Returns `true` if this instruction is a branch of either kind.
    #[must_use]
    pub const fn is_jump(&self) -> bool {
        matches!(
            self.kind,
            InstructionKind::CondJump { .. } | InstructionKind::UncondJump { .. }
        )
    }

    /// Returns `true` if this instruction is a conditional branch.
    #[must_use]
    pub const fn is_cond_jump(&self) -> bool {
        matches!(self.kind, InstructionKind::CondJump { .. })
    }

    /// Returns `true` if this instruction is an unconditional branch.
    #[must_use]
    pub const fn is_uncond_jump(&self) -> bool {
        matches!(self.kind, InstructionKind::UncondJump { .. })
    }

    /// Returns `true` if this instruction returns from the current function.
    #[must_use]
    pub const fn is_return(&self) -> bool {
        matches!(self.kind, InstructionKind::Return)
    }

    /// Returns `true` if this instruction is an explicit stack manipulation.
    #[must_use]
    pub const fn is_stack_op(&self) -> bool {
        matches!(self.kind, InstructionKind::StackOp)
    }

    /// Returns `true` if this instruction calls another script function.
    #[must_use]
    pub const fn is_func_call(&self) -> bool {
        matches!(self.kind, InstructionKind::FuncCall)
    }

    /// Returns the branch destination for jump-class instructions.
    ///
    /// # Returns
    ///
    /// `Some(address)` if this instruction is a conditional or unconditional
    /// branch, `None` otherwise.
    #[must_use]
    pub const fn dest_address(&self) -> Option<u32> {
        self.kind.dest_address()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}: {}", self.address, self.mnemonic)?;
        if let Some(dest) = self.dest_address() {
            write!(f, " 0x{dest:08x}")?;
        }
        Ok(())
    }
}
