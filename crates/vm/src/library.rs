//! The instruction library contract.
//!
//! The execution core does not define any opcodes. An instruction library
//! tells it which instructions define modules, installs the flow-control
//! semantics it wants, and executes each instruction the stepper fetches.

use sgp_common::{Instruction, Tag};

use crate::flow::FlowHandler;
use crate::matching::TagMatcher;
use crate::memory::MemoryModel;
use crate::state::ExecState;
use crate::stepper::ExecutionStepper;

/// Instruction properties the core asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstProperty {
    /// The instruction starts a new module; its first tag names the module.
    Module,
}

/// Memory state type used by library `L`.
pub type MemoryState<L> = <<L as InstructionLibrary>::Memory as MemoryModel>::State;

/// An instruction set pluggable into [`ExecutionStepper`].
pub trait InstructionLibrary: Sized {
    /// Tag type carried by instructions and modules.
    type Tag: Tag;
    /// Argument type carried by instructions.
    type Arg;
    /// Memory model whose states the instructions operate on.
    type Memory: MemoryModel;
    /// Handle to the hardware that owns the threads being stepped.
    type Hardware;

    /// Whether opcode `opcode` has `property`.
    fn has_property(&self, opcode: usize, property: InstProperty) -> bool;

    /// Install flow-control hooks. Called once when a stepper is built.
    fn configure_flow(&self, _flow: &mut FlowHandler<MemoryState<Self>>) {}

    /// Execute `inst` on behalf of the thread whose state is `state`.
    ///
    /// When this is called the instruction pointer of the innermost region
    /// already points past `inst`, so jumps may simply overwrite it.
    fn execute<B: TagMatcher<Self::Tag>>(
        &self,
        hardware: &mut Self::Hardware,
        stepper: &ExecutionStepper<'_, Self, B>,
        state: &mut ExecState<MemoryState<Self>>,
        inst: &Instruction<Self::Tag, Self::Arg>,
    );
}
