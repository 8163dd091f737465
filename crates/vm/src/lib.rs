//! Execution core for tag-addressed linear genetic programs.
//!
//! Programs are flat instruction sequences split into *modules*. A module
//! is never called by address: callers present a tag, and the module whose
//! tag matches best is chosen. Modules can therefore appear, vanish, or
//! move under mutation without breaking call sites.
//!
//! The core provides:
//! - [`ModuleTable`]: compiles a program into modules (circular program
//!   semantics, default module when none are defined)
//! - [`TagMatcher`] / [`MatchBin`]: ranked approximate tag lookup
//! - [`ExecState`]: per-thread call stack of frames, each with memory and
//!   a stack of flow regions
//! - [`FlowHandler`]: open/close/break hooks per [`FlowType`]
//! - [`MemoryModel`] / [`SimpleMemoryModel`]: per-frame memory
//! - [`ExecutionStepper`]: ties it together for an [`InstructionLibrary`]
//!
//! Scheduling, the opcode set, and evolution of programs live outside
//! this crate.
//!
//! # Usage
//!
//! ```
//! use sgp_common::{Instruction, Program, Tag16};
//! use sgp_vm::{
//!     ExecState, ExecutionStepper, InstProperty, InstructionLibrary, MemoryState,
//!     SimpleMemoryModel, StepOutcome, TagMatcher,
//! };
//!
//! const MODULE: usize = 0;
//! const INC: usize = 1;
//!
//! /// Two opcodes: MODULE starts a module, INC bumps working[0].
//! struct Counter;
//!
//! impl InstructionLibrary for Counter {
//!     type Tag = Tag16;
//!     type Arg = i32;
//!     type Memory = SimpleMemoryModel;
//!     type Hardware = ();
//!
//!     fn has_property(&self, opcode: usize, property: InstProperty) -> bool {
//!         opcode == MODULE && property == InstProperty::Module
//!     }
//!
//!     fn execute<B: TagMatcher<Tag16>>(
//!         &self,
//!         _hardware: &mut (),
//!         _stepper: &ExecutionStepper<'_, Self, B>,
//!         state: &mut ExecState<MemoryState<Self>>,
//!         inst: &Instruction<Tag16>,
//!     ) {
//!         if inst.id == INC {
//!             if let Some(call) = state.current_mut() {
//!                 *call.memory.working.entry(0).or_insert(0.0) += 1.0;
//!             }
//!         }
//!     }
//! }
//!
//! let library = Counter;
//! let mut stepper = ExecutionStepper::new(&library);
//! stepper
//!     .set_program(Program::new(vec![
//!         Instruction::new(MODULE).with_tags(vec![Tag16::new(0xF0F0)]),
//!         Instruction::new(INC),
//!         Instruction::new(INC),
//!     ]))
//!     .unwrap();
//!
//! let module = stepper.find_module_match(&Tag16::new(0xF0F1), 1)[0];
//! let mut thread = ExecState::new();
//! stepper.init_thread(&mut thread, module).unwrap();
//!
//! assert_eq!(stepper.run_steps(&mut (), &mut thread, 10), StepOutcome::Finished);
//! ```

pub mod error;
pub mod flow;
pub mod library;
pub mod matching;
pub mod memory;
pub mod module;
pub mod state;
pub mod stepper;

pub use error::StepperError;
pub use flow::{FlowControl, FlowHandler, FlowType, ALL_FLOW_TYPES};
pub use library::{InstProperty, InstructionLibrary, MemoryState};
pub use matching::{DefaultMatchBin, HammingMetric, MatchBin, Metric, RankedSelector, Selector, TagMatcher};
pub use memory::{MemoryBuffer, MemoryModel, SimpleMemoryModel, SimpleMemoryState};
pub use module::{Module, ModuleTable};
pub use state::{CallState, ExecState, FlowInfo, VirtualThread};
pub use stepper::{ExecutionStepper, StepOutcome};
