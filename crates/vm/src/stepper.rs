//! The execution stepper: program loading, module dispatch, thread setup,
//! and single-instruction stepping.
//!
//! One stepper services many virtual threads. It owns everything shared
//! between them (program, module table, tag matcher, flow handlers) and
//! borrows the instruction library. Each thread's [`ExecState`] is owned by
//! the thread and only lent to the stepper for the duration of a call.

use std::cell::RefCell;
use std::fmt;

use sgp_common::Program;
use tracing::{debug, trace};

use crate::error::StepperError;
use crate::flow::{FlowHandler, FlowType};
use crate::library::{InstProperty, InstructionLibrary, MemoryState};
use crate::matching::{DefaultMatchBin, MatchCache, TagMatcher};
use crate::memory::MemoryModel;
use crate::module::{Module, ModuleTable};
use crate::state::{CallState, ExecState, FlowInfo, VirtualThread};

/// Result of one execution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The thread has more to execute.
    Running,
    /// The thread's call stack is empty.
    Finished,
}

/// Execution core for programs of instruction library `L`, dispatching
/// modules through matcher `B`.
pub struct ExecutionStepper<'lib, L: InstructionLibrary, B = DefaultMatchBin<<L as InstructionLibrary>::Tag>> {
    library: &'lib L,
    memory_model: L::Memory,
    flow_handler: FlowHandler<MemoryState<L>>,
    program: Program<L::Tag, L::Arg>,
    modules: ModuleTable<L::Tag>,
    default_tag: L::Tag,
    matches: RefCell<MatchCache<B>>,
}

impl<'lib, L> ExecutionStepper<'lib, L>
where
    L: InstructionLibrary,
    L::Memory: Default,
    L::Tag: Default,
{
    /// A stepper with a default memory model, default tag, and the
    /// Hamming-distance matcher.
    pub fn new(library: &'lib L) -> Self {
        Self::with_parts(
            library,
            L::Memory::default(),
            DefaultMatchBin::default(),
            L::Tag::default(),
        )
    }
}

impl<'lib, L, B> ExecutionStepper<'lib, L, B>
where
    L: InstructionLibrary,
    B: TagMatcher<L::Tag>,
{
    /// A stepper from explicit parts. The library's flow hooks are installed
    /// immediately; the program starts empty.
    pub fn with_parts(library: &'lib L, memory_model: L::Memory, matcher: B, default_tag: L::Tag) -> Self {
        let mut flow_handler = FlowHandler::new();
        library.configure_flow(&mut flow_handler);
        Self {
            library,
            memory_model,
            flow_handler,
            program: Program::default(),
            modules: ModuleTable::default(),
            default_tag,
            matches: RefCell::new(MatchCache::new(matcher)),
        }
    }

    // ---- Program & modules ----

    /// Install `program` and recompile its module table.
    ///
    /// Threads initialized against the previous program must be
    /// re-initialized with [`init_thread`](Self::init_thread).
    ///
    /// # Errors
    ///
    /// Returns [`StepperError::MalformedModuleDefinition`] if a
    /// module-defining instruction has no tag. The program stays installed
    /// with an empty module table.
    pub fn set_program(&mut self, program: Program<L::Tag, L::Arg>) -> Result<(), StepperError> {
        debug!(instructions = program.len(), "installing program");
        self.program = program;
        self.update_modules()
    }

    /// Tag for the module synthesized when a program defines none. Takes
    /// effect on the next compilation.
    pub fn set_default_tag(&mut self, tag: L::Tag) {
        self.default_tag = tag;
    }

    /// Tag given to the default module.
    pub fn default_tag(&self) -> &L::Tag {
        &self.default_tag
    }

    /// Recompile the module table from the installed program.
    pub fn update_modules(&mut self) -> Result<(), StepperError> {
        let library = self.library;
        self.matches.get_mut().invalidate();
        let compiled = ModuleTable::compile(&self.program, &self.default_tag, |inst| {
            library.has_property(inst.id, InstProperty::Module)
        });
        match compiled {
            Ok(modules) => {
                self.modules = modules;
                Ok(())
            }
            Err(err) => {
                self.modules = ModuleTable::default();
                Err(err)
            }
        }
    }

    /// Mark the tag matcher stale; it is rebuilt on the next query.
    pub fn reset_match_bin(&mut self) {
        self.matches.get_mut().invalidate();
    }

    /// Ids of up to `n` modules whose tags best match `tag`, best first.
    pub fn find_module_match(&self, tag: &L::Tag, n: usize) -> Vec<usize> {
        self.matches
            .borrow_mut()
            .find_matches(self.modules.as_slice(), tag, n)
    }

    // ---- Threads ----

    /// Reset `thread` to execute module `module_id` from its first
    /// instruction, in a single fresh call frame.
    ///
    /// # Errors
    ///
    /// Returns [`StepperError::InvalidModuleId`] if no such module exists.
    /// The thread's previous state is discarded either way.
    pub fn init_thread<Th>(&self, thread: &mut Th, module_id: usize) -> Result<(), StepperError>
    where
        Th: VirtualThread<MemoryState<L>>,
    {
        let state = thread.exec_state_mut();
        state.clear();

        let module = self
            .modules
            .get(module_id)
            .ok_or(StepperError::InvalidModuleId {
                id: module_id,
                count: self.modules.len(),
            })?;

        state.push_call(CallState::new(self.memory_model.create_state()));
        state.push_flow(FlowInfo::new(FlowType::Call, module_id, module.begin, module.end));
        debug!(module = module_id, begin = module.begin, end = module.end, "initialized thread");
        Ok(())
    }

    /// Advance `state` by one step.
    ///
    /// A step either executes the instruction under the innermost region's
    /// instruction pointer, or, if that region has run out, closes it
    /// through the flow handler. Call frames left without regions are popped.
    pub fn single_execution_step(
        &self,
        hardware: &mut L::Hardware,
        state: &mut ExecState<MemoryState<L>>,
    ) -> StepOutcome {
        pop_finished_calls(state);
        let len = self.program.len();

        let Some(flow) = state.top_flow_mut() else {
            return StepOutcome::Finished;
        };

        if flow.is_finished() || flow.ip >= len {
            if let Some(closed) = self.flow_handler.close_flow(state) {
                trace!(kind = %closed.kind, mp = closed.mp, "closed flow region");
            }
            pop_finished_calls(state);
            return outcome(state);
        }

        let ip = flow.ip;
        flow.advance(len);

        let inst = &self.program[ip];
        trace!(ip, opcode = inst.id, "executing instruction");
        self.library.execute(hardware, self, state, inst);

        pop_finished_calls(state);
        outcome(state)
    }

    /// Run up to `max_steps` steps, stopping early if the thread finishes.
    /// Returns the outcome of the last step taken.
    pub fn run_steps(
        &self,
        hardware: &mut L::Hardware,
        state: &mut ExecState<MemoryState<L>>,
        max_steps: usize,
    ) -> StepOutcome {
        let mut last = outcome(state);
        for _ in 0..max_steps {
            last = self.single_execution_step(hardware, state);
            if last == StepOutcome::Finished {
                break;
            }
        }
        last
    }

    // ---- Accessors ----

    /// The borrowed instruction library.
    pub fn library(&self) -> &'lib L {
        self.library
    }

    /// The installed program.
    pub fn program(&self) -> &Program<L::Tag, L::Arg> {
        &self.program
    }

    /// Module table of the installed program.
    pub fn modules(&self) -> &ModuleTable<L::Tag> {
        &self.modules
    }

    /// Module with id `id`.
    pub fn module(&self, id: usize) -> Option<&Module<L::Tag>> {
        self.modules.get(id)
    }

    /// Number of modules in the installed program.
    pub fn num_modules(&self) -> usize {
        self.modules.len()
    }

    /// Memory model used for new call frames.
    pub fn memory_model(&self) -> &L::Memory {
        &self.memory_model
    }

    /// Mutable memory model, e.g. to seed its global buffer.
    pub fn memory_model_mut(&mut self) -> &mut L::Memory {
        &mut self.memory_model
    }

    /// Flow hooks shared by every thread.
    pub fn flow_handler(&self) -> &FlowHandler<MemoryState<L>> {
        &self.flow_handler
    }

    /// Mutable flow hooks, for overriding what the library installed.
    pub fn flow_handler_mut(&mut self) -> &mut FlowHandler<MemoryState<L>> {
        &mut self.flow_handler
    }

    // ---- Diagnostics ----

    /// `Modules: [{id:I, begin:B, end:E, tag:T},...]`
    pub fn modules_listing(&self) -> String {
        self.modules.to_string()
    }

    /// Render the call stack innermost first: each frame's top flow region,
    /// then its memory.
    pub fn write_execution_state(
        &self,
        state: &ExecState<MemoryState<L>>,
        out: &mut dyn fmt::Write,
    ) -> fmt::Result {
        writeln!(out, "Call stack ({}):", state.depth())?;
        writeln!(out, "------ TOP ------")?;
        for call in state.call_stack.iter().rev() {
            if let Some(flow) = call.top_flow() {
                writeln!(
                    out,
                    "Call: {{mp:{}, ip:{}, flow-begin:{}, flow-end:{}, flow-type:{}}}",
                    flow.mp, flow.ip, flow.begin, flow.end, flow.kind
                )?;
            }
            self.memory_model.write_state(&call.memory, out)?;
            writeln!(out, "---")?;
        }
        write!(out, "-----------------")
    }

    /// [`write_execution_state`](Self::write_execution_state) into a `String`.
    pub fn execution_state_dump(&self, state: &ExecState<MemoryState<L>>) -> String {
        let mut out = String::new();
        self.write_execution_state(state, &mut out)
            .expect("writing to a String cannot fail");
        out
    }
}

/// Pop call frames whose flow stacks are empty.
fn pop_finished_calls<S>(state: &mut ExecState<S>) {
    while state
        .current()
        .is_some_and(|call| call.flow_stack.is_empty())
    {
        state.pop_call();
    }
}

fn outcome<S>(state: &ExecState<S>) -> StepOutcome {
    if state.is_empty() {
        StepOutcome::Finished
    } else {
        StepOutcome::Running
    }
}

impl<L, B> fmt::Debug for ExecutionStepper<'_, L, B>
where
    L: InstructionLibrary,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionStepper")
            .field("instructions", &self.program.len())
            .field("modules", &self.modules.len())
            .field("default_tag", &self.default_tag)
            .finish_non_exhaustive()
    }
}
