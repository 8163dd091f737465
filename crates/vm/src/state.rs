//! Execution state of a virtual thread: call stack and flow stacks.
//!
//! ```text
//! ExecState
//! └── call_stack: [CallState, ..., CallState]   innermost last
//!     └── CallState
//!         ├── memory                            owned by this frame
//!         └── flow_stack: [FlowInfo, ...]       innermost last
//! ```
//!
//! A thread owns its `ExecState` exclusively. The stepper reads and writes
//! it only while servicing that thread and keeps nothing between calls.

use crate::flow::FlowType;

/// One control-flow region being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowInfo {
    /// What kind of region this is.
    pub kind: FlowType,
    /// Module pointer: the module this region belongs to.
    pub mp: usize,
    /// Instruction pointer: the next position to execute.
    pub ip: usize,
    /// First position of the region.
    pub begin: usize,
    /// One past the last position of the region.
    pub end: usize,
}

impl FlowInfo {
    /// A region positioned at its first instruction.
    pub fn new(kind: FlowType, mp: usize, begin: usize, end: usize) -> Self {
        Self {
            kind,
            mp,
            ip: begin,
            begin,
            end,
        }
    }

    /// Whether `pos` lies inside `[begin, end)`.
    ///
    /// A region with `end < begin` wraps around the end of the program and
    /// covers `[begin, len) ∪ [0, end)`. A region with `begin == end` is empty.
    pub fn contains(&self, pos: usize) -> bool {
        if self.begin <= self.end {
            self.begin <= pos && pos < self.end
        } else {
            pos >= self.begin || pos < self.end
        }
    }

    /// Whether the instruction pointer has left the region.
    pub fn is_finished(&self) -> bool {
        !self.contains(self.ip)
    }

    /// Move the instruction pointer to the next position of a program of
    /// `len` instructions.
    ///
    /// Running off the end of the program wraps to position 0, unless the
    /// region itself ends there.
    pub fn advance(&mut self, len: usize) {
        self.ip += 1;
        if self.ip >= len && self.ip != self.end {
            self.ip = 0;
        }
    }
}

/// One call frame: its memory and its stack of open flow regions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallState<S> {
    /// Memory state, owned exclusively by this frame.
    pub memory: S,
    /// Open flow regions, innermost last.
    pub flow_stack: Vec<FlowInfo>,
}

impl<S> CallState<S> {
    /// A frame with the given memory and no open regions.
    pub fn new(memory: S) -> Self {
        Self {
            memory,
            flow_stack: Vec::new(),
        }
    }

    /// Innermost open region.
    pub fn top_flow(&self) -> Option<&FlowInfo> {
        self.flow_stack.last()
    }

    /// Mutable innermost flow region.
    pub fn top_flow_mut(&mut self) -> Option<&mut FlowInfo> {
        self.flow_stack.last_mut()
    }
}

/// The call stack of one virtual thread.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecState<S> {
    /// Call frames, innermost (currently executing) last.
    pub call_stack: Vec<CallState<S>>,
}

impl<S> Default for ExecState<S> {
    fn default() -> Self {
        Self {
            call_stack: Vec::new(),
        }
    }
}

impl<S> ExecState<S> {
    /// A thread state with no call frames.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every call frame.
    pub fn clear(&mut self) {
        self.call_stack.clear();
    }

    /// True once the thread has nothing left to execute.
    pub fn is_empty(&self) -> bool {
        self.call_stack.is_empty()
    }

    /// Number of call frames.
    pub fn depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Innermost call frame.
    pub fn current(&self) -> Option<&CallState<S>> {
        self.call_stack.last()
    }

    /// Mutable innermost call frame.
    pub fn current_mut(&mut self) -> Option<&mut CallState<S>> {
        self.call_stack.last_mut()
    }

    /// Innermost region of the innermost call frame.
    pub fn top_flow(&self) -> Option<&FlowInfo> {
        self.current().and_then(CallState::top_flow)
    }

    /// Mutable innermost flow region.
    pub fn top_flow_mut(&mut self) -> Option<&mut FlowInfo> {
        self.current_mut().and_then(CallState::top_flow_mut)
    }

    /// Enter a new innermost call frame.
    pub fn push_call(&mut self, call: CallState<S>) {
        self.call_stack.push(call);
    }

    /// Leave the innermost call frame, returning it.
    pub fn pop_call(&mut self) -> Option<CallState<S>> {
        self.call_stack.pop()
    }

    /// Push `flow` onto the innermost frame. Returns false (and drops the
    /// region) when there is no frame to hold it.
    pub fn push_flow(&mut self, flow: FlowInfo) -> bool {
        match self.current_mut() {
            Some(call) => {
                call.flow_stack.push(flow);
                true
            }
            None => false,
        }
    }

    /// Pop the innermost region of the innermost frame.
    pub fn pop_flow(&mut self) -> Option<FlowInfo> {
        self.current_mut().and_then(|call| call.flow_stack.pop())
    }
}

/// The scheduler's view of a virtual thread: something that owns an
/// [`ExecState`].
pub trait VirtualThread<S> {
    fn exec_state(&self) -> &ExecState<S>;
    fn exec_state_mut(&mut self) -> &mut ExecState<S>;
}

impl<S> VirtualThread<S> for ExecState<S> {
    fn exec_state(&self) -> &ExecState<S> {
        self
    }

    fn exec_state_mut(&mut self) -> &mut ExecState<S> {
        self
    }
}
