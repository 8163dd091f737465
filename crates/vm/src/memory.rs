//! Memory models: per-call-frame memory state.
//!
//! The stepper never looks inside a memory state. It asks the model for a
//! fresh state whenever a thread enters a module and asks it to render a
//! state for diagnostics. Everything else is up to the instruction library.

use std::collections::HashMap;
use std::fmt;

/// Pluggable per-frame memory.
pub trait MemoryModel {
    /// State owned by one call frame.
    type State;

    /// A fresh, empty state for a new call frame.
    fn create_state(&self) -> Self::State;

    /// Render `state` as human-readable text.
    fn write_state(&self, state: &Self::State, out: &mut dyn fmt::Write) -> fmt::Result;
}

/// One key → value memory buffer.
pub type MemoryBuffer = HashMap<i32, f64>;

/// Working, input, and output buffers of one call frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleMemoryState {
    /// Scratch memory for the frame's own computation.
    pub working: MemoryBuffer,
    /// Values passed in by the caller.
    pub input: MemoryBuffer,
    /// Values to hand back to the caller.
    pub output: MemoryBuffer,
}

/// Three-buffer memory model with one shared global buffer.
#[derive(Debug, Clone, Default)]
pub struct SimpleMemoryModel {
    global: MemoryBuffer,
}

impl SimpleMemoryModel {
    /// Create a model with an empty global buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// A state seeded with the given buffers.
    pub fn create_state_with(
        &self,
        working: MemoryBuffer,
        input: MemoryBuffer,
        output: MemoryBuffer,
    ) -> SimpleMemoryState {
        SimpleMemoryState {
            working,
            input,
            output,
        }
    }

    /// Buffer shared by every frame of every thread using this model.
    pub fn global(&self) -> &MemoryBuffer {
        &self.global
    }

    /// Mutable access to the global buffer.
    pub fn global_mut(&mut self) -> &mut MemoryBuffer {
        &mut self.global
    }
}

impl MemoryModel for SimpleMemoryModel {
    type State = SimpleMemoryState;

    fn create_state(&self) -> SimpleMemoryState {
        SimpleMemoryState::default()
    }

    fn write_state(&self, state: &SimpleMemoryState, out: &mut dyn fmt::Write) -> fmt::Result {
        write_buffer(out, "Working memory", &state.working)?;
        write_buffer(out, "Input memory", &state.input)?;
        write_buffer(out, "Output memory", &state.output)
    }
}

/// Write `label: {k:v, ...}` with keys ascending.
fn write_buffer(out: &mut dyn fmt::Write, label: &str, buffer: &MemoryBuffer) -> fmt::Result {
    let mut entries: Vec<(&i32, &f64)> = buffer.iter().collect();
    entries.sort_by_key(|(k, _)| **k);

    write!(out, "{label}: {{")?;
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.write_str(", ")?;
        }
        write!(out, "{key}:{value}")?;
    }
    writeln!(out, "}}")
}
