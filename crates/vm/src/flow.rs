//! Flow handlers: what happens when a control-flow region opens, closes,
//! or is broken out of.
//!
//! The stepper only knows the *shape* of flow control (a stack of regions
//! per call frame). The instruction library decides what each kind of
//! region means by installing hooks here, e.g. a WHILE_LOOP whose close hook
//! re-opens the same region to iterate.
//!
//! Each structural operation pairs stack bookkeeping with the hook for the
//! region's kind:
//!
//! | Operation      | Order                                          |
//! |----------------|------------------------------------------------|
//! | `open_flow`    | `on_open`, then push region on innermost frame |
//! | `close_flow`   | pop innermost region, then `on_close`          |
//! | `break_flow`   | pop innermost region, then `on_break`          |
//!
//! Opening runs the hook first so that a CALL hook can push the callee's
//! frame and have the region land in it. Closing pops first so that a
//! WHILE_LOOP hook can re-push the region it was handed.
//!
//! Hooks receive the thread state and the region being opened or popped.
//! Unset hooks do nothing.

use std::fmt;

use crate::error::StepperError;
use crate::state::{ExecState, FlowInfo};

/// Kinds of control-flow region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowType {
    /// Plain block.
    Basic,
    /// Loop body.
    WhileLoop,
    /// Routine body: runs in the caller's frame.
    Routine,
    /// Call body: runs in its own frame.
    Call,
}

/// All flow types, in definition order.
pub const ALL_FLOW_TYPES: [FlowType; 4] = [
    FlowType::Basic,
    FlowType::WhileLoop,
    FlowType::Routine,
    FlowType::Call,
];

impl FlowType {
    /// Name used in execution-state dumps.
    pub fn name(&self) -> &'static str {
        match self {
            FlowType::Basic => "BASIC",
            FlowType::WhileLoop => "WHILE_LOOP",
            FlowType::Routine => "ROUTINE",
            FlowType::Call => "CALL",
        }
    }
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<usize> for FlowType {
    type Error = StepperError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        ALL_FLOW_TYPES
            .get(value)
            .copied()
            .ok_or(StepperError::UnknownFlowType(value))
    }
}

/// A flow-control hook.
pub type FlowFn<S> = Box<dyn Fn(&mut ExecState<S>, &FlowInfo)>;

/// Open/close/break hooks for one flow type. `None` does nothing.
pub struct FlowControl<S> {
    pub on_open: Option<FlowFn<S>>,
    pub on_close: Option<FlowFn<S>>,
    pub on_break: Option<FlowFn<S>>,
}

impl<S> Default for FlowControl<S> {
    fn default() -> Self {
        Self {
            on_open: None,
            on_close: None,
            on_break: None,
        }
    }
}

impl<S> fmt::Debug for FlowControl<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowControl")
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_break", &self.on_break.is_some())
            .finish()
    }
}

/// Registry of flow controls, one per [`FlowType`].
#[derive(Debug)]
pub struct FlowHandler<S> {
    basic: FlowControl<S>,
    while_loop: FlowControl<S>,
    routine: FlowControl<S>,
    call: FlowControl<S>,
}

impl<S> Default for FlowHandler<S> {
    fn default() -> Self {
        Self {
            basic: FlowControl::default(),
            while_loop: FlowControl::default(),
            routine: FlowControl::default(),
            call: FlowControl::default(),
        }
    }
}

impl<S> FlowHandler<S> {
    /// A registry where every hook does nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hooks registered for `kind`.
    pub fn control(&self, kind: FlowType) -> &FlowControl<S> {
        match kind {
            FlowType::Basic => &self.basic,
            FlowType::WhileLoop => &self.while_loop,
            FlowType::Routine => &self.routine,
            FlowType::Call => &self.call,
        }
    }

    /// Mutable hooks for `kind`, for installing or removing them in place.
    pub fn control_mut(&mut self, kind: FlowType) -> &mut FlowControl<S> {
        match kind {
            FlowType::Basic => &mut self.basic,
            FlowType::WhileLoop => &mut self.while_loop,
            FlowType::Routine => &mut self.routine,
            FlowType::Call => &mut self.call,
        }
    }

    /// Replace the open hook for `kind`.
    pub fn set_open(&mut self, kind: FlowType, hook: impl Fn(&mut ExecState<S>, &FlowInfo) + 'static) {
        self.control_mut(kind).on_open = Some(Box::new(hook));
    }

    /// Replace the close hook for `kind`.
    pub fn set_close(&mut self, kind: FlowType, hook: impl Fn(&mut ExecState<S>, &FlowInfo) + 'static) {
        self.control_mut(kind).on_close = Some(Box::new(hook));
    }

    /// Replace the break hook for `kind`.
    pub fn set_break(&mut self, kind: FlowType, hook: impl Fn(&mut ExecState<S>, &FlowInfo) + 'static) {
        self.control_mut(kind).on_break = Some(Box::new(hook));
    }

    /// Run the open hook for `flow`, then push `flow` onto the innermost
    /// call frame.
    ///
    /// The region lands on whichever frame is innermost once the hook has
    /// returned, so a CALL hook that pushes a fresh frame gets the region in
    /// that frame. Does nothing if the thread has no call frame.
    pub fn open_flow(&self, state: &mut ExecState<S>, flow: FlowInfo) {
        if state.is_empty() {
            return;
        }
        if let Some(hook) = &self.control(flow.kind).on_open {
            hook(state, &flow);
        }
        state.push_flow(flow);
    }

    /// Pop the innermost region and run its close hook.
    ///
    /// Returns the popped region, or `None` if there was nothing to close.
    pub fn close_flow(&self, state: &mut ExecState<S>) -> Option<FlowInfo> {
        let flow = state.pop_flow()?;
        if let Some(hook) = &self.control(flow.kind).on_close {
            hook(state, &flow);
        }
        Some(flow)
    }

    /// Pop the innermost region and run its break hook.
    pub fn break_flow(&self, state: &mut ExecState<S>) -> Option<FlowInfo> {
        let flow = state.pop_flow()?;
        if let Some(hook) = &self.control(flow.kind).on_break {
            hook(state, &flow);
        }
        Some(flow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CallState;
    use std::cell::Cell;
    use std::rc::Rc;

    fn state_with_frame() -> ExecState<()> {
        let mut state = ExecState::new();
        state.push_call(CallState::new(()));
        state
    }

    #[test]
    fn flow_type_names() {
        let names: Vec<&str> = ALL_FLOW_TYPES.iter().map(FlowType::name).collect();
        assert_eq!(names, vec!["BASIC", "WHILE_LOOP", "ROUTINE", "CALL"]);
        assert_eq!(FlowType::WhileLoop.to_string(), "WHILE_LOOP");
    }

    #[test]
    fn flow_type_from_index() {
        for (i, &kind) in ALL_FLOW_TYPES.iter().enumerate() {
            assert_eq!(FlowType::try_from(i), Ok(kind));
        }
        assert_eq!(FlowType::try_from(4), Err(StepperError::UnknownFlowType(4)));
    }

    #[test]
    fn default_hooks_only_do_bookkeeping() {
        let handler = FlowHandler::new();
        let mut state = state_with_frame();
        let flow = FlowInfo::new(FlowType::Basic, 0, 2, 6);

        handler.open_flow(&mut state, flow);
        assert_eq!(state.top_flow(), Some(&flow));

        assert_eq!(handler.close_flow(&mut state), Some(flow));
        assert!(state.top_flow().is_none());
        assert_eq!(handler.close_flow(&mut state), None);
    }

    #[test]
    fn open_without_frame_skips_hook() {
        let opened = Rc::new(Cell::new(false));
        let mut handler = FlowHandler::<()>::new();
        let seen = opened.clone();
        handler.set_open(FlowType::Basic, move |_, _| seen.set(true));

        let mut state = ExecState::new();
        handler.open_flow(&mut state, FlowInfo::new(FlowType::Basic, 0, 0, 1));
        assert!(!opened.get());
    }

    #[test]
    fn hooks_are_dispatched_by_kind() {
        let closes = Rc::new(Cell::new(0));
        let breaks = Rc::new(Cell::new(0));
        let mut handler = FlowHandler::<()>::new();
        let c = closes.clone();
        handler.set_close(FlowType::WhileLoop, move |_, _| c.set(c.get() + 1));
        let b = breaks.clone();
        handler.set_break(FlowType::WhileLoop, move |_, _| b.set(b.get() + 1));

        let mut state = state_with_frame();
        handler.open_flow(&mut state, FlowInfo::new(FlowType::Basic, 0, 0, 1));
        handler.close_flow(&mut state);
        assert_eq!(closes.get(), 0);

        handler.open_flow(&mut state, FlowInfo::new(FlowType::WhileLoop, 0, 0, 1));
        handler.close_flow(&mut state);
        handler.open_flow(&mut state, FlowInfo::new(FlowType::WhileLoop, 0, 0, 1));
        handler.break_flow(&mut state);
        assert_eq!(closes.get(), 1);
        assert_eq!(breaks.get(), 1);
    }

    #[test]
    fn call_open_hook_places_region_in_new_frame() {
        let mut handler = FlowHandler::<u8>::new();
        handler.set_open(FlowType::Call, |state, _| state.push_call(CallState::new(9)));

        let mut state = ExecState::new();
        state.push_call(CallState::new(1));
        state.push_flow(FlowInfo::new(FlowType::Basic, 0, 0, 4));

        let call = FlowInfo::new(FlowType::Call, 1, 5, 8);
        handler.open_flow(&mut state, call);

        assert_eq!(state.depth(), 2);
        let callee = state.current().unwrap();
        assert_eq!(callee.memory, 9);
        assert_eq!(callee.flow_stack, vec![call]);

        let caller = &state.call_stack[0];
        assert_eq!(caller.flow_stack.len(), 1);
        assert_eq!(caller.top_flow().map(|f| f.kind), Some(FlowType::Basic));
    }

    #[test]
    fn open_hook_sees_state_before_push() {
        let depth_seen = Rc::new(Cell::new(usize::MAX));
        let mut handler = FlowHandler::<()>::new();
        let seen = depth_seen.clone();
        handler.set_open(FlowType::Basic, move |state, _| {
            seen.set(state.current().map_or(0, |call| call.flow_stack.len()));
        });

        let mut state = state_with_frame();
        handler.open_flow(&mut state, FlowInfo::new(FlowType::Basic, 0, 0, 2));
        assert_eq!(depth_seen.get(), 0);
        assert_eq!(state.current().unwrap().flow_stack.len(), 1);
    }

    #[test]
    fn close_hook_can_reopen_region() {
        let mut handler = FlowHandler::<()>::new();
        handler.set_close(FlowType::WhileLoop, |state, flow| {
            state.push_flow(FlowInfo::new(flow.kind, flow.mp, flow.begin, flow.end));
        });

        let mut state = state_with_frame();
        let mut flow = FlowInfo::new(FlowType::WhileLoop, 1, 3, 5);
        flow.ip = 5;
        handler.open_flow(&mut state, flow);
        handler.close_flow(&mut state);

        let reopened = state.top_flow().copied().unwrap();
        assert_eq!(reopened.ip, 3);
        assert_eq!(reopened.kind, FlowType::WhileLoop);
        assert_eq!(state.current().unwrap().flow_stack.len(), 1);
    }
}
