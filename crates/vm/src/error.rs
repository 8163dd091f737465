//! Errors raised by the execution stepper.
//!
//! Every variant is a configuration or caller bug: a misconfigured
//! instruction library, or a module id that was never valid. Defects in
//! evolved programs are not errors; the compiler and stepper absorb them
//! with total rules (a default module, closing out-of-range flow regions).

use thiserror::Error;

/// Fatal precondition failures of the execution core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepperError {
    /// `init_thread` was asked to enter a module that does not exist.
    #[error("invalid module id {id} (program has {count} modules)")]
    InvalidModuleId { id: usize, count: usize },

    /// A module-defining instruction carries no tag, so its module could
    /// never be matched.
    #[error("module-defining instruction at position {at} has no tag")]
    MalformedModuleDefinition { at: usize },

    /// A numeric flow kind that names no [`FlowType`](crate::flow::FlowType).
    #[error("unknown flow type {0}")]
    UnknownFlowType(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats() {
        assert_eq!(
            StepperError::InvalidModuleId { id: 4, count: 2 }.to_string(),
            "invalid module id 4 (program has 2 modules)"
        );
        assert_eq!(
            StepperError::MalformedModuleDefinition { at: 3 }.to_string(),
            "module-defining instruction at position 3 has no tag"
        );
        assert_eq!(
            StepperError::UnknownFlowType(9).to_string(),
            "unknown flow type 9"
        );
    }
}
