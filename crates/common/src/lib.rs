//! Common types for tag-addressed linear genetic programs.
//!
//! This crate provides the data model shared by the execution core and by
//! the instruction libraries that plug into it:
//!
//! - [`Tag`]: the fixed-width bit-vector contract used for addressing
//! - [`BitTag`] / [`Tag16`]: the concrete bit-vector tag
//! - [`Instruction`]: an opcode id with tags and arguments
//! - [`Program`]: a flat sequence of instructions
//! - [`TagParseError`]: errors from parsing tags written as bit strings
//!
//! # Dependencies
//!
//! This crate depends only on `thiserror`, for [`TagParseError`].

pub mod error;
pub mod instruction;
pub mod program;
pub mod tag;

// Re-export commonly used types at the crate root.
pub use error::TagParseError;
pub use instruction::Instruction;
pub use program::Program;
pub use tag::{BitTag, Tag, Tag16};
