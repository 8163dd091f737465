//! Program representation.
//!
//! A program is a flat sequence of instructions. It has no header and no
//! explicit function table: modules are discovered from the instructions
//! themselves when the program is installed in an execution stepper.

use std::ops::Index;

use crate::instruction::Instruction;

/// A linear program: an ordered sequence of instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program<T, A = i32> {
    /// The instruction stream.
    pub instructions: Vec<Instruction<T, A>>,
}

impl<T, A> Program<T, A> {
    /// Create a new program from a vector of instructions.
    pub fn new(instructions: Vec<Instruction<T, A>>) -> Self {
        Self { instructions }
    }

    /// Append an instruction.
    pub fn push(&mut self, instruction: Instruction<T, A>) {
        self.instructions.push(instruction);
    }

    /// Instruction at `pos`, if in range.
    pub fn get(&self, pos: usize) -> Option<&Instruction<T, A>> {
        self.instructions.get(pos)
    }

    /// Iterate over the instructions in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Instruction<T, A>> {
        self.instructions.iter()
    }

    /// Number of instructions in the program.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl<T, A> Default for Program<T, A> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T, A> Index<usize> for Program<T, A> {
    type Output = Instruction<T, A>;

    fn index(&self, pos: usize) -> &Self::Output {
        &self.instructions[pos]
    }
}

impl<'a, T, A> IntoIterator for &'a Program<T, A> {
    type Item = &'a Instruction<T, A>;
    type IntoIter = std::slice::Iter<'a, Instruction<T, A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}
