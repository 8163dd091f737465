//! Instructions of a linear genetic program.
//!
//! An instruction is an opcode id plus zero or more tags and zero or more
//! arguments. What the opcode id means is decided by the instruction library
//! that executes the program; this crate only carries the data.

/// A single instruction.
///
/// `T` is the tag type, `A` the argument type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instruction<T, A = i32> {
    /// Opcode id, interpreted by the instruction library.
    pub id: usize,
    /// Tags, in order. Module-defining instructions use the first one.
    pub tags: Vec<T>,
    /// Arguments, in order.
    pub args: Vec<A>,
}

impl<T, A> Instruction<T, A> {
    /// Create an instruction with no tags and no arguments.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            tags: Vec::new(),
            args: Vec::new(),
        }
    }

    /// Replace this instruction's tags.
    pub fn with_tags(mut self, tags: Vec<T>) -> Self {
        self.tags = tags;
        self
    }

    /// Replace this instruction's arguments.
    pub fn with_args(mut self, args: Vec<A>) -> Self {
        self.args = args;
        self
    }

    /// The first tag, if any.
    pub fn first_tag(&self) -> Option<&T> {
        self.tags.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::BitTag;

    #[test]
    fn new_has_no_tags_or_args() {
        let instr: Instruction<BitTag<4>> = Instruction::new(7);
        assert_eq!(instr.id, 7);
        assert!(instr.tags.is_empty());
        assert!(instr.args.is_empty());
        assert_eq!(instr.first_tag(), None);
    }

    #[test]
    fn builders_set_tags_and_args() {
        let instr = Instruction::new(2)
            .with_tags(vec![BitTag::<4>::new(0b0011), BitTag::new(0b1100)])
            .with_args(vec![1, -2, 3]);
        assert_eq!(instr.first_tag(), Some(&BitTag::new(0b0011)));
        assert_eq!(instr.tags.len(), 2);
        assert_eq!(instr.args, vec![1, -2, 3]);
    }
}
