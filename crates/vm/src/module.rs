//! Module table: partitioning a program into tag-addressed modules.
//!
//! Compilation is a single scan over the program. Every module-defining
//! instruction closes the module before it and opens a new one that starts
//! right after it. The program is treated as circular:
//!
//! ```text
//! pos:   0     1     2     3     4
//!       ADD  DEF a  ADD  DEF b  SUB
//!        │          └─0─┘        │
//!        └─────── module 1 ──────┘   (4, then wraps to 0)
//! ```
//!
//! Positions before the first module-defining instruction ("dangling"
//! positions) belong to the last module, whose region wraps around the end
//! of the program to meet the first definition. A program without any
//! module-defining instruction gets one default module covering it all.

use std::collections::BTreeSet;
use std::fmt;

use sgp_common::{Instruction, Program};
use tracing::debug;

use crate::error::StepperError;

/// A tag-addressable region of the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module<T> {
    /// Dense id, assigned in discovery order.
    pub id: usize,
    /// First position of the module (the one after its definition).
    pub begin: usize,
    /// One past the last position. Less than `begin` when the region wraps.
    pub end: usize,
    /// Tag the module is matched by.
    pub tag: T,
    /// Positions owned by this module.
    pub in_module: BTreeSet<usize>,
}

impl<T> Module<T> {
    /// A module owning no positions yet.
    pub fn new(id: usize, begin: usize, end: usize, tag: T) -> Self {
        Self {
            id,
            begin,
            end,
            tag,
            in_module: BTreeSet::new(),
        }
    }

    /// Number of owned positions.
    pub fn size(&self) -> usize {
        self.in_module.len()
    }

    /// Whether position `pos` is owned by this module.
    pub fn contains(&self, pos: usize) -> bool {
        self.in_module.contains(&pos)
    }
}

/// All modules of a compiled program, indexed by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleTable<T> {
    modules: Vec<Module<T>>,
}

impl<T> Default for ModuleTable<T> {
    fn default() -> Self {
        Self {
            modules: Vec::new(),
        }
    }
}

impl<T: Clone> ModuleTable<T> {
    /// Partition `program` into modules.
    ///
    /// `is_module` decides whether an instruction defines a module. Such an
    /// instruction must carry at least one tag; its first tag becomes the
    /// module's tag. When no instruction defines a module, a single module
    /// tagged `default_tag` spans the whole program. An empty program yields
    /// an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`StepperError::MalformedModuleDefinition`] if a
    /// module-defining instruction has no tags.
    pub fn compile<A>(
        program: &Program<T, A>,
        default_tag: &T,
        is_module: impl Fn(&Instruction<T, A>) -> bool,
    ) -> Result<Self, StepperError> {
        let len = program.len();
        let mut modules: Vec<Module<T>> = Vec::new();
        if len == 0 {
            return Ok(Self { modules });
        }

        let mut first_def = None;
        let mut dangling = Vec::new();

        for (pos, inst) in program.iter().enumerate() {
            if is_module(inst) {
                if let Some(open) = modules.last_mut() {
                    open.end = pos;
                }
                let tag = inst
                    .first_tag()
                    .ok_or(StepperError::MalformedModuleDefinition { at: pos })?;
                let begin = if pos + 1 < len { pos + 1 } else { 0 };
                first_def.get_or_insert(pos);
                modules.push(Module::new(modules.len(), begin, len, tag.clone()));
            } else {
                match modules.last_mut() {
                    Some(open) => {
                        open.in_module.insert(pos);
                    }
                    None => dangling.push(pos),
                }
            }
        }

        let first_begin = modules.first().map(|first| first.begin);
        if modules.is_empty() {
            modules.push(Module::new(0, 0, len, default_tag.clone()));
        }
        if let Some(last) = modules.last_mut() {
            if let (Some(first_def), Some(first_begin)) = (first_def, first_begin) {
                // Wrap around to meet the first definition. Running to the
                // end of the program gets there when the first module begins
                // at 0, or when the first definition is at 0 and the last
                // module starts elsewhere.
                let to_end = first_begin == 0 || (first_def == 0 && last.begin != 0);
                last.end = if to_end { len } else { first_def };
            }
            last.in_module.extend(dangling.iter().copied());
        }

        debug!(
            modules = modules.len(),
            dangling = dangling.len(),
            "compiled module table"
        );
        Ok(Self { modules })
    }
}

impl<T> ModuleTable<T> {
    /// Module with id `id`.
    pub fn get(&self, id: usize) -> Option<&Module<T>> {
        self.modules.get(id)
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the table has no modules (only for an empty program).
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Modules in id order.
    pub fn iter(&self) -> std::slice::Iter<'_, Module<T>> {
        self.modules.iter()
    }

    /// Modules in id order, indexable by id.
    pub fn as_slice(&self) -> &[Module<T>] {
        &self.modules
    }

    /// Id of the module owning position `pos`.
    pub fn module_at(&self, pos: usize) -> Option<usize> {
        self.modules.iter().position(|m| m.contains(pos))
    }
}

impl<T: fmt::Display> fmt::Display for ModuleTable<T> {
    /// `Modules: [{id:0, begin:1, end:3, tag:0101},{...}]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Modules: [")?;
        for (i, module) in self.modules.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(
                f,
                "{{id:{}, begin:{}, end:{}, tag:{}}}",
                module.id, module.begin, module.end, module.tag
            )?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sgp_common::BitTag;

    type T4 = BitTag<4>;

    const DEF: usize = 0;
    const ADD: usize = 1;
    const SUB: usize = 2;

    fn def(bits: u128) -> Instruction<T4> {
        Instruction::new(DEF).with_tags(vec![T4::new(bits)])
    }

    fn op(id: usize) -> Instruction<T4> {
        Instruction::new(id)
    }

    fn compile(instrs: Vec<Instruction<T4>>) -> Result<ModuleTable<T4>, StepperError> {
        ModuleTable::compile(&Program::new(instrs), &T4::new(0b1111), |i| i.id == DEF)
    }

    fn positions(module: &Module<T4>) -> Vec<usize> {
        module.in_module.iter().copied().collect()
    }

    #[test]
    fn empty_program_has_no_modules() {
        let table = compile(vec![]).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn no_definitions_yields_default_module() {
        let table = compile(vec![op(ADD), op(SUB), op(ADD)]).unwrap();
        assert_eq!(table.len(), 1);
        let module = table.get(0).unwrap();
        assert_eq!((module.begin, module.end), (0, 3));
        assert_eq!(module.tag, T4::new(0b1111));
        assert_eq!(positions(module), vec![0, 1, 2]);
    }

    #[test]
    fn definition_at_start() {
        // [DEF 0101, ADD, ADD, DEF 1010, SUB]
        let table = compile(vec![def(0b0101), op(ADD), op(ADD), def(0b1010), op(SUB)]).unwrap();
        assert_eq!(table.len(), 2);

        let m0 = table.get(0).unwrap();
        assert_eq!((m0.id, m0.begin, m0.end), (0, 1, 3));
        assert_eq!(m0.tag, T4::new(0b0101));
        assert_eq!(positions(m0), vec![1, 2]);

        // First definition sits at 0, so the last module runs to the end.
        let m1 = table.get(1).unwrap();
        assert_eq!((m1.id, m1.begin, m1.end), (1, 4, 5));
        assert_eq!(m1.tag, T4::new(0b1010));
        assert_eq!(positions(m1), vec![4]);
    }

    #[test]
    fn dangling_positions_wrap_into_last_module() {
        // [ADD, DEF 0101, ADD, DEF 1010, SUB]
        let table = compile(vec![op(ADD), def(0b0101), op(ADD), def(0b1010), op(SUB)]).unwrap();

        let m0 = table.get(0).unwrap();
        assert_eq!((m0.begin, m0.end), (2, 3));
        assert_eq!(positions(m0), vec![2]);

        let m1 = table.get(1).unwrap();
        assert_eq!((m1.begin, m1.end), (4, 1));
        assert_eq!(positions(m1), vec![0, 4]);
        assert_eq!(table.module_at(0), Some(1));
    }

    #[test]
    fn definition_at_last_position_begins_at_zero() {
        // [ADD, ADD, DEF 0011]: the only module begins at 0 and runs to the end.
        let table = compile(vec![op(ADD), op(ADD), def(0b0011)]).unwrap();
        assert_eq!(table.len(), 1);
        let module = table.get(0).unwrap();
        assert_eq!((module.begin, module.end), (0, 3));
        assert_eq!(positions(module), vec![0, 1]);
    }

    #[test]
    fn lone_definition_spans_one_position_program() {
        let table = compile(vec![def(0b0110)]).unwrap();
        let module = table.get(0).unwrap();
        assert_eq!((module.begin, module.end), (0, 1));
        assert_eq!(module.size(), 0);
    }

    #[test]
    fn trailing_definition_with_leading_definition_is_empty() {
        // [DEF 0001, ADD, DEF 0010]
        let table = compile(vec![def(0b0001), op(ADD), def(0b0010)]).unwrap();
        let m1 = table.get(1).unwrap();
        assert_eq!((m1.begin, m1.end), (0, 0));
        assert_eq!(m1.size(), 0);
    }

    #[test]
    fn back_to_back_definitions_leave_empty_module() {
        let table = compile(vec![def(0b0001), def(0b0010), op(ADD)]).unwrap();
        let m0 = table.get(0).unwrap();
        assert_eq!((m0.begin, m0.end), (1, 1));
        assert_eq!(m0.size(), 0);
        let m1 = table.get(1).unwrap();
        assert_eq!((m1.begin, m1.end), (2, 3));
        assert_eq!(positions(m1), vec![2]);
    }

    #[test]
    fn untagged_definition_is_rejected() {
        let result = compile(vec![op(ADD), Instruction::new(DEF)]);
        assert_eq!(
            result,
            Err(StepperError::MalformedModuleDefinition { at: 1 })
        );
    }

    #[test]
    fn extra_tags_are_ignored() {
        let inst = Instruction::new(DEF).with_tags(vec![T4::new(0b0110), T4::new(0b1001)]);
        let table = compile(vec![inst, op(ADD)]).unwrap();
        assert_eq!(table.get(0).unwrap().tag, T4::new(0b0110));
    }

    #[test]
    fn display_lists_modules() {
        let table = compile(vec![def(0b0101), op(ADD), op(ADD), def(0b1010), op(SUB)]).unwrap();
        assert_eq!(
            table.to_string(),
            "Modules: [{id:0, begin:1, end:3, tag:0101},{id:1, begin:4, end:5, tag:1010}]"
        );
    }

    #[test]
    fn display_empty_table() {
        assert_eq!(ModuleTable::<T4>::default().to_string(), "Modules: []");
    }
}
