use std::collections::HashMap;
use std::rc::Rc;

use super::function::{Function, FunctionIdx};
use crate::symbol::nstring::NString;

/// The functions of one source file, with name lookup. Functions are held
/// behind `Rc` so interpreter frames can share them without copying.
pub struct Program {
    functions: Vec<Rc<Function>>,
    index: HashMap<NString, FunctionIdx>,
}

impl Program {
    pub fn new(functions: Vec<Function>) -> Self {
        let functions: Vec<_> = functions.into_iter().map(Rc::new).collect();
        let index = functions
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name(), i))
            .collect();
        Program { functions, index }
    }

    pub fn size(&self) -> usize {
        self.functions.len()
    }

    pub fn function(&self, i: FunctionIdx) -> Rc<Function> {
        assert!(i < self.functions.len());
        self.functions[i].clone()
    }

    pub fn lookup(&self, name: NString) -> Option<Rc<Function>> {
        self.index.get(&name).map(|&i| self.functions[i].clone())
    }

    pub fn names(&self) -> impl Iterator<Item = NString> + '_ {
        self.functions.iter().map(|f| f.name())
    }
}
