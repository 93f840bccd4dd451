use std::rc::Rc;

use crate::script::Item;

/// Position inside the branch being played.
#[derive(Debug, Clone)]
pub(crate) struct Cursor {
    pub branch: String,
    items: Rc<[Item]>,
    pub pc: usize,
}

impl Cursor {
    pub fn new(branch: impl Into<String>, items: Rc<[Item]>) -> Self {
        Self { branch: branch.into(), items, pc: 0 }
    }

    pub fn items(&self) -> Rc<[Item]> {
        self.items.clone()
    }

    pub fn advance(&mut self) {
        self.pc += 1;
    }

    pub fn is_exhausted(&self) -> bool {
        self.pc >= self.items.len()
    }
}
