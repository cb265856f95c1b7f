use std::collections::HashMap;
use std::rc::Rc;

use crate::expr::Expr;
use crate::program::function::{BlockIdx, Function, ValueId};

/// One function activation. Local bindings map SSA value identity to the
/// expression currently denoting it. `prev_block` is what φ-resolution
/// keys on; it is `None` at the entry block and must never be read there.
#[derive(Clone)]
pub struct Frame {
    pub(super) function: Rc<Function>,
    pub(super) locals: HashMap<ValueId, Expr>,
    pub(super) return_values: Vec<Expr>,
    pub(super) cur_block: BlockIdx,
    pub(super) prev_block: Option<BlockIdx>,
}

impl Frame {
    pub fn new(function: Rc<Function>) -> Self {
        Frame {
            function,
            locals: HashMap::new(),
            return_values: Vec::new(),
            cur_block: 0,
            prev_block: None,
        }
    }

    pub fn function(&self) -> &Rc<Function> {
        &self.function
    }

    pub fn cur_block(&self) -> BlockIdx {
        self.cur_block
    }

    pub fn prev_block(&self) -> Option<BlockIdx> {
        self.prev_block
    }
}
