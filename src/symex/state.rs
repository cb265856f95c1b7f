use std::fmt::Debug;
use std::rc::Rc;

use log::trace;

use super::adapter;
use super::frame::Frame;
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::memory::SymbolicHeap;
use crate::program::function::*;

/// What one interpreter step produced. Terminal states are handed back to
/// the scheduler instead of being appended through a back-link, so clones
/// never alias engine state.
pub struct StepResult {
    pub successors: Vec<State>,
    pub terminals: Vec<State>,
}

/// An interpreter state: call stack, path condition and symbolic heap.
/// Forking clones the whole state; expressions inside are shared by `Rc`
/// and never mutated, so only the maps are actually copied.
#[derive(Clone)]
pub struct State {
    frames: Vec<Frame>,
    path_condition: Expr,
    heap: SymbolicHeap,
}

impl State {
    /// The state every exploration starts from: one frame at the entry
    /// block with each parameter bound to a symbolic variable of its
    /// declared type, path condition `true`, empty heap.
    pub fn initial(function: Rc<Function>) -> Result<Self> {
        let mut frame = Frame::new(function.clone());
        for param in function.params() {
            let ty = adapter::lower_type(param.ty)?;
            frame.locals.insert(param.id, Expr::variable(param.name, ty));
        }
        Ok(State {
            frames: vec![frame],
            path_condition: Expr::bool_constant(true),
            heap: SymbolicHeap::new(),
        })
    }

    pub fn path_condition(&self) -> &Expr {
        &self.path_condition
    }

    pub fn return_values(&self) -> &[Expr] {
        &self.top().return_values
    }

    pub fn heap(&self) -> &SymbolicHeap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut SymbolicHeap {
        &mut self.heap
    }

    pub fn top(&self) -> &Frame {
        self.frames.last().expect("empty call stack")
    }

    fn top_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("empty call stack")
    }

    /// Execute the current block: resolve the φ-prefix, then run data
    /// instructions in order until the first control instruction decides
    /// what happens next. Nothing after that instruction is interpreted in
    /// this call.
    pub fn interpret_current_block(mut self) -> Result<StepResult> {
        let function = self.top().function.clone();
        let cur = self.top().cur_block;
        let first_non_phi = self.execute_phis(&function, cur)?;

        let block = function.block(cur);
        for instr in &block.instrs[first_non_phi..] {
            match &instr.kind {
                InstrKind::BinOp { op, lhs, rhs } => {
                    let x = self.resolve(*lhs)?;
                    let y = self.resolve(*rhs)?;
                    let value = adapter::lower_bin_op(*op, x, y)?;
                    self.top_mut().locals.insert(instr.id, value);
                }
                InstrKind::UnOp { op, operand } => {
                    let x = self.resolve(*operand)?;
                    let value = adapter::lower_un_op(*op, x)?;
                    self.top_mut().locals.insert(instr.id, value);
                }
                InstrKind::Phi { .. } => {
                    return Err(Error::UnsupportedInstruction("phi past the block prefix"))
                }
                InstrKind::Jump { target } => {
                    let frame = self.top_mut();
                    frame.prev_block = Some(cur);
                    frame.cur_block = *target;
                    return Ok(StepResult { successors: vec![self], terminals: Vec::new() });
                }
                InstrKind::If { cond, then_blk, else_blk } => {
                    let cond = self.resolve(*cond)?;
                    trace!("fork on {cond:?} at bb{cur}");

                    let mut on_true = self.clone();
                    on_true.path_condition =
                        Expr::and(on_true.path_condition.clone(), cond.clone())?;
                    let frame = on_true.top_mut();
                    frame.prev_block = Some(cur);
                    frame.cur_block = *then_blk;

                    let mut on_false = self;
                    on_false.path_condition =
                        Expr::and(on_false.path_condition.clone(), Expr::not(cond)?)?;
                    let frame = on_false.top_mut();
                    frame.prev_block = Some(cur);
                    frame.cur_block = *else_blk;

                    return Ok(StepResult {
                        successors: vec![on_true, on_false],
                        terminals: Vec::new(),
                    });
                }
                InstrKind::Return { values } => {
                    let mut resolved = Vec::new();
                    for value in values {
                        resolved.push(self.resolve(*value)?);
                    }
                    self.top_mut().return_values = resolved;
                    return Ok(StepResult { successors: Vec::new(), terminals: vec![self] });
                }
            }
        }
        Err(Error::UnsupportedInstruction("block without a control instruction"))
    }

    /// φ-nodes at the top of a block assign in parallel: every edge value
    /// is resolved against the bindings from before the block was entered,
    /// then all results are committed at once.
    fn execute_phis(&mut self, function: &Function, cur: BlockIdx) -> Result<usize> {
        let block = function.block(cur);
        let first_non_phi = block
            .instrs
            .iter()
            .position(|i| !i.kind.is_phi())
            .unwrap_or(block.instrs.len());
        if first_non_phi == 0 {
            return Ok(0);
        }

        let prev = self
            .top()
            .prev_block
            .ok_or(Error::UnsupportedInstruction("phi at the entry block"))?;

        let mut staged = Vec::with_capacity(first_non_phi);
        for instr in &block.instrs[..first_non_phi] {
            let InstrKind::Phi { edges } = &instr.kind else { unreachable!() };
            let (_, value) = edges
                .iter()
                .find(|(pred, _)| *pred == prev)
                .ok_or(Error::UnboundSsa(instr.id))?;
            staged.push((instr.id, self.resolve(*value)?));
        }
        for (id, value) in staged {
            self.top_mut().locals.insert(id, value);
        }
        Ok(first_non_phi)
    }

    /// Constants become literal expressions; anything else must already be
    /// bound in local memory under its SSA identity.
    fn resolve(&self, value: Value) -> Result<Expr> {
        match value {
            Value::Const(Literal::Int(v)) => Ok(Expr::int_constant(v)),
            Value::Const(Literal::Bool(b)) => Ok(Expr::bool_constant(b)),
            Value::Const(Literal::Float(v)) => Ok(Expr::float_constant(v)),
            Value::Id(id) => {
                self.top().locals.get(&id).cloned().ok_or(Error::UnboundSsa(id))
            }
        }
    }
}

impl Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "path condition: {:?}", self.path_condition)?;
        write!(f, "\nreturn:")?;
        for (i, value) in self.return_values().iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {value:?}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Type;
    use crate::symbol::nstring::NString;

    fn instr(id: ValueId, kind: InstrKind) -> Instr {
        Instr { id, kind }
    }

    /// f(b: bool) { if (b) return 1; else return 0; }
    fn branchy() -> Rc<Function> {
        let params = vec![Param { id: 0, name: NString::from("b"), ty: BasicKind::Bool }];
        let blocks = vec![
            Block {
                preds: vec![],
                instrs: vec![instr(
                    1,
                    InstrKind::If { cond: Value::Id(0), then_blk: 1, else_blk: 2 },
                )],
            },
            Block {
                preds: vec![0],
                instrs: vec![instr(
                    2,
                    InstrKind::Return { values: vec![Value::Const(Literal::Int(1))] },
                )],
            },
            Block {
                preds: vec![0],
                instrs: vec![instr(
                    3,
                    InstrKind::Return { values: vec![Value::Const(Literal::Int(0))] },
                )],
            },
        ];
        Rc::new(Function::new(NString::from("f"), params, blocks))
    }

    #[test]
    fn fork_symmetry() {
        let state = State::initial(branchy()).unwrap();
        let result = state.interpret_current_block().unwrap();
        assert!(result.terminals.is_empty());
        assert_eq!(result.successors.len(), 2);

        let t = &result.successors[0];
        let f = &result.successors[1];
        assert_eq!(format!("{:?}", t.path_condition()), "(true && b)");
        assert_eq!(format!("{:?}", f.path_condition()), "(true && !b)");
        assert_eq!(t.top().cur_block(), 1);
        assert_eq!(f.top().cur_block(), 2);
        assert_eq!(t.top().prev_block(), Some(0));
        assert_eq!(f.top().prev_block(), Some(0));
    }

    #[test]
    fn return_is_terminal() {
        let state = State::initial(branchy()).unwrap();
        let forked = state.interpret_current_block().unwrap();
        let t = forked.successors.into_iter().next().unwrap();
        let result = t.interpret_current_block().unwrap();
        assert!(result.successors.is_empty());
        assert_eq!(result.terminals.len(), 1);
        assert_eq!(result.terminals[0].return_values(), &[Expr::int_constant(1)]);
    }

    /// Two φs on the same edge, the second reading the first: the value
    /// committed for the second must use the binding from the previous
    /// iteration, not the one the first φ just produced.
    #[test]
    fn phis_assign_in_parallel() {
        let params = vec![
            Param { id: 0, name: NString::from("p"), ty: BasicKind::Int },
            Param { id: 1, name: NString::from("q"), ty: BasicKind::Int },
        ];
        let blocks = vec![
            Block { preds: vec![], instrs: vec![instr(2, InstrKind::Jump { target: 1 })] },
            Block {
                preds: vec![0, 1],
                instrs: vec![
                    instr(
                        3,
                        InstrKind::Phi {
                            edges: vec![
                                (0, Value::Id(0)),
                                (1, Value::Const(Literal::Int(10))),
                            ],
                        },
                    ),
                    instr(
                        4,
                        InstrKind::Phi {
                            edges: vec![(0, Value::Id(1)), (1, Value::Id(3))],
                        },
                    ),
                    instr(5, InstrKind::Jump { target: 1 }),
                ],
            },
        ];
        let function = Rc::new(Function::new(NString::from("f"), params, blocks));

        let state = State::initial(function).unwrap();
        let entered = one_successor(state.interpret_current_block().unwrap());
        // first pass through bb1: x1 = p, x2 = q
        let looped = one_successor(entered.interpret_current_block().unwrap());
        assert_eq!(looped.top().locals[&3], Expr::variable("p", Type::Int));
        assert_eq!(looped.top().locals[&4], Expr::variable("q", Type::Int));
        // second pass: x1 = 10 and x2 sees the *old* x1
        let again = one_successor(looped.interpret_current_block().unwrap());
        assert_eq!(again.top().locals[&3], Expr::int_constant(10));
        assert_eq!(again.top().locals[&4], Expr::variable("p", Type::Int));
    }

    fn one_successor(result: StepResult) -> State {
        assert_eq!(result.successors.len(), 1);
        result.successors.into_iter().next().unwrap()
    }

    #[test]
    fn unbound_value_is_reported() {
        let blocks = vec![Block {
            preds: vec![],
            instrs: vec![instr(0, InstrKind::Return { values: vec![Value::Id(42)] })],
        }];
        let function = Rc::new(Function::new(NString::from("f"), vec![], blocks));
        let state = State::initial(function).unwrap();
        assert!(matches!(
            state.interpret_current_block(),
            Err(Error::UnboundSsa(42))
        ));
    }

    #[test]
    fn float_parameter_is_unsupported() {
        let params = vec![Param { id: 0, name: NString::from("x"), ty: BasicKind::Float }];
        let blocks = vec![Block {
            preds: vec![],
            instrs: vec![instr(1, InstrKind::Return { values: vec![] })],
        }];
        let function = Rc::new(Function::new(NString::from("f"), params, blocks));
        assert!(matches!(
            State::initial(function),
            Err(Error::UnsupportedType(_))
        ));
    }
}
