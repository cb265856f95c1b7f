use std::fmt::Debug;

use super::context::SolverCtx;
use super::z3::z3_conv::Z3Conv;
use crate::error::Result;
use crate::expr::Expr;
use crate::memory::SymbolicHeap;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum PResult {
    PSat,
    PUnknown,
    PUnsat,
}

impl Debug for PResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PResult::PSat => write!(f, "sat"),
            PResult::PUnknown => write!(f, "unknown"),
            PResult::PUnsat => write!(f, "unsat"),
        }
    }
}

/// Backend-dispatching facade over the translation layer. One `Solver`
/// serializes all bridge calls on the single context it borrows.
pub struct Solver<'ctx> {
    conv: Z3Conv<'ctx>,
}

impl<'ctx> Solver<'ctx> {
    pub fn new(solver_ctx: &'ctx SolverCtx) -> Self {
        match solver_ctx {
            SolverCtx::Z3(z3_ctx) => Solver { conv: Z3Conv::new(z3_ctx) },
        }
    }

    /// Is `expr` satisfiable? The query is pushed and popped, so repeated
    /// checks do not accumulate assertions.
    pub fn check(&mut self, expr: &Expr, heap: &SymbolicHeap) -> Result<PResult> {
        self.conv.check(expr, heap)
    }

    /// Clear interned variables and assertions; the context stays alive.
    pub fn reset(&mut self) {
        self.conv.reset();
    }
}
