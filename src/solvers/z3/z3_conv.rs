use std::collections::HashMap;

use z3::ast::{Array, Ast, Bool, Dynamic, Int};
use z3::Sort;

use crate::error::{Error, Result};
use crate::solvers::solver::PResult;
use crate::expr::{BinOp, Expr, ExprKind, LogicOp, Type, UnOp};
use crate::memory::SymbolicHeap;
use crate::symbol::nstring::NString;

/// Translates expressions into Z3 terms. Variables are interned by name,
/// so the same `Variable` always maps to the same term within one
/// converter; `reset` clears the interning map without destroying the
/// context.
pub struct Z3Conv<'ctx> {
    z3_ctx: &'ctx z3::Context,
    z3_solver: z3::Solver<'ctx>,
    vars: HashMap<NString, Dynamic<'ctx>>,
}

impl<'ctx> Z3Conv<'ctx> {
    pub fn new(z3_ctx: &'ctx z3::Context) -> Self {
        let z3_solver = z3::Solver::new(z3_ctx);
        Z3Conv { z3_ctx, z3_solver, vars: HashMap::new() }
    }

    pub fn reset(&mut self) {
        self.z3_solver.reset();
        self.vars.clear();
    }

    pub fn check(&mut self, expr: &Expr, heap: &SymbolicHeap) -> Result<PResult> {
        let term = self.convert(expr, heap)?;
        let cond = term.as_bool().ok_or(Error::SolverCast("Bool"))?;
        self.z3_solver.push();
        self.z3_solver.assert(&cond);
        let result = match self.z3_solver.check() {
            z3::SatResult::Sat => PResult::PSat,
            z3::SatResult::Unknown => PResult::PUnknown,
            z3::SatResult::Unsat => PResult::PUnsat,
        };
        self.z3_solver.pop(1);
        Ok(result)
    }

    /// Walk the expression and build the corresponding term. `Reference`s
    /// are resolved through the heap at translation time.
    pub fn convert(&mut self, expr: &Expr, heap: &SymbolicHeap) -> Result<Dynamic<'ctx>> {
        match expr.kind() {
            ExprKind::IntConstant(v) => Ok(Dynamic::from(Int::from_i64(self.z3_ctx, *v))),
            ExprKind::BoolConstant(b) => Ok(Dynamic::from(Bool::from_bool(self.z3_ctx, *b))),
            ExprKind::FloatConstant(_) => Err(Error::UnsupportedType("float".into())),
            ExprKind::Variable(name) => self.variable(*name, expr.ty()),
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.convert(lhs, heap)?;
                let rhs = self.convert(rhs, heap)?;
                self.binary(*op, lhs, rhs)
            }
            ExprKind::Logical { op, operands } => {
                let mut terms = Vec::with_capacity(operands.len());
                for operand in operands {
                    let term = self.convert(operand, heap)?;
                    terms.push(term.as_bool().ok_or(Error::SolverCast("Bool"))?);
                }
                self.logical(*op, terms)
            }
            ExprKind::Unary { op, .. } => match op {
                // no bitvector translation in this version
                UnOp::BitNot => Err(Error::UnsupportedOp("~")),
            },
            ExprKind::Reference(r) => {
                let bound = heap.deref(*r)?;
                self.convert(&bound, heap)
            }
        }
    }

    fn variable(&mut self, name: NString, ty: Type) -> Result<Dynamic<'ctx>> {
        if let Some(term) = self.vars.get(&name) {
            return Ok(term.clone());
        }
        let term = match ty {
            Type::Int => Dynamic::from(Int::new_const(self.z3_ctx, name.to_string())),
            Type::Bool => Dynamic::from(Bool::new_const(self.z3_ctx, name.to_string())),
            // a constant array filled with the named integer, as a
            // placeholder until arrays get real solver support
            Type::Array => {
                let fill = Int::new_const(self.z3_ctx, name.to_string());
                Dynamic::from(Array::const_array(self.z3_ctx, &Sort::int(self.z3_ctx), &fill))
            }
            _ => return Err(Error::UnsupportedType(NString::from(format!("{ty:?}")))),
        };
        self.vars.insert(name, term.clone());
        Ok(term)
    }

    fn binary(&self, op: BinOp, lhs: Dynamic<'ctx>, rhs: Dynamic<'ctx>) -> Result<Dynamic<'ctx>> {
        let l = lhs.as_int().ok_or(Error::SolverCast("Int"))?;
        let r = rhs.as_int().ok_or(Error::SolverCast("Int"))?;
        Ok(match op {
            BinOp::Add => Dynamic::from(l + r),
            BinOp::Sub => Dynamic::from(l - r),
            BinOp::Mul => Dynamic::from(l * r),
            BinOp::Div => Dynamic::from(l / r),
            BinOp::Mod => Dynamic::from(l.modulo(&r)),
            BinOp::Eq => Dynamic::from(l._eq(&r)),
            BinOp::Ne => Dynamic::from(l._eq(&r).not()),
            BinOp::Lt => Dynamic::from(l.lt(&r)),
            BinOp::Le => Dynamic::from(l.le(&r)),
            BinOp::Gt => Dynamic::from(l.gt(&r)),
            BinOp::Ge => Dynamic::from(l.ge(&r)),
            BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::Shl | BinOp::Shr => {
                return Err(Error::UnsupportedOp(
                    match op {
                        BinOp::BitAnd => "&",
                        BinOp::BitOr => "|",
                        BinOp::BitXor => "^",
                        BinOp::Shl => "<<",
                        _ => ">>",
                    },
                ))
            }
        })
    }

    fn logical(&self, op: LogicOp, operands: Vec<Bool<'ctx>>) -> Result<Dynamic<'ctx>> {
        Ok(match op {
            LogicOp::And => {
                let mut result = operands[0].clone();
                for operand in &operands[1..] {
                    result = Bool::and(self.z3_ctx, &[&result, operand]);
                }
                Dynamic::from(result)
            }
            LogicOp::Or => {
                let mut result = operands[0].clone();
                for operand in &operands[1..] {
                    result = Bool::or(self.z3_ctx, &[&result, operand]);
                }
                Dynamic::from(result)
            }
            LogicOp::Not => Dynamic::from(operands[0].not()),
            LogicOp::Implies => Dynamic::from(operands[0].implies(&operands[1])),
        })
    }
}
