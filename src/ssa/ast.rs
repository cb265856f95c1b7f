use super::lexer::Pos;
use crate::program::function::{BasicKind, BinToken, Literal, UnToken};
use crate::symbol::nstring::NString;

/// Parsed source file: a list of function declarations.
#[derive(Debug)]
pub struct Module {
    pub functions: Vec<FunctionDecl>,
}

#[derive(Debug)]
pub struct FunctionDecl {
    pub name: NString,
    pub params: Vec<(NString, BasicKind)>,
    pub body: Vec<Stmt>,
}

#[derive(Debug)]
pub enum Stmt {
    Assign { name: NString, value: ExprAst },
    If { cond: ExprAst, then_body: Vec<Stmt>, else_body: Option<Vec<Stmt>> },
    While { cond: ExprAst, body: Vec<Stmt> },
    For {
        init: Option<(NString, ExprAst)>,
        cond: Option<ExprAst>,
        post: Option<(NString, ExprAst)>,
        body: Vec<Stmt>,
    },
    Return { values: Vec<ExprAst> },
    Break(Pos),
    Continue(Pos),
    Block(Vec<Stmt>),
}

#[derive(Debug)]
pub enum ExprAst {
    Literal(Literal),
    Var { name: NString, pos: Pos },
    Binary { op: BinToken, lhs: Box<ExprAst>, rhs: Box<ExprAst> },
    Unary { op: UnToken, operand: Box<ExprAst> },
}
