use std::fmt::Debug;

use crate::symbol::nstring::NString;

pub type BlockIdx = usize;
pub type ValueId = usize;
pub type FunctionIdx = usize;

/// Basic kind of a declared value in the source language. Only `int` and
/// `bool` survive lowering into the expression algebra.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Int,
    Bool,
    Float,
}

impl Debug for BasicKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BasicKind::Int => write!(f, "int"),
            BasicKind::Bool => write!(f, "bool"),
            BasicKind::Float => write!(f, "float"),
        }
    }
}

/// Source-level binary operator token as it appears in an SSA instruction.
/// The symex adapter decides which tokens have a lowering.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinToken {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinToken {
    pub fn token(&self) -> &'static str {
        match self {
            BinToken::Add => "+",
            BinToken::Sub => "-",
            BinToken::Mul => "*",
            BinToken::Div => "/",
            BinToken::Rem => "%",
            BinToken::EqEq => "==",
            BinToken::NotEq => "!=",
            BinToken::Lt => "<",
            BinToken::Le => "<=",
            BinToken::Gt => ">",
            BinToken::Ge => ">=",
            BinToken::AndAnd => "&&",
            BinToken::OrOr => "||",
            BinToken::BitAnd => "&",
            BinToken::BitOr => "|",
            BinToken::BitXor => "^",
            BinToken::Shl => "<<",
            BinToken::Shr => ">>",
        }
    }
}

impl Debug for BinToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnToken {
    Neg,
    Not,
    BitNot,
}

impl UnToken {
    pub fn token(&self) -> &'static str {
        match self {
            UnToken::Neg => "-",
            UnToken::Not => "!",
            UnToken::BitNot => "~",
        }
    }
}

impl Debug for UnToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

#[derive(Clone, Copy, PartialEq)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Float(f64),
}

impl Debug for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Leaf of the SSA graph: either a constant or the identity of a parameter
/// or instruction result.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Value {
    Const(Literal),
    Id(ValueId),
}

#[derive(Clone, PartialEq)]
pub enum InstrKind {
    BinOp { op: BinToken, lhs: Value, rhs: Value },
    UnOp { op: UnToken, operand: Value },
    /// One edge value per predecessor block
    Phi { edges: Vec<(BlockIdx, Value)> },
    If { cond: Value, then_blk: BlockIdx, else_blk: BlockIdx },
    Jump { target: BlockIdx },
    Return { values: Vec<Value> },
}

impl InstrKind {
    pub fn is_phi(&self) -> bool {
        matches!(self, InstrKind::Phi { .. })
    }
}

#[derive(Clone)]
pub struct Instr {
    pub id: ValueId,
    pub kind: InstrKind,
}

#[derive(Clone, Default)]
pub struct Block {
    pub preds: Vec<BlockIdx>,
    pub instrs: Vec<Instr>,
}

#[derive(Clone)]
pub struct Param {
    pub id: ValueId,
    pub name: NString,
    pub ty: BasicKind,
}

/// A function in SSA form: parameters with stable identity and blocks
/// indexed by integer. Block 0 is the entry.
pub struct Function {
    name: NString,
    params: Vec<Param>,
    blocks: Vec<Block>,
}

impl Function {
    pub fn new(name: NString, params: Vec<Param>, blocks: Vec<Block>) -> Self {
        Function { name, params, blocks }
    }

    pub fn name(&self) -> NString {
        self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn size(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, i: BlockIdx) -> &Block {
        assert!(i < self.blocks.len());
        &self.blocks[i]
    }

    fn value_str(&self, value: Value) -> String {
        match value {
            Value::Const(lit) => format!("{lit:?}"),
            Value::Id(id) => match self.params.iter().find(|p| p.id == id) {
                Some(p) => p.name.to_string(),
                None => format!("%{id}"),
            },
        }
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fn {:?}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}: {:?}", p.name, p.ty)?;
        }
        writeln!(f, ") {{")?;
        for (i, block) in self.blocks.iter().enumerate() {
            writeln!(f, "bb{i}:")?;
            for instr in &block.instrs {
                match &instr.kind {
                    InstrKind::BinOp { op, lhs, rhs } => writeln!(
                        f,
                        "    %{} = {} {op:?} {}",
                        instr.id,
                        self.value_str(*lhs),
                        self.value_str(*rhs)
                    )?,
                    InstrKind::UnOp { op, operand } => writeln!(
                        f,
                        "    %{} = {op:?}{}",
                        instr.id,
                        self.value_str(*operand)
                    )?,
                    InstrKind::Phi { edges } => {
                        write!(f, "    %{} = phi", instr.id)?;
                        for (j, (pred, value)) in edges.iter().enumerate() {
                            if j > 0 {
                                write!(f, ",")?;
                            }
                            write!(f, " [bb{pred}: {}]", self.value_str(*value))?;
                        }
                        writeln!(f)?;
                    }
                    InstrKind::If { cond, then_blk, else_blk } => writeln!(
                        f,
                        "    if {} goto bb{then_blk} else bb{else_blk}",
                        self.value_str(*cond)
                    )?,
                    InstrKind::Jump { target } => writeln!(f, "    goto bb{target}")?,
                    InstrKind::Return { values } => {
                        write!(f, "    return")?;
                        for (j, value) in values.iter().enumerate() {
                            if j > 0 {
                                write!(f, ",")?;
                            }
                            write!(f, " {}", self.value_str(*value))?;
                        }
                        writeln!(f)?;
                    }
                }
            }
        }
        write!(f, "}}")
    }
}
