use crate::error::{Error, Result};
use crate::expr::{BinOp, Expr, LogicOp, Type};
use crate::program::function::{BasicKind, BinToken, UnToken};

/// Lowering from SSA operator tokens and declared kinds into the
/// expression algebra. The mapping is total over what the language
/// guarantees to produce and rejects the rest; it is pure, so lowering the
/// same SSA twice yields structurally equal trees.

pub fn lower_bin_op(op: BinToken, x: Expr, y: Expr) -> Result<Expr> {
    match op {
        BinToken::Add => Expr::binary(x, y, BinOp::Add),
        BinToken::Sub => Expr::binary(x, y, BinOp::Sub),
        BinToken::Mul => Expr::binary(x, y, BinOp::Mul),
        BinToken::Div => Expr::binary(x, y, BinOp::Div),
        BinToken::Rem => Expr::binary(x, y, BinOp::Mod),
        BinToken::EqEq => Expr::binary(x, y, BinOp::Eq),
        BinToken::NotEq => Expr::binary(x, y, BinOp::Ne),
        BinToken::Lt => Expr::binary(x, y, BinOp::Lt),
        BinToken::Le => Expr::binary(x, y, BinOp::Le),
        BinToken::Gt => Expr::binary(x, y, BinOp::Gt),
        BinToken::Ge => Expr::binary(x, y, BinOp::Ge),
        BinToken::AndAnd => Expr::logical(vec![x, y], LogicOp::And),
        BinToken::OrOr => Expr::logical(vec![x, y], LogicOp::Or),
        // present in the algebra, not produced by this lowering
        BinToken::BitAnd | BinToken::BitOr | BinToken::BitXor | BinToken::Shl | BinToken::Shr => {
            Err(Error::UnsupportedOp(op.token()))
        }
    }
}

pub fn lower_un_op(op: UnToken, x: Expr) -> Result<Expr> {
    match op {
        UnToken::Neg => Expr::neg(x),
        UnToken::Not => Expr::not(x),
        UnToken::BitNot => Err(Error::UnsupportedOp(op.token())),
    }
}

pub fn lower_type(kind: BasicKind) -> Result<Type> {
    match kind {
        BasicKind::Int => Ok(Type::Int),
        BasicKind::Bool => Ok(Type::Bool),
        BasicKind::Float => Err(Error::UnsupportedType(format!("{kind:?}").into())),
    }
}
