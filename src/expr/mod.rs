pub mod expr;
pub mod op;
pub mod ty;

pub use expr::{Expr, ExprKind, Ref};
pub use op::{BinOp, LogicOp, UnOp};
pub use ty::Type;
