use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use super::op::*;
use super::ty::Type;
use crate::error::{Error, Result};
use crate::symbol::nstring::NString;

/// An address into the symbolic heap. The pointer is chosen by the heap
/// that allocated it and is unique within that heap; the type tag is fixed
/// at allocation. Two references are equal iff their pointers are equal.
#[derive(Clone, Copy)]
pub struct Ref {
    pub ty: Type,
    pub ptr: u64,
}

impl PartialEq for Ref {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl Eq for Ref {}

impl Hash for Ref {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.ptr.hash(state);
    }
}

impl Debug for Ref {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06x}", self.ptr)
    }
}

#[derive(Clone, PartialEq)]
pub enum ExprKind {
    Variable(NString),
    IntConstant(i64),
    BoolConstant(bool),
    FloatConstant(f64),
    Binary { op: BinOp, lhs: Expr, rhs: Expr },
    Logical { op: LogicOp, operands: Vec<Expr> },
    Unary { op: UnOp, operand: Expr },
    Reference(Ref),
}

#[derive(PartialEq)]
struct Node {
    kind: ExprKind,
    ty: Type,
}

/// An immutable, typed expression tree. Nodes are shared by `Rc`, so
/// cloning a state never copies expressions, only handles. Constructors
/// validate their typing invariants eagerly and are the only way to build
/// an expression.
#[derive(Clone, PartialEq)]
pub struct Expr {
    node: Rc<Node>,
}

impl Expr {
    fn new(kind: ExprKind, ty: Type) -> Expr {
        Expr { node: Rc::new(Node { kind, ty }) }
    }

    pub fn variable(name: impl Into<NString>, ty: Type) -> Expr {
        Expr::new(ExprKind::Variable(name.into()), ty)
    }

    pub fn int_constant(value: i64) -> Expr {
        Expr::new(ExprKind::IntConstant(value), Type::Int)
    }

    pub fn bool_constant(value: bool) -> Expr {
        Expr::new(ExprKind::BoolConstant(value), Type::Bool)
    }

    pub fn float_constant(value: f64) -> Expr {
        Expr::new(ExprKind::FloatConstant(value), Type::Float)
    }

    pub fn reference(r: Ref) -> Expr {
        Expr::new(ExprKind::Reference(r), Type::Reference)
    }

    /// Operands must be both `bool`, both `int`, both `float`, or a mix of
    /// `int` and `float`. Comparisons produce `bool`; arithmetic keeps the
    /// wider operand type.
    pub fn binary(lhs: Expr, rhs: Expr, op: BinOp) -> Result<Expr> {
        let (lt, rt) = (lhs.ty(), rhs.ty());
        let compatible = (lt.is_bool() && rt.is_bool()) || (lt.is_numeric() && rt.is_numeric());
        if !compatible {
            return Err(Error::TypeMismatch(format!(
                "cannot apply {op:?} to {lt:?} and {rt:?}"
            )));
        }
        let ty = if op.is_comparison() {
            Type::Bool
        } else if lt == Type::Float || rt == Type::Float {
            Type::Float
        } else {
            Type::Int
        };
        Ok(Expr::new(ExprKind::Binary { op, lhs, rhs }, ty))
    }

    /// `Not` takes exactly one operand, `Implies` exactly two, `And`/`Or`
    /// at least two. All operands must be `bool`.
    pub fn logical(operands: Vec<Expr>, op: LogicOp) -> Result<Expr> {
        let arity_ok = match op {
            LogicOp::Not => operands.len() == 1,
            LogicOp::Implies => operands.len() == 2,
            LogicOp::And | LogicOp::Or => operands.len() >= 2,
        };
        if !arity_ok {
            return Err(Error::ArityMismatch {
                op: match op {
                    LogicOp::And => "&&",
                    LogicOp::Or => "||",
                    LogicOp::Not => "!",
                    LogicOp::Implies => "=>",
                },
                expected: match op {
                    LogicOp::Not => "1",
                    LogicOp::Implies => "2",
                    _ => "2 or more",
                },
                got: operands.len(),
            });
        }
        for operand in &operands {
            if !operand.ty().is_bool() {
                return Err(Error::TypeMismatch(format!(
                    "{op:?} operand has type {:?}",
                    operand.ty()
                )));
            }
        }
        Ok(Expr::new(ExprKind::Logical { op, operands }, Type::Bool))
    }

    /// Bitwise not over `int`. Arithmetic negation is `x * (-1)` and
    /// logical negation is `Logical`/`Not`.
    pub fn unary(operand: Expr, op: UnOp) -> Result<Expr> {
        if operand.ty() != Type::Int {
            return Err(Error::TypeMismatch(format!(
                "cannot apply {op:?} to {:?}",
                operand.ty()
            )));
        }
        Ok(Expr::new(ExprKind::Unary { op, operand }, Type::Int))
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Result<Expr> {
        Expr::logical(vec![lhs, rhs], LogicOp::And)
    }

    pub fn not(operand: Expr) -> Result<Expr> {
        Expr::logical(vec![operand], LogicOp::Not)
    }

    pub fn neg(operand: Expr) -> Result<Expr> {
        Expr::binary(operand, Expr::int_constant(-1), BinOp::Mul)
    }

    pub fn ty(&self) -> Type {
        self.node.ty
    }

    pub fn kind(&self) -> &ExprKind {
        &self.node.kind
    }

    pub fn is_constant(&self) -> bool {
        matches!(
            self.kind(),
            ExprKind::IntConstant(_) | ExprKind::BoolConstant(_) | ExprKind::FloatConstant(_)
        )
    }
}

impl Debug for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            ExprKind::Variable(name) => write!(f, "{name:?}"),
            ExprKind::IntConstant(v) => write!(f, "{v}"),
            ExprKind::BoolConstant(b) => write!(f, "{b}"),
            ExprKind::FloatConstant(v) => write!(f, "{v}"),
            ExprKind::Binary { op, lhs, rhs } => write!(f, "({lhs:?} {op:?} {rhs:?})"),
            ExprKind::Logical { op, operands } => match op {
                LogicOp::Not => write!(f, "!{:?}", operands[0]),
                LogicOp::Implies => write!(f, "({:?} => {:?})", operands[0], operands[1]),
                LogicOp::And | LogicOp::Or => {
                    write!(f, "(")?;
                    for (i, operand) in operands.iter().enumerate() {
                        if i > 0 {
                            write!(f, " {op:?} ")?;
                        }
                        write!(f, "{operand:?}")?;
                    }
                    write!(f, ")")
                }
            },
            ExprKind::Unary { op, operand } => write!(f, "({op:?} {operand:?})"),
            ExprKind::Reference(r) => write!(f, "{r:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_types() {
        let x = Expr::variable("x", Type::Int);
        let one = Expr::int_constant(1);
        let sum = Expr::binary(x.clone(), one.clone(), BinOp::Add).unwrap();
        assert_eq!(sum.ty(), Type::Int);

        let cmp = Expr::binary(x.clone(), one, BinOp::Gt).unwrap();
        assert_eq!(cmp.ty(), Type::Bool);

        let f = Expr::float_constant(0.5);
        let mixed = Expr::binary(x, f, BinOp::Mul).unwrap();
        assert_eq!(mixed.ty(), Type::Float);
    }

    #[test]
    fn incompatible_operands_rejected() {
        let b = Expr::bool_constant(true);
        let i = Expr::int_constant(2);
        assert!(matches!(
            Expr::binary(b.clone(), i.clone(), BinOp::Add),
            Err(Error::TypeMismatch(_))
        ));
        assert!(matches!(
            Expr::logical(vec![b, i], LogicOp::And),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn logical_arity_checked() {
        let t = Expr::bool_constant(true);
        assert!(matches!(
            Expr::logical(vec![t.clone()], LogicOp::And),
            Err(Error::ArityMismatch { .. })
        ));
        assert!(matches!(
            Expr::logical(vec![t.clone(), t.clone()], LogicOp::Not),
            Err(Error::ArityMismatch { .. })
        ));
        assert!(matches!(
            Expr::logical(vec![t.clone(), t.clone(), t], LogicOp::Implies),
            Err(Error::ArityMismatch { .. })
        ));
    }

    #[test]
    fn unary_requires_int() {
        let x = Expr::variable("x", Type::Int);
        assert_eq!(Expr::unary(x, UnOp::BitNot).unwrap().ty(), Type::Int);
        let b = Expr::bool_constant(false);
        assert!(matches!(
            Expr::unary(b, UnOp::BitNot),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn printing() {
        let x = Expr::variable("x", Type::Int);
        let y = Expr::variable("y", Type::Int);
        let gt = Expr::binary(x.clone(), Expr::int_constant(0), BinOp::Gt).unwrap();
        assert_eq!(format!("{gt:?}"), "(x > 0)");

        let both = Expr::and(
            gt.clone(),
            Expr::binary(y, Expr::int_constant(0), BinOp::Gt).unwrap(),
        )
        .unwrap();
        assert_eq!(format!("{both:?}"), "((x > 0) && (y > 0))");

        assert_eq!(format!("{:?}", Expr::not(gt.clone()).unwrap()), "!(x > 0)");

        let imp = Expr::logical(
            vec![gt, Expr::bool_constant(false)],
            LogicOp::Implies,
        )
        .unwrap();
        assert_eq!(format!("{imp:?}"), "((x > 0) => false)");

        let bnot = Expr::unary(x.clone(), UnOp::BitNot).unwrap();
        assert_eq!(format!("{bnot:?}"), "(~ x)");

        let neg = Expr::neg(x).unwrap();
        assert_eq!(format!("{neg:?}"), "(x * -1)");

        let r = Ref { ty: Type::Array, ptr: 5 };
        assert_eq!(format!("{:?}", Expr::reference(r)), "0x0005");
    }

    #[test]
    fn references_compare_by_pointer() {
        let a = Ref { ty: Type::Array, ptr: 1 };
        let b = Ref { ty: Type::Object, ptr: 1 };
        let c = Ref { ty: Type::Array, ptr: 2 };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn same_name_same_unknown() {
        let a = Expr::variable("x", Type::Int);
        let b = Expr::variable("x", Type::Int);
        assert_eq!(a, b);
    }
}
