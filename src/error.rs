use thiserror::Error;

use crate::symbol::nstring::NString;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal invariant violations. Exploration aborts on the first one; the
/// queue and any results accumulated so far are discarded with the engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Expression constructor or heap operation received incompatible types
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Logical operation constructed with the wrong operand count
    #[error("{op} takes {expected} operand(s), got {got}")]
    ArityMismatch {
        op: &'static str,
        expected: &'static str,
        got: usize,
    },

    /// Operator token outside the supported lowering subset
    #[error("unsupported operator: {0}")]
    UnsupportedOp(&'static str),

    /// Declared type outside the supported lowering subset
    #[error("unsupported type: {0:?}")]
    UnsupportedType(NString),

    /// Instruction the interpreter has no rule for
    #[error("unsupported instruction: {0}")]
    UnsupportedInstruction(&'static str),

    /// A non-constant SSA value had no local binding at resolve time
    #[error("no binding for SSA value %{0}")]
    UnboundSsa(usize),

    /// Heap access through a reference with nothing bound at its address
    #[error("dangling reference {0:?}")]
    DanglingReference(crate::expr::Ref),

    /// Read of an unassigned object field or array index
    #[error("undefined {kind} {index} at {reference:?}")]
    Undefined {
        kind: &'static str,
        index: i64,
        reference: crate::expr::Ref,
    },

    /// Solver bridge received a term of the wrong sort
    #[error("solver term has wrong sort, expected {0}")]
    SolverCast(&'static str),

    /// Front-end rejected the source text
    #[error("parse error at {line}:{col}: {msg}")]
    Parse { line: usize, col: usize, msg: String },

    /// Entry function is not present in the program
    #[error("no such function: {0:?}")]
    UnknownFunction(NString),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
