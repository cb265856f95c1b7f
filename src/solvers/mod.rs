pub mod context;
pub mod solver;
pub mod z3;

pub use context::SolverCtx;
pub use solver::{PResult, Solver};
