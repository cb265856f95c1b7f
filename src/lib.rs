//! A symbolic execution engine for a small imperative language.
//!
//! Source text is parsed and lowered into an SSA control-flow graph, then
//! explored path by path: every branch forks the interpreter state, every
//! explored path carries a condition over the entry function's parameters,
//! and terminal states record their symbolic return values. Path
//! conditions can be handed to the Z3 bridge for satisfiability checks.

pub mod analysis;
pub mod config;
pub mod error;
pub mod expr;
pub mod memory;
pub mod program;
pub mod solvers;
pub mod ssa;
pub mod symbol;
pub mod symex;

pub use crate::analysis::{analyse, analyse_with_config};
pub use crate::error::{Error, Result};
pub use crate::symbol::nstring::NString;
