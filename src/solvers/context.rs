/// Owns the backend solver context. Acquired at engine construction,
/// released on drop, never shared across engine instances.
pub enum SolverCtx {
    Z3(z3::Context),
}

impl SolverCtx {
    pub fn new() -> Self {
        SolverCtx::Z3(z3::Context::new(&z3::Config::new()))
    }
}

impl Default for SolverCtx {
    fn default() -> Self {
        SolverCtx::new()
    }
}
