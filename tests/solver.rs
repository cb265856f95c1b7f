use minisym::analysis::analyse;
use minisym::error::Error;
use minisym::expr::{BinOp, Expr, LogicOp, Type};
use minisym::memory::SymbolicHeap;
use minisym::solvers::z3::z3_conv::Z3Conv;
use minisym::solvers::{PResult, Solver, SolverCtx};

fn gt_zero(name: &str) -> Expr {
    Expr::binary(
        Expr::variable(name, Type::Int),
        Expr::int_constant(0),
        BinOp::Gt,
    )
    .unwrap()
}

#[test]
fn variables_are_interned_by_name() {
    let solver_ctx = SolverCtx::new();
    let SolverCtx::Z3(z3_ctx) = &solver_ctx;
    let mut conv = Z3Conv::new(z3_ctx);
    let heap = SymbolicHeap::new();

    let x = Expr::variable("x", Type::Int);
    let first = conv.convert(&x, &heap).unwrap();
    let second = conv.convert(&x, &heap).unwrap();
    assert_eq!(first, second);

    // reset clears the interning map; the context survives
    conv.reset();
    let third = conv.convert(&x, &heap).unwrap();
    assert_eq!(first, third);
}

#[test]
fn satisfiable_and_contradictory_conditions() {
    let solver_ctx = SolverCtx::new();
    let mut solver = Solver::new(&solver_ctx);
    let heap = SymbolicHeap::new();

    let pc = gt_zero("x");
    assert_eq!(solver.check(&pc, &heap).unwrap(), PResult::PSat);

    let contradiction = Expr::and(pc.clone(), Expr::not(pc).unwrap()).unwrap();
    assert_eq!(solver.check(&contradiction, &heap).unwrap(), PResult::PUnsat);
}

#[test]
fn implication_and_disjunction_translate() {
    let solver_ctx = SolverCtx::new();
    let mut solver = Solver::new(&solver_ctx);
    let heap = SymbolicHeap::new();

    let x = gt_zero("x");
    let y = gt_zero("y");
    let implies = Expr::logical(vec![x.clone(), y.clone()], LogicOp::Implies).unwrap();
    assert_eq!(solver.check(&implies, &heap).unwrap(), PResult::PSat);

    let or = Expr::logical(vec![x, y], LogicOp::Or).unwrap();
    assert_eq!(solver.check(&or, &heap).unwrap(), PResult::PSat);
}

#[test]
fn array_variables_get_a_constant_array() {
    let solver_ctx = SolverCtx::new();
    let SolverCtx::Z3(z3_ctx) = &solver_ctx;
    let mut conv = Z3Conv::new(z3_ctx);
    let heap = SymbolicHeap::new();

    let a = Expr::variable("a", Type::Array);
    let term = conv.convert(&a, &heap).unwrap();
    assert!(term.as_array().is_some());
}

#[test]
fn ill_sorted_operands_are_cast_errors() {
    // the algebra admits arithmetic over two booleans; the bridge does not
    let weird = Expr::binary(
        Expr::bool_constant(true),
        Expr::bool_constant(false),
        BinOp::Add,
    )
    .unwrap();

    let solver_ctx = SolverCtx::new();
    let SolverCtx::Z3(z3_ctx) = &solver_ctx;
    let mut conv = Z3Conv::new(z3_ctx);
    let heap = SymbolicHeap::new();
    assert!(matches!(
        conv.convert(&weird, &heap),
        Err(Error::SolverCast("Int"))
    ));
}

#[test]
fn dangling_reference_is_reported() {
    let mut heap = SymbolicHeap::new();
    let r = heap.allocate(Type::Int);
    let expr = Expr::reference(r);

    let solver_ctx = SolverCtx::new();
    let SolverCtx::Z3(z3_ctx) = &solver_ctx;
    let mut conv = Z3Conv::new(z3_ctx);
    assert!(matches!(
        conv.convert(&expr, &heap),
        Err(Error::DanglingReference(_))
    ));
}

#[test]
fn floats_have_no_translation() {
    let solver_ctx = SolverCtx::new();
    let SolverCtx::Z3(z3_ctx) = &solver_ctx;
    let mut conv = Z3Conv::new(z3_ctx);
    let heap = SymbolicHeap::new();
    assert!(matches!(
        conv.convert(&Expr::float_constant(1.5), &heap),
        Err(Error::UnsupportedType(_))
    ));
}

#[test]
fn explored_branches_are_feasible() {
    let states =
        analyse("f(x) { if (x > 0) { return 1; } else { return -1; } }", "f").unwrap();
    assert_eq!(states.len(), 2);

    let solver_ctx = SolverCtx::new();
    let mut solver = Solver::new(&solver_ctx);
    for state in &states {
        assert_eq!(
            solver.check(state.path_condition(), state.heap()).unwrap(),
            PResult::PSat
        );
    }
}
