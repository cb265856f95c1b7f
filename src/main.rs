use std::fs;
use std::process::ExitCode;

use clap::Parser;

use minisym::analysis::analyse_with_config;
use minisym::config::{Cli, Config};
use minisym::solvers::{Solver, SolverCtx};
use minisym::ssa;
use minisym::Result;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let source = fs::read_to_string(&cli.file)?;

    let functions: Vec<String> = if cli.functions.is_empty() {
        let module = ssa::parse(&source)?;
        ssa::build_program(&module)?.names().map(|n| n.to_string()).collect()
    } else {
        cli.functions.clone()
    };

    let config = Config::from(cli);
    let solver_ctx = cli.check.then(SolverCtx::new);

    for name in &functions {
        println!("=== {name} ===");
        let states = analyse_with_config(&source, name, &config)?;
        let mut solver = solver_ctx.as_ref().map(Solver::new);
        for state in &states {
            println!("{state:?}");
            if let Some(solver) = solver.as_mut() {
                let verdict = solver.check(state.path_condition(), state.heap())?;
                println!("feasible: {verdict:?}");
            }
        }
    }
    Ok(())
}
