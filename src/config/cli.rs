use std::path::PathBuf;

use clap::Parser;

use super::config::SelectorKind;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source file to analyse
    pub file: PathBuf,

    /// Entry function to analyse; repeatable. Defaults to every function
    /// in the file.
    #[arg(short, long = "function")]
    pub functions: Vec<String>,

    /// Interpreter step budget per function
    #[arg(long, default_value_t = 10)]
    pub steps: usize,

    /// Seed for the random path selector
    #[arg(long)]
    pub seed: Option<u64>,

    /// Exploration strategy
    #[arg(long, value_enum, default_value = "random")]
    pub selector: SelectorKind,

    /// Ask the solver whether each terminal path condition is satisfiable
    #[arg(long)]
    pub check: bool,
}
