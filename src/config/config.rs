use clap::ValueEnum;

use super::cli::Cli;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SelectorKind {
    Random,
    Dfs,
}

/// Engine configuration. The step budget bounds how many states the
/// scheduler drains in one exploration, as a safety net against unbounded
/// loops.
#[derive(Clone, Debug)]
pub struct Config {
    pub steps: usize,
    pub seed: Option<u64>,
    pub selector: SelectorKind,
}

impl Default for Config {
    fn default() -> Self {
        Config { steps: 10, seed: None, selector: SelectorKind::Random }
    }
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Config { steps: cli.steps, seed: cli.seed, selector: cli.selector }
    }
}
