use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::config::{Config, SelectorKind};
use crate::error::{Error, Result};
use crate::program::function::Function;
use crate::ssa;
use crate::symbol::nstring::NString;
use crate::symex::State;

/// A selector assigns every pending state a priority; the scheduler always
/// runs a state of maximum priority next. Further strategies plug in along
/// this same interface.
pub trait PathSelector {
    fn calculate_priority(&mut self, state: &State) -> u64;
}

/// Uniformly random priorities, to diversify exploration. Deterministic
/// only when seeded.
pub struct RandomPathSelector {
    rng: StdRng,
}

impl RandomPathSelector {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        RandomPathSelector { rng }
    }
}

impl PathSelector for RandomPathSelector {
    fn calculate_priority(&mut self, _state: &State) -> u64 {
        self.rng.gen()
    }
}

/// Newest state first: priorities only ever increase, so exploration digs
/// down one path before widening.
#[derive(Default)]
pub struct DepthFirstSelector {
    counter: u64,
}

impl PathSelector for DepthFirstSelector {
    fn calculate_priority(&mut self, _state: &State) -> u64 {
        self.counter += 1;
        self.counter
    }
}

fn selector_for(config: &Config) -> Box<dyn PathSelector> {
    match config.selector {
        SelectorKind::Random => Box::new(RandomPathSelector::new(config.seed)),
        SelectorKind::Dfs => Box::<DepthFirstSelector>::default(),
    }
}

struct Item {
    priority: u64,
    seq: u64,
    state: State,
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for Item {}

impl PartialOrd for Item {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Item {
    // equal priorities pop in insertion order
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// The exploration scheduler: a priority queue of pending states drained
/// one maximum-priority state per step, bounded by the step budget. The
/// budget is a coarse safety net against unbounded loops, not a semantic
/// guarantee.
pub struct Analyzer {
    selector: Box<dyn PathSelector>,
    queue: BinaryHeap<Item>,
    results: Vec<State>,
    steps: usize,
    seq: u64,
}

impl Analyzer {
    pub fn new(
        function: Rc<Function>,
        selector: Box<dyn PathSelector>,
        config: &Config,
    ) -> Result<Self> {
        let mut analyzer = Analyzer {
            selector,
            queue: BinaryHeap::new(),
            results: Vec::new(),
            steps: config.steps,
            seq: 0,
        };
        let start = State::initial(function)?;
        analyzer.push(start);
        Ok(analyzer)
    }

    fn push(&mut self, state: State) {
        let priority = self.selector.calculate_priority(&state);
        self.seq += 1;
        self.queue.push(Item { priority, seq: self.seq, state });
    }

    /// Drain the queue until it is empty or the step budget is spent;
    /// terminal states accumulate into the result list.
    pub fn run(mut self) -> Result<Vec<State>> {
        let mut step = 0;
        while step < self.steps {
            let Some(item) = self.queue.pop() else { break };
            trace!("step {step}: bb{} (priority {})", item.state.top().cur_block(), item.priority);
            let outcome = item.state.interpret_current_block()?;
            for state in outcome.successors {
                self.push(state);
            }
            self.results.extend(outcome.terminals);
            step += 1;
        }
        debug!("explored {step} step(s), {} terminal state(s)", self.results.len());
        Ok(self.results)
    }
}

/// Analyse one entry function of a source file with the default
/// configuration, returning every terminal state reached within budget.
pub fn analyse(source: &str, function_name: &str) -> Result<Vec<State>> {
    analyse_with_config(source, function_name, &Config::default())
}

pub fn analyse_with_config(
    source: &str,
    function_name: &str,
    config: &Config,
) -> Result<Vec<State>> {
    let module = ssa::parse(source)?;
    let program = ssa::build_program(&module)?;
    let name = NString::from(function_name);
    let function = program.lookup(name).ok_or(Error::UnknownFunction(name))?;
    Analyzer::new(function, selector_for(config), config)?.run()
}
