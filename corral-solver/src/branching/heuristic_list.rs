use log::trace;

use crate::branching::ActivationState;
use crate::branching::SearchHeuristic;
use crate::branching::SelectionContext;
use crate::engine::predicates::Predicate;

/// Composes several [`SearchHeuristic`]s in priority order.
///
/// Each request walks the list from the front and defers to the next entry when the current one
/// is exhausted, not yet active, or out of decisions. Because exhaustion is a permanent latch
/// on each heuristic, the walk makes progress over the lifetime of the search: an entry which
/// produced `None` once is skipped by state alone from then on.
pub struct HeuristicList {
    heuristics: Vec<Box<dyn SearchHeuristic>>,
}

impl std::fmt::Debug for HeuristicList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeuristicList")
            .field("num_heuristics", &self.heuristics.len())
            .finish()
    }
}

impl HeuristicList {
    pub fn new(heuristics: Vec<Box<dyn SearchHeuristic>>) -> Self {
        HeuristicList { heuristics }
    }

    pub fn push(&mut self, heuristic: Box<dyn SearchHeuristic>) {
        self.heuristics.push(heuristic);
    }

    /// The next decision from the highest-priority heuristic able to produce one.
    pub fn next_decision(&mut self, context: &mut SelectionContext) -> Option<Predicate> {
        for heuristic in self.heuristics.iter_mut() {
            match heuristic.state() {
                ActivationState::Exhausted => continue,
                ActivationState::Inactive => {
                    if !heuristic.check_activated(context) {
                        continue;
                    }
                }
                ActivationState::Active => {}
            }
            match heuristic.next_decision(context) {
                Some(decision) => return Some(decision),
                None => {
                    trace!("search heuristic {} is exhausted", heuristic.name());
                }
            }
        }
        None
    }
}
