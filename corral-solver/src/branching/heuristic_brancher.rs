use crate::branching::Brancher;
use crate::branching::HeuristicList;
use crate::branching::SelectionContext;
use crate::engine::predicates::Predicate;
use crate::engine::variables::DomainId;

/// Bridges a [`HeuristicList`] onto the engine's [`Brancher`] interface.
///
/// Once every heuristic in the list is exhausted (or none applies to the remaining unfixed
/// variables), the brancher falls back to fixing the first unfixed variable to its smallest
/// in-domain value. The fallback keeps the search complete: the heuristics only order the
/// exploration, they never exclude assignments.
#[derive(Debug)]
pub struct HeuristicBrancher {
    heuristics: HeuristicList,
    variables: Vec<DomainId>,
}

impl HeuristicBrancher {
    /// `variables` is the full set the search must fix, in fallback (input) order.
    pub fn new(heuristics: HeuristicList, variables: Vec<DomainId>) -> Self {
        HeuristicBrancher {
            heuristics,
            variables,
        }
    }
}

impl Brancher for HeuristicBrancher {
    fn next_decision(&mut self, context: &mut SelectionContext) -> Option<Predicate> {
        if let Some(decision) = self.heuristics.next_decision(context) {
            return Some(decision);
        }

        self.variables
            .iter()
            .find(|&&variable| !context.is_fixed(variable))
            .map(|&variable| Predicate::equal(variable, context.lower_bound(variable)))
    }
}
