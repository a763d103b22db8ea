use crate::basic_types::Solution;
use crate::branching::SelectionContext;
use crate::engine::predicates::Predicate;

/// A trait for defining a branching strategy.
///
/// Implementations control how the engine's depth-first search explores the search space. A
/// returned decision must shrink the domain of at least one variable; returning [`None`]
/// signals that every variable under consideration is fixed, upon which the engine reports the
/// current assignment as a solution.
pub trait Brancher {
    /// Returns the next decision, or [`None`] if all variables under consideration are
    /// assigned.
    fn next_decision(&mut self, context: &mut SelectionContext) -> Option<Predicate>;

    /// Called after a conflict has been detected, before the search backtracks.
    fn on_conflict(&mut self) {}

    /// Called for every decision level the search undoes.
    fn on_backtrack(&mut self) {}

    /// Called when the search found a full assignment.
    fn on_solution(&mut self, _solution: &Solution) {}
}
