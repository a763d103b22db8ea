use std::collections::VecDeque;

use log::debug;

use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatus;
use crate::basic_types::Solution;
use crate::branching::Brancher;
use crate::branching::SelectionContext;
use crate::containers::KeyedVec;
use crate::corral_assert_moderate;
use crate::corral_assert_simple;
use crate::engine::predicates::Predicate;
use crate::engine::propagation::EnqueueDecision;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorId;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::propagation::WatchListCP;
use crate::engine::termination::TerminationCondition;
use crate::engine::variables::DomainId;
use crate::engine::Assignments;

/// The outcome of [`ConstraintSolver::satisfy`].
#[derive(Debug)]
pub enum SatisfactionResult {
    /// A full assignment satisfying every propagator was found.
    Satisfiable(Solution),
    /// The search space was exhausted without finding a solution.
    Unsatisfiable,
    /// The termination condition triggered before a conclusion was reached.
    Unknown,
}

/// The outcome of [`ConstraintSolver::minimise`].
#[derive(Debug)]
pub enum OptimisationResult {
    /// The returned solution was proven to minimise the objective.
    Optimal(Solution),
    /// The budget ran out; the returned solution is the best incumbent found so far.
    Satisfiable(Solution),
    /// The search space was exhausted without finding any solution.
    Unsatisfiable,
    /// The budget ran out before any solution was found.
    Unknown,
}

/// Counters maintained during search and reported through [`log`] when a search concludes.
#[derive(Debug, Copy, Clone, Default)]
pub struct SolverStatistics {
    pub num_decisions: u64,
    pub num_conflicts: u64,
    pub num_propagations: u64,
    pub num_solutions: u64,
}

impl SolverStatistics {
    fn log_statistics(&self) {
        debug!(
            "search concluded: {} decisions, {} conflicts, {} propagator runs, {} solutions",
            self.num_decisions, self.num_conflicts, self.num_propagations, self.num_solutions
        );
    }
}

/// A minimal constraint engine: a backtrackable domain store, a propagator store with
/// event-driven scheduling, and a depth-first search parameterised by a [`Brancher`] and a
/// [`TerminationCondition`].
///
/// One engine instance owns one search; independent solves must each create their own instance
/// (and their own copy of any shared input), which makes running them on separate threads safe.
#[derive(Default)]
pub struct ConstraintSolver {
    assignments: Assignments,
    propagators: KeyedVec<PropagatorId, Box<dyn Propagator>>,
    watch_list: WatchListCP,
    queue: VecDeque<PropagatorId>,
    enqueued: KeyedVec<PropagatorId, bool>,
    statistics: SolverStatistics,
}

impl std::fmt::Debug for ConstraintSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintSolver")
            .field("num_domains", &self.assignments.num_domains())
            .field("num_propagators", &self.propagators.len())
            .finish()
    }
}

impl ConstraintSolver {
    /// Creates a new integer variable with the inclusive domain `[lower_bound, upper_bound]`.
    pub fn new_bounded_integer(&mut self, lower_bound: i32, upper_bound: i32) -> DomainId {
        self.watch_list.grow();
        self.assignments.grow(lower_bound, upper_bound)
    }

    /// Applies a predicate at the root of the search; used to encode givens such as pinned
    /// placements. Fails if the predicate is incompatible with the current root domains.
    pub fn post_at_root(&mut self, predicate: Predicate) -> PropagationStatus {
        corral_assert_simple!(self.assignments.get_decision_level() == 0);
        self.assignments.post(predicate)?;
        self.propagate_to_fixpoint()
    }

    /// Registers a propagator, initialises it at the root, and propagates to a fixpoint.
    ///
    /// An [`Err`] means the problem is infeasible at the root.
    pub fn add_propagator(
        &mut self,
        propagator: impl Propagator + 'static,
    ) -> Result<(), Inconsistency> {
        let propagator_id = self.propagators.push(Box::new(propagator));
        let _ = self.enqueued.push(false);

        let Self {
            assignments,
            propagators,
            watch_list,
            ..
        } = self;
        let mut context =
            PropagatorInitialisationContext::new(watch_list, propagator_id, assignments);
        propagators[propagator_id].initialise_at_root(&mut context)?;

        self.queue.push_back(propagator_id);
        self.enqueued[propagator_id] = true;
        self.propagate_to_fixpoint()
    }

    pub fn lower_bound(&self, domain: DomainId) -> i32 {
        self.assignments.get_lower_bound(domain)
    }

    pub fn upper_bound(&self, domain: DomainId) -> i32 {
        self.assignments.get_upper_bound(domain)
    }

    pub fn contains(&self, domain: DomainId, value: i32) -> bool {
        self.assignments.is_value_in_domain(domain, value)
    }

    pub fn statistics(&self) -> SolverStatistics {
        self.statistics
    }

    /// Searches for any full assignment accepted by all propagators.
    pub fn satisfy(
        &mut self,
        brancher: &mut impl Brancher,
        termination: &mut impl TerminationCondition,
    ) -> SatisfactionResult {
        corral_assert_simple!(
            self.assignments.get_decision_level() == 0,
            "search must start at the root"
        );
        let mut decisions: Vec<Predicate> = Vec::new();
        let mut conflict = false;

        loop {
            if termination.should_stop() {
                self.statistics.log_statistics();
                return SatisfactionResult::Unknown;
            }

            if conflict {
                conflict = false;
                self.statistics.num_conflicts += 1;
                termination.on_backtrack();
                brancher.on_conflict();
                loop {
                    let Some(decision) = decisions.pop() else {
                        self.statistics.log_statistics();
                        return SatisfactionResult::Unsatisfiable;
                    };
                    self.backtrack_to(self.assignments.get_decision_level() - 1);
                    brancher.on_backtrack();
                    if self.assignments.post(decision.negation()).is_ok() {
                        break;
                    }
                    // The negation wipes out the domain as well: the conflict lies deeper.
                }
                continue;
            }

            if self.propagate_to_fixpoint().is_err() {
                conflict = true;
                continue;
            }

            let mut context = SelectionContext::new(&self.assignments);
            match brancher.next_decision(&mut context) {
                None => {
                    let solution = self.extract_solution();
                    self.statistics.num_solutions += 1;
                    brancher.on_solution(&solution);
                    self.statistics.log_statistics();
                    return SatisfactionResult::Satisfiable(solution);
                }
                Some(decision) => {
                    self.statistics.num_decisions += 1;
                    termination.on_decision();
                    self.assignments.increase_decision_level();
                    decisions.push(decision);
                    if self.assignments.post(decision).is_err() {
                        conflict = true;
                    }
                }
            }
        }
    }

    /// Minimises `objective` by iteratively tightening its upper bound below each incumbent.
    ///
    /// Budget exhaustion returns the best incumbent through
    /// [`OptimisationResult::Satisfiable`]; it is a normal outcome, not an error.
    pub fn minimise(
        &mut self,
        brancher: &mut impl Brancher,
        termination: &mut impl TerminationCondition,
        objective: DomainId,
    ) -> OptimisationResult {
        let mut best: Option<Solution> = None;

        loop {
            match self.satisfy(brancher, termination) {
                SatisfactionResult::Satisfiable(solution) => {
                    let value = solution.value(objective);
                    debug!("incumbent with objective value {value}");
                    best = Some(solution);
                    self.backtrack_to(0);
                    if self
                        .assignments
                        .post(Predicate::upper_bound(objective, value - 1))
                        .is_err()
                    {
                        return OptimisationResult::Optimal(
                            best.expect("an incumbent was just stored"),
                        );
                    }
                }
                SatisfactionResult::Unsatisfiable => {
                    return match best.take() {
                        Some(solution) => OptimisationResult::Optimal(solution),
                        None => OptimisationResult::Unsatisfiable,
                    };
                }
                SatisfactionResult::Unknown => {
                    return match best.take() {
                        Some(solution) => OptimisationResult::Satisfiable(solution),
                        None => OptimisationResult::Unknown,
                    };
                }
            }
        }
    }

    /// Undoes the search down to `level` and lets every propagator rebuild its incremental
    /// state from the restored domains.
    pub fn backtrack_to(&mut self, level: usize) {
        self.assignments.backtrack_to(level);
        self.queue.clear();
        self.enqueued.iter_mut().for_each(|flag| *flag = false);

        let Self {
            assignments,
            propagators,
            ..
        } = self;
        let context = PropagationContext::new(assignments);
        propagators
            .iter_mut()
            .for_each(|propagator| propagator.synchronise(context));
    }

    fn extract_solution(&self) -> Solution {
        let mut values = KeyedVec::default();
        for domain in self.assignments.domains() {
            corral_assert_moderate!(
                self.assignments.is_domain_assigned(domain),
                "solutions may only be extracted from full assignments"
            );
            let _ = values.push(self.assignments.get_lower_bound(domain));
        }
        Solution::new(values)
    }

    fn propagate_to_fixpoint(&mut self) -> PropagationStatus {
        loop {
            self.notify_watchers();

            let Some(propagator_id) = self.queue.pop_front() else {
                return Ok(());
            };
            self.enqueued[propagator_id] = false;
            self.statistics.num_propagations += 1;

            let Self {
                assignments,
                propagators,
                ..
            } = self;
            let context = PropagationContextMut::new(assignments);
            if let Err(inconsistency) = propagators[propagator_id].propagate(context) {
                debug!(
                    "conflict reported by {}: {:?}",
                    self.propagators[propagator_id].name(),
                    inconsistency
                );
                self.queue.clear();
                self.enqueued.iter_mut().for_each(|flag| *flag = false);
                let _ = self.assignments.drain_events();
                return Err(inconsistency);
            }
        }
    }

    /// Routes pending domain events to the watching propagators and schedules those that
    /// request it.
    fn notify_watchers(&mut self) {
        loop {
            let events = self.assignments.drain_events();
            if events.is_empty() {
                return;
            }

            let Self {
                assignments,
                propagators,
                watch_list,
                queue,
                enqueued,
                ..
            } = self;
            for (domain, event) in events {
                for watcher in watch_list.watchers(domain) {
                    if !watcher.events.contains(event) {
                        continue;
                    }
                    let context = PropagationContext::new(assignments);
                    let decision =
                        propagators[watcher.propagator].notify(context, watcher.local_id, event);
                    if decision == EnqueueDecision::Enqueue && !enqueued[watcher.propagator] {
                        queue.push_back(watcher.propagator);
                        enqueued[watcher.propagator] = true;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branching::HeuristicBrancher;
    use crate::branching::HeuristicList;
    use crate::engine::termination::BacktrackBudget;
    use crate::engine::termination::Indefinite;
    use crate::propagators::BinPackingPropagator;
    use crate::propagators::PackingDimension;

    fn input_order_brancher(variables: Vec<DomainId>) -> HeuristicBrancher {
        HeuristicBrancher::new(HeuristicList::new(Vec::new()), variables)
    }

    #[test]
    fn search_packs_two_vms_onto_distinct_nodes() {
        // Two load-1 VMs, two capacity-1 nodes. Fixing the first VM onto node 0 forces the
        // packer to send the second one to node 1.
        let mut solver = ConstraintSolver::default();
        let bins: Vec<_> = (0..2).map(|_| solver.new_bounded_integer(0, 2)).collect();
        solver
            .add_propagator(BinPackingPropagator::new(
                bins.clone(),
                PackingDimension::new(vec![1, 1], vec![1, 1]),
            ))
            .expect("the packing is feasible at the root");

        let mut brancher = input_order_brancher(bins.clone());
        let result = solver.satisfy(&mut brancher, &mut Indefinite);

        let SatisfactionResult::Satisfiable(solution) = result else {
            panic!("a packing exists");
        };
        assert_eq!(solution.value(bins[0]), 0);
        assert_eq!(solution.value(bins[1]), 1);
    }

    #[test]
    fn search_backtracks_out_of_dead_ends() {
        // Three load-2 VMs over two capacity-3 nodes and no spare: only one VM fits per
        // node, so the instance is unsatisfiable and the search must prove it.
        let mut solver = ConstraintSolver::default();
        let bins: Vec<_> = (0..3).map(|_| solver.new_bounded_integer(0, 1)).collect();
        let result = solver.add_propagator(BinPackingPropagator::new(
            bins.clone(),
            PackingDimension::new(vec![2, 2, 2], vec![3, 3]),
        ));

        if result.is_ok() {
            let mut brancher = input_order_brancher(bins);
            assert!(matches!(
                solver.satisfy(&mut brancher, &mut Indefinite),
                SatisfactionResult::Unsatisfiable
            ));
        }
    }

    #[test]
    fn minimise_drives_the_objective_to_its_floor() {
        let mut solver = ConstraintSolver::default();
        let objective = solver.new_bounded_integer(3, 9);

        let mut brancher = input_order_brancher(vec![objective]);
        let result = solver.minimise(&mut brancher, &mut Indefinite, objective);

        let OptimisationResult::Optimal(solution) = result else {
            panic!("the objective has a floor");
        };
        assert_eq!(solution.value(objective), 3);
    }

    #[test]
    fn an_exhausted_budget_reports_unknown() {
        let mut solver = ConstraintSolver::default();
        let bins: Vec<_> = (0..3).map(|_| solver.new_bounded_integer(0, 1)).collect();
        let result = solver.add_propagator(BinPackingPropagator::new(
            bins.clone(),
            PackingDimension::new(vec![2, 2, 2], vec![3, 3]),
        ));

        if result.is_ok() {
            // Zero backtracks allowed: the unsatisfiable instance cannot be refuted in time.
            let mut termination = BacktrackBudget::new(0);
            let mut brancher = input_order_brancher(bins);
            assert!(matches!(
                solver.satisfy(&mut brancher, &mut termination),
                SatisfactionResult::Unknown
            ));
        }
    }
}

