#![cfg(any(test, doc))]
//! This module exposes helpers that aid testing of propagators. The [`TestSolver`] allows
//! setting up specific scenarios under which to test the various operations of a propagator.

use crate::basic_types::EmptyDomain;
use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatus;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorId;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::propagation::WatchListCP;
use crate::engine::variables::DomainId;
use crate::engine::Assignments;

/// A container for variables and domains which can be used to test propagators in isolation,
/// without the engine's scheduling around them.
#[derive(Debug, Default)]
pub(crate) struct TestSolver {
    pub(crate) assignments: Assignments,
    watch_list: WatchListCP,
    next_propagator_id: u32,
}

pub(crate) type BoxedPropagator = Box<dyn Propagator>;

impl std::fmt::Debug for BoxedPropagator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "test_solver::Propagator({})", self.name())
    }
}

impl TestSolver {
    pub(crate) fn new_variable(&mut self, lower_bound: i32, upper_bound: i32) -> DomainId {
        self.watch_list.grow();
        self.assignments.grow(lower_bound, upper_bound)
    }

    /// Initialises the propagator at the root and runs its first propagation.
    pub(crate) fn new_propagator(
        &mut self,
        propagator: impl Propagator + 'static,
    ) -> Result<BoxedPropagator, Inconsistency> {
        let id = PropagatorId(self.next_propagator_id);
        self.next_propagator_id += 1;

        let mut propagator: BoxedPropagator = Box::new(propagator);
        let mut context =
            PropagatorInitialisationContext::new(&mut self.watch_list, id, &self.assignments);
        propagator.initialise_at_root(&mut context)?;
        self.propagate(&mut propagator)?;

        Ok(propagator)
    }

    pub(crate) fn propagate(&mut self, propagator: &mut BoxedPropagator) -> PropagationStatus {
        let context = PropagationContextMut::new(&mut self.assignments);
        propagator.propagate(context)
    }

    /// Repeatedly propagates until the propagator stops changing the domains.
    pub(crate) fn propagate_until_fixed_point(
        &mut self,
        propagator: &mut BoxedPropagator,
    ) -> PropagationStatus {
        loop {
            let num_trail_entries = self.assignments.num_trail_entries();
            self.propagate(propagator)?;
            if self.assignments.num_trail_entries() == num_trail_entries {
                return Ok(());
            }
        }
    }

    pub(crate) fn set_lower_bound(
        &mut self,
        domain: DomainId,
        bound: i32,
    ) -> Result<(), EmptyDomain> {
        self.assignments.tighten_lower_bound(domain, bound)
    }

    pub(crate) fn set_upper_bound(
        &mut self,
        domain: DomainId,
        bound: i32,
    ) -> Result<(), EmptyDomain> {
        self.assignments.tighten_upper_bound(domain, bound)
    }

    pub(crate) fn set_value(&mut self, domain: DomainId, value: i32) -> Result<(), EmptyDomain> {
        self.assignments.make_assignment(domain, value)
    }

    pub(crate) fn remove(&mut self, domain: DomainId, value: i32) -> Result<(), EmptyDomain> {
        self.assignments.remove_value_from_domain(domain, value)
    }

    pub(crate) fn lower_bound(&self, domain: DomainId) -> i32 {
        self.assignments.get_lower_bound(domain)
    }

    pub(crate) fn upper_bound(&self, domain: DomainId) -> i32 {
        self.assignments.get_upper_bound(domain)
    }

    pub(crate) fn contains(&self, domain: DomainId, value: i32) -> bool {
        self.assignments.is_value_in_domain(domain, value)
    }

    pub(crate) fn assert_bounds(&self, domain: DomainId, lower_bound: i32, upper_bound: i32) {
        assert_eq!(
            (lower_bound, upper_bound),
            (self.lower_bound(domain), self.upper_bound(domain)),
            "bounds of {domain} were not as expected"
        );
    }
}
