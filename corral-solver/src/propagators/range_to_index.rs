use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatus;
use crate::corral_assert_simple;
use crate::engine::propagation::EnqueueDecision;
use crate::engine::propagation::LocalId;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::propagation::ReadDomains;
use crate::engine::variables::DomainId;
use crate::engine::DomainEvents;
use crate::engine::IntDomainEvent;

/// The index of the range containing `value`: the number of thresholds at or below it.
pub(crate) fn range_index(thresholds: &[i32], value: i32) -> usize {
    thresholds.partition_point(|&threshold| threshold <= value)
}

/// Inclusive lower end of range `index`; the first range is open towards negative infinity.
pub(crate) fn range_lower(thresholds: &[i32], index: usize) -> i32 {
    if index == 0 {
        i32::MIN
    } else {
        thresholds[index - 1]
    }
}

/// Inclusive upper end of range `index`; the last range is open towards positive infinity.
pub(crate) fn range_upper(thresholds: &[i32], index: usize) -> i32 {
    if index == thresholds.len() {
        i32::MAX
    } else {
        thresholds[index] - 1
    }
}

pub(crate) fn assert_strictly_increasing(thresholds: &[i32]) {
    corral_assert_simple!(
        thresholds.windows(2).all(|pair| pair[0] < pair[1]),
        "thresholds must be strictly increasing"
    );
}

const ID_X: LocalId = LocalId::from(0);
const ID_INDEX: LocalId = LocalId::from(1);

/// Channels a value variable `x` against an index variable `idx` over a monotonic set of
/// thresholds partitioning the value space into contiguous ranges: `idx = i` iff `x` lies in
/// range `i`.
///
/// A bound change on either variable prunes the bounds of the other. The constraint is entailed
/// once the bounds of `x` lie within a single range and `idx` is fixed to it; from then on
/// notifications are skipped.
#[derive(Debug)]
pub struct RangeToIndexPropagator {
    x: DomainId,
    index: DomainId,
    thresholds: Box<[i32]>,
}

impl RangeToIndexPropagator {
    pub fn new(x: DomainId, index: DomainId, thresholds: Vec<i32>) -> Self {
        assert_strictly_increasing(&thresholds);
        RangeToIndexPropagator {
            x,
            index,
            thresholds: thresholds.into(),
        }
    }

    fn is_entailed(&self, context: &PropagationContext) -> bool {
        let low = range_index(&self.thresholds, context.lower_bound(self.x));
        let high = range_index(&self.thresholds, context.upper_bound(self.x));
        low == high
            && context.is_fixed(self.index)
            && context.lower_bound(self.index) == low as i32
    }
}

impl Propagator for RangeToIndexPropagator {
    fn name(&self) -> &str {
        "RangeToIndex"
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        context.register(self.x, DomainEvents::BOUNDS, ID_X);
        context.register(self.index, DomainEvents::BOUNDS, ID_INDEX);
        Ok(())
    }

    fn notify(
        &mut self,
        context: PropagationContext,
        _local_id: LocalId,
        _event: IntDomainEvent,
    ) -> EnqueueDecision {
        if self.is_entailed(&context) {
            EnqueueDecision::Skip
        } else {
            EnqueueDecision::Enqueue
        }
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatus {
        // The ranges still reachable from x's bounds.
        let low = range_index(&self.thresholds, context.lower_bound(self.x));
        let high = range_index(&self.thresholds, context.upper_bound(self.x));
        context.set_lower_bound(self.index, low as i32)?;
        context.set_upper_bound(self.index, high as i32)?;

        // And back: x is confined to the hull of the ranges left in idx.
        let index_low = context.lower_bound(self.index) as usize;
        let index_high = context.upper_bound(self.index) as usize;
        context.set_lower_bound(self.x, range_lower(&self.thresholds, index_low))?;
        context.set_upper_bound(self.x, range_upper(&self.thresholds, index_high))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_solver::TestSolver;

    #[test]
    fn x_within_one_range_fixes_the_index() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(5, 7);
        let index = solver.new_variable(0, 3);

        let mut propagator = solver
            .new_propagator(RangeToIndexPropagator::new(x, index, vec![0, 10, 20]))
            .expect("the channeling is consistent");
        solver
            .propagate_until_fixed_point(&mut propagator)
            .expect("the channeling is consistent");

        solver.assert_bounds(index, 1, 1);
    }

    #[test]
    fn index_bounds_confine_x() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(-50, 50);
        let index = solver.new_variable(0, 3);

        let mut propagator = solver
            .new_propagator(RangeToIndexPropagator::new(x, index, vec![0, 10, 20]))
            .expect("the channeling is consistent");

        solver.set_lower_bound(index, 1).expect("1 is in the domain");
        solver.set_upper_bound(index, 2).expect("2 is in the domain");
        solver
            .propagate_until_fixed_point(&mut propagator)
            .expect("the channeling is consistent");

        solver.assert_bounds(x, 0, 19);
    }

    #[test]
    fn bound_changes_on_x_narrow_the_index() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(-50, 50);
        let index = solver.new_variable(0, 3);

        let mut propagator = solver
            .new_propagator(RangeToIndexPropagator::new(x, index, vec![0, 10, 20]))
            .expect("the channeling is consistent");

        solver.set_lower_bound(x, 12).expect("12 is in the domain");
        solver
            .propagate_until_fixed_point(&mut propagator)
            .expect("the channeling is consistent");

        solver.assert_bounds(index, 2, 3);
    }

    #[test]
    fn entailment_skips_notifications() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(5, 7);
        let index = solver.new_variable(0, 3);

        let mut propagator = solver
            .new_propagator(RangeToIndexPropagator::new(x, index, vec![0, 10, 20]))
            .expect("the channeling is consistent");
        solver
            .propagate_until_fixed_point(&mut propagator)
            .expect("the channeling is consistent");

        // idx is fixed and x cannot leave its range: further bound changes are ignored.
        solver.set_lower_bound(x, 6).expect("6 is in the domain");
        let context = crate::engine::propagation::PropagationContext::new(&solver.assignments);
        let decision = propagator.notify(context, ID_X, IntDomainEvent::LowerBound);
        assert_eq!(decision, EnqueueDecision::Skip);
    }
}
