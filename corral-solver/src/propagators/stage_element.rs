use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatus;
use crate::corral_assert_simple;
use crate::engine::propagation::LocalId;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::propagation::ReadDomains;
use crate::engine::variables::DomainId;
use crate::engine::DomainEvents;
use crate::propagators::range_to_index::assert_strictly_increasing;
use crate::propagators::range_to_index::range_index;
use crate::propagators::range_to_index::range_lower;
use crate::propagators::range_to_index::range_upper;

const ID_INDEX: LocalId = LocalId::from(0);
const ID_X: LocalId = LocalId::from(1);
const ID_Y: LocalId = LocalId::from(2);

/// Piecewise step function propagator over `(idx, x, y)`: with `n` breakpoints `thresholds`
/// and `n + 1` plateau values `values`, maintains `y = values[idx]` and `x in range(idx)`
/// bidirectionally.
///
/// An update of `x` narrows `idx` (binary search over the thresholds) and thereby `y`; an
/// update of `y` removes the stages whose plateau value is no longer possible and then narrows
/// `x`; an update of `idx` narrows both `x` and `y`.
#[derive(Debug)]
pub struct StageElementPropagator {
    index: DomainId,
    x: DomainId,
    y: DomainId,
    thresholds: Vec<i32>,
    values: Vec<i32>,
}

impl StageElementPropagator {
    /// Builds the propagator and merges adjacent stages with equal plateau values (see
    /// [`StageElementPropagator::reduce_values`]).
    pub fn new(index: DomainId, x: DomainId, y: DomainId, thresholds: Vec<i32>, values: Vec<i32>) -> Self {
        assert_strictly_increasing(&thresholds);
        corral_assert_simple!(
            values.len() == thresholds.len() + 1,
            "a step function has one more plateau than it has breakpoints"
        );
        let mut propagator = StageElementPropagator {
            index,
            x,
            y,
            thresholds,
            values,
        };
        let _ = propagator.reduce_values();
        propagator
    }

    /// Merges consecutive stages with the same plateau value into one wider stage.
    ///
    /// Returns whether any merge happened. Invoked once during construction; calling it again
    /// is a no-op since no two adjacent plateaus are equal afterwards.
    pub fn reduce_values(&mut self) -> bool {
        let mut reduced = false;
        let mut stage = 0;
        while stage < self.thresholds.len() {
            if self.values[stage] == self.values[stage + 1] {
                let _ = self.values.remove(stage + 1);
                let _ = self.thresholds.remove(stage);
                reduced = true;
            } else {
                stage += 1;
            }
        }
        reduced
    }

    pub fn num_stages(&self) -> usize {
        self.values.len()
    }
}

impl Propagator for StageElementPropagator {
    fn name(&self) -> &str {
        "StageElement"
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        context.register(self.index, DomainEvents::ANY_INT, ID_INDEX);
        context.register(self.x, DomainEvents::BOUNDS, ID_X);
        context.register(self.y, DomainEvents::ANY_INT, ID_Y);
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatus {
        // x confines idx to the stages its bounds can reach.
        let low = range_index(&self.thresholds, context.lower_bound(self.x));
        let high = range_index(&self.thresholds, context.upper_bound(self.x));
        context.set_lower_bound(self.index, low as i32)?;
        context.set_upper_bound(self.index, high as i32)?;

        // Stages whose plateau value y can no longer take are gone.
        let index_low = context.lower_bound(self.index) as usize;
        let index_high = context.upper_bound(self.index) as usize;
        for stage in index_low..=index_high {
            if context.contains(self.index, stage as i32)
                && !context.contains(self.y, self.values[stage])
            {
                context.remove(self.index, stage as i32)?;
            }
        }

        // The surviving stages confine x and y.
        let index_low = context.lower_bound(self.index) as usize;
        let index_high = context.upper_bound(self.index) as usize;
        context.set_lower_bound(self.x, range_lower(&self.thresholds, index_low))?;
        context.set_upper_bound(self.x, range_upper(&self.thresholds, index_high))?;

        let mut y_low = i32::MAX;
        let mut y_high = i32::MIN;
        for stage in index_low..=index_high {
            if context.contains(self.index, stage as i32) {
                y_low = y_low.min(self.values[stage]);
                y_high = y_high.max(self.values[stage]);
            }
        }
        context.set_lower_bound(self.y, y_low)?;
        context.set_upper_bound(self.y, y_high)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_solver::TestSolver;

    /// Step function: x < 10 -> 1, 10 <= x < 20 -> 4, 20 <= x -> 2.
    fn example(solver: &mut TestSolver) -> (DomainId, DomainId, DomainId, StageElementPropagator) {
        let index = solver.new_variable(0, 2);
        let x = solver.new_variable(0, 100);
        let y = solver.new_variable(0, 10);
        let propagator =
            StageElementPropagator::new(index, x, y, vec![10, 20], vec![1, 4, 2]);
        (index, x, y, propagator)
    }

    #[test]
    fn fixing_x_fixes_stage_and_value() {
        let mut solver = TestSolver::default();
        let (index, x, y, propagator) = example(&mut solver);

        solver.set_value(x, 15).expect("15 is in the domain");
        let mut propagator = solver
            .new_propagator(propagator)
            .expect("the stages are consistent");
        solver
            .propagate_until_fixed_point(&mut propagator)
            .expect("the stages are consistent");

        solver.assert_bounds(index, 1, 1);
        solver.assert_bounds(y, 4, 4);
    }

    #[test]
    fn an_unambiguous_value_confines_x() {
        let mut solver = TestSolver::default();
        let (index, x, y, propagator) = example(&mut solver);

        solver.set_value(y, 4).expect("4 is in the domain");
        let mut propagator = solver
            .new_propagator(propagator)
            .expect("the stages are consistent");
        solver
            .propagate_until_fixed_point(&mut propagator)
            .expect("the stages are consistent");

        solver.assert_bounds(index, 1, 1);
        solver.assert_bounds(x, 10, 19);
    }

    #[test]
    fn fixing_the_stage_confines_both_sides() {
        let mut solver = TestSolver::default();
        let (index, x, y, propagator) = example(&mut solver);

        solver.set_value(index, 2).expect("2 is in the domain");
        let mut propagator = solver
            .new_propagator(propagator)
            .expect("the stages are consistent");
        solver
            .propagate_until_fixed_point(&mut propagator)
            .expect("the stages are consistent");

        solver.assert_bounds(x, 20, 100);
        solver.assert_bounds(y, 2, 2);
    }

    #[test]
    fn reduce_values_merges_equal_plateaus() {
        let mut solver = TestSolver::default();
        let index = solver.new_variable(0, 3);
        let x = solver.new_variable(0, 100);
        let y = solver.new_variable(0, 10);

        // 7, 7, 3, 3 collapses to 7, 3 with the single breakpoint 20.
        let mut propagator =
            StageElementPropagator::new(index, x, y, vec![10, 20, 30], vec![7, 7, 3, 3]);
        assert_eq!(propagator.num_stages(), 2);
        assert!(!propagator.reduce_values(), "a second reduction is a no-op");
    }
}
