use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatus;
use crate::corral_assert_simple;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::variables::DomainId;
use crate::propagators::bin_packing::decreasing_load_order;
use crate::propagators::bin_packing::propagate_dimension;
use crate::propagators::bin_packing::register_bins;
use crate::propagators::PackingDimension;

/// Multi-resource bin-packing propagator.
///
/// Applies the single-dimension filtering of
/// [`BinPackingPropagator`](crate::propagators::BinPackingPropagator) to every resource
/// dimension over the same bin variables. All dimensions process the undecided VMs in one
/// shared permutation, computed once from the loads of dimension 0 (decreasing, ties by
/// original index), so the pruning passes of the different resources stay consistent with each
/// other.
#[derive(Debug)]
pub struct MultiBinPackingPropagator {
    bins: Box<[DomainId]>,
    dimensions: Vec<PackingDimension>,
    order: Box<[usize]>,
}

impl MultiBinPackingPropagator {
    pub fn new(bins: Vec<DomainId>, dimensions: Vec<PackingDimension>) -> Self {
        corral_assert_simple!(
            !dimensions.is_empty(),
            "a packing needs at least one resource dimension"
        );
        corral_assert_simple!(dimensions
            .iter()
            .all(|dimension| dimension.loads.len() == bins.len()
                && dimension.capacities.len() == dimensions[0].capacities.len()));

        let order = decreasing_load_order(&dimensions[0].loads);
        MultiBinPackingPropagator {
            bins: bins.into(),
            dimensions,
            order,
        }
    }
}

impl Propagator for MultiBinPackingPropagator {
    fn name(&self) -> &str {
        "MultiBinPacking"
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        register_bins(context, &self.bins);
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatus {
        for (resource, dimension) in self.dimensions.iter().enumerate() {
            propagate_dimension(&mut context, resource, &self.bins, dimension, &self.order)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_solver::TestSolver;

    #[test]
    fn each_resource_prunes_independently() {
        // Two nodes. vm0 is memory-heavy and saturates node 0's memory; vm1 is cpu-heavy and
        // does not fit node 1's cpu. Each dimension must produce its own pruning.
        let mut solver = TestSolver::default();
        let bins: Vec<_> = (0..2).map(|_| solver.new_variable(0, 2)).collect();
        solver.set_value(bins[0], 0).expect("node 0 is a candidate");

        let memory = PackingDimension::new(vec![4, 1], vec![4, 4]);
        let cpu = PackingDimension::new(vec![1, 3], vec![8, 2]);
        let mut propagator = solver
            .new_propagator(MultiBinPackingPropagator::new(
                bins.clone(),
                vec![memory, cpu],
            ))
            .expect("the packing is feasible");
        solver
            .propagate_until_fixed_point(&mut propagator)
            .expect("the packing is feasible");

        // Memory: node 0 holds 4/4, vm1 (mem 1) no longer fits there.
        assert!(!solver.contains(bins[1], 0));
        // Cpu: node 1 has capacity 2, vm1 needs 3.
        assert!(!solver.contains(bins[1], 1));
        // Only the spare bin remains: vm1 stays waiting.
        solver.assert_bounds(bins[1], 2, 2);
    }

    #[test]
    fn conflict_names_the_overloaded_dimension() {
        let mut solver = TestSolver::default();
        let bins = vec![solver.new_variable(0, 1)];
        solver.set_value(bins[0], 0).expect("node 0 is a candidate");

        let memory = PackingDimension::new(vec![1], vec![10]);
        let cpu = PackingDimension::new(vec![5], vec![4]);
        let result =
            solver.new_propagator(MultiBinPackingPropagator::new(bins, vec![memory, cpu]));

        assert!(matches!(
            result,
            Err(Inconsistency::InfeasiblePacking {
                node: 0,
                resource: 1
            })
        ));
    }

    #[test]
    fn the_permutation_of_resource_zero_is_shared() {
        // vm0 is the largest in resource 0 but the smallest in resource 1. The shared order
        // still lets resource 1 prune correctly since the pass inspects every VM larger than
        // the slack.
        let mut solver = TestSolver::default();
        let bins: Vec<_> = (0..3).map(|_| solver.new_variable(0, 1)).collect();
        solver.set_value(bins[2], 0).expect("node 0 is a candidate");

        let r0 = PackingDimension::new(vec![9, 2, 1], vec![20]);
        let r1 = PackingDimension::new(vec![1, 6, 5], vec![8]);
        let mut propagator = solver
            .new_propagator(MultiBinPackingPropagator::new(bins.clone(), vec![r0, r1]))
            .expect("the packing is feasible");
        solver
            .propagate_until_fixed_point(&mut propagator)
            .expect("the packing is feasible");

        // In resource 1, node 0 already carries vm2 (5/8); vm1 (load 6) exceeds the slack of 3
        // and is pruned, vm0 (load 1) is not.
        assert!(!solver.contains(bins[1], 0));
        assert!(solver.contains(bins[0], 0));
    }
}
