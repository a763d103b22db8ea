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

/// One resource dimension of a packing problem: per-VM loads, per-node capacities, and the
/// constant baseline load every node carries independently of hosted VMs (e.g. hypervisor
/// overhead).
#[derive(Debug, Clone)]
pub struct PackingDimension {
    pub loads: Box<[i64]>,
    pub capacities: Box<[i64]>,
    pub additional_uses: Box<[i64]>,
}

impl PackingDimension {
    /// A dimension without baseline load.
    pub fn new(loads: Vec<i64>, capacities: Vec<i64>) -> Self {
        let additional_uses = vec![0; capacities.len()].into();
        PackingDimension {
            loads: loads.into(),
            capacities: capacities.into(),
            additional_uses,
        }
    }

    pub fn with_additional_uses(mut self, additional_uses: Vec<i64>) -> Self {
        corral_assert_simple!(additional_uses.len() == self.capacities.len());
        self.additional_uses = additional_uses.into();
        self
    }
}

/// The VM processing order shared by every dimension of a packing propagator: decreasing load,
/// ties broken by the original VM index (the sort is stable).
pub(crate) fn decreasing_load_order(loads: &[i64]) -> Box<[usize]> {
    let mut order: Vec<usize> = (0..loads.len()).collect();
    order.sort_by(|&a, &b| loads[b].cmp(&loads[a]));
    order.into()
}

/// The filtering pass for one resource dimension.
///
/// `bins[vm]` ranges over the node indices `0..capacities.len()`, plus the spare bin
/// `capacities.len()` for VMs left waiting. The spare bin absorbs whatever load is not placed
/// on a node, so the sum of all loads is conserved without a capacity check on it.
pub(crate) fn propagate_dimension(
    context: &mut PropagationContextMut,
    resource: usize,
    bins: &[DomainId],
    dimension: &PackingDimension,
    order: &[usize],
) -> PropagationStatus {
    let num_nodes = dimension.capacities.len();

    // The load which must land on each node (fixed VMs plus the baseline), and the load which
    // could still land there (adding every undecided VM that admits the node).
    let mut mandatory: Vec<i64> = dimension.additional_uses.to_vec();
    let mut potential: Vec<i64> = dimension.additional_uses.to_vec();
    for (vm, &bin) in bins.iter().enumerate() {
        let load = dimension.loads[vm];
        if context.is_fixed(bin) {
            let node = context.lower_bound(bin) as usize;
            if node < num_nodes {
                mandatory[node] += load;
                potential[node] += load;
            }
        } else {
            for (node, slot) in potential.iter_mut().enumerate() {
                if context.contains(bin, node as i32) {
                    *slot += load;
                }
            }
        }
    }

    for node in 0..num_nodes {
        if mandatory[node] > dimension.capacities[node] {
            return Err(Inconsistency::InfeasiblePacking { node, resource });
        }
        if potential[node] <= dimension.capacities[node] {
            // Every subset of the candidate VMs fits; nothing to prune for this node.
            continue;
        }

        let slack = dimension.capacities[node] - mandatory[node];
        for &vm in order {
            let load = dimension.loads[vm];
            if load <= slack {
                // Fits on its own; zero-load VMs always end up here since the slack is
                // non-negative. The permutation is shared across dimensions, so the loads of
                // this dimension are not necessarily decreasing and the scan must go on.
                continue;
            }
            if !context.is_fixed(bins[vm]) && context.contains(bins[vm], node as i32) {
                context.remove(bins[vm], node as i32)?;
            }
        }
    }

    Ok(())
}

pub(crate) fn register_bins(
    context: &mut PropagatorInitialisationContext,
    bins: &[DomainId],
) {
    for (vm, &bin) in bins.iter().enumerate() {
        context.register(bin, DomainEvents::ANY_INT, LocalId::from(vm as u32));
    }
}

/// Single-resource bin-packing propagator.
///
/// Keeps, for every node, the aggregate load of the VMs which can still be assigned to it
/// within the node's capacity: VMs too large for a node's remaining mandatory-free capacity
/// lose that node from their bin domain, and a node whose mandatory load alone exceeds its
/// capacity is reported as an infeasible packing.
#[derive(Debug)]
pub struct BinPackingPropagator {
    bins: Box<[DomainId]>,
    dimension: PackingDimension,
    order: Box<[usize]>,
}

impl BinPackingPropagator {
    pub fn new(bins: Vec<DomainId>, dimension: PackingDimension) -> Self {
        corral_assert_simple!(bins.len() == dimension.loads.len());
        let order = decreasing_load_order(&dimension.loads);
        BinPackingPropagator {
            bins: bins.into(),
            dimension,
            order,
        }
    }
}

impl Propagator for BinPackingPropagator {
    fn name(&self) -> &str {
        "BinPacking"
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        register_bins(context, &self.bins);
        Ok(())
    }

    fn propagate(&mut self, mut context: PropagationContextMut) -> PropagationStatus {
        propagate_dimension(&mut context, 0, &self.bins, &self.dimension, &self.order)
    }
}
