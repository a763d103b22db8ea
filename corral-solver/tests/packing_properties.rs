//! Properties of the packing propagators: soundness on random instances (solutions found by
//! the search never violate a capacity) and completeness on small instances (root propagation
//! never prunes a value which participates in a feasible assignment).

use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

use corral_solver::branching::HeuristicBrancher;
use corral_solver::branching::HeuristicList;
use corral_solver::engine::termination::Indefinite;
use corral_solver::engine::variables::DomainId;
use corral_solver::engine::ConstraintSolver;
use corral_solver::engine::SatisfactionResult;
use corral_solver::propagators::MultiBinPackingPropagator;
use corral_solver::propagators::PackingDimension;

struct Instance {
    num_nodes: usize,
    /// Per resource, per VM.
    loads: Vec<Vec<i64>>,
    /// Per resource, per node.
    capacities: Vec<Vec<i64>>,
}

impl Instance {
    fn random(rng: &mut SmallRng, max_nodes: usize, max_vms: usize) -> Self {
        let num_nodes = rng.gen_range(2..=max_nodes);
        let num_vms = rng.gen_range(2..=max_vms);
        let num_resources = rng.gen_range(1..=2);
        let loads = (0..num_resources)
            .map(|_| (0..num_vms).map(|_| rng.gen_range(0..=5)).collect())
            .collect();
        let capacities = (0..num_resources)
            .map(|_| (0..num_nodes).map(|_| rng.gen_range(0..=8)).collect())
            .collect();
        Instance {
            num_nodes,
            loads,
            capacities,
        }
    }

    fn num_vms(&self) -> usize {
        self.loads[0].len()
    }

    fn dimensions(&self) -> Vec<PackingDimension> {
        self.loads
            .iter()
            .zip(&self.capacities)
            .map(|(loads, capacities)| PackingDimension::new(loads.clone(), capacities.clone()))
            .collect()
    }

    /// Whether an assignment of VMs to bins (the spare bin included) respects every capacity.
    fn is_feasible(&self, assignment: &[usize]) -> bool {
        for (loads, capacities) in self.loads.iter().zip(&self.capacities) {
            for (node, &capacity) in capacities.iter().enumerate() {
                let total: i64 = assignment
                    .iter()
                    .zip(loads)
                    .filter(|(&bin, _)| bin == node)
                    .map(|(_, &load)| load)
                    .sum();
                if total > capacity {
                    return false;
                }
            }
        }
        true
    }
}

fn encode(instance: &Instance) -> (ConstraintSolver, Vec<DomainId>, bool) {
    let mut solver = ConstraintSolver::default();
    let bins: Vec<DomainId> = (0..instance.num_vms())
        .map(|_| solver.new_bounded_integer(0, instance.num_nodes as i32))
        .collect();
    let feasible_at_root = solver
        .add_propagator(MultiBinPackingPropagator::new(
            bins.clone(),
            instance.dimensions(),
        ))
        .is_ok();
    (solver, bins, feasible_at_root)
}

#[test]
fn solutions_found_by_the_search_respect_every_capacity() {
    for seed in 0..60 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let instance = Instance::random(&mut rng, 5, 7);
        let (mut solver, bins, feasible_at_root) = encode(&instance);
        assert!(
            feasible_at_root,
            "seed {seed}: nothing is assigned at the root, no node can be overloaded yet"
        );

        let mut brancher = HeuristicBrancher::new(HeuristicList::new(Vec::new()), bins.clone());
        match solver.satisfy(&mut brancher, &mut Indefinite) {
            SatisfactionResult::Satisfiable(solution) => {
                let assignment: Vec<usize> = bins
                    .iter()
                    .map(|&bin| solution.value(bin) as usize)
                    .collect();
                assert!(
                    instance.is_feasible(&assignment),
                    "seed {seed}: the packer accepted an overloaded assignment {assignment:?}"
                );
            }
            // Parking every VM in the spare bin is always feasible.
            SatisfactionResult::Unsatisfiable => {
                panic!("seed {seed}: the search refuted a satisfiable instance")
            }
            SatisfactionResult::Unknown => unreachable!("no budget was set"),
        }
    }
}

#[test]
fn root_propagation_never_prunes_a_feasible_value() {
    for seed in 0..40 {
        let mut rng = SmallRng::seed_from_u64(1_000 + seed);
        // Small instances: the check below enumerates the full assignment space.
        let instance = Instance::random(&mut rng, 3, 5);
        let (solver, bins, feasible_at_root) = encode(&instance);
        assert!(feasible_at_root, "seed {seed}: a root conflict is impossible");

        for (vm, &bin) in bins.iter().enumerate() {
            for value in 0..=instance.num_nodes {
                if participates_in_solution(&instance, vm, value, &mut Vec::new()) {
                    assert!(
                        solver.contains(bin, value as i32),
                        "seed {seed}: value {value} of vm {vm} was pruned but participates \
                         in a feasible assignment"
                    );
                }
            }
        }
    }
}

/// Brute force: does any feasible full assignment give `vm` the bin `value`?
fn participates_in_solution(
    instance: &Instance,
    vm: usize,
    value: usize,
    prefix: &mut Vec<usize>,
) -> bool {
    if prefix.len() == instance.num_vms() {
        return prefix[vm] == value && instance.is_feasible(prefix);
    }
    for bin in 0..=instance.num_nodes {
        if prefix.len() == vm && bin != value {
            continue;
        }
        prefix.push(bin);
        let found = participates_in_solution(instance, vm, value, prefix);
        let _ = prefix.pop();
        if found {
            return true;
        }
    }
    false
}
