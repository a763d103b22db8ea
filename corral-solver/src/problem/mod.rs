//! The placement problem facade: encodes a source [`Configuration`] into bin variables and the
//! multi-resource packer, runs the search with the placement heuristics, and decodes the
//! solution into a target configuration plus the dependency-safe plan taking the
//! infrastructure there.

mod view;

pub use view::CostView;
pub use view::View;
pub use view::ViewRegistry;

use log::debug;

use crate::basic_types::Solution;
use crate::branching::heuristics::PackOnActiveHosters;
use crate::branching::heuristics::StickToCurrentHost;
use crate::branching::heuristics::VmBranchingInfo;
use crate::branching::HeuristicBrancher;
use crate::branching::HeuristicList;
use crate::branching::SearchHeuristic;
use crate::engine::predicates::Predicate;
use crate::engine::termination::TerminationCondition;
use crate::engine::variables::DomainId;
use crate::engine::ConstraintSolver;
use crate::engine::SatisfactionResult;
use crate::model::Configuration;
use crate::model::ElementName;
use crate::model::ModelError;
use crate::model::ResourceSpecification;
use crate::model::VmState;
use crate::plan::build_action_graph;
use crate::plan::PlanError;
use crate::plan::ReconfigurationPlan;
use crate::propagators::MultiBinPackingPropagator;
use crate::propagators::PackingDimension;

/// Errors raised while encoding or decoding a placement problem.
#[derive(Debug, thiserror::Error)]
pub enum ProblemError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Options of a [`ReconfigurationProblem`]; the defaults keep every placed VM placed.
#[derive(Debug, Copy, Clone, Default)]
pub struct ProblemOptions {
    /// Whether the search may take a running VM off its hoster (stopping it) instead of
    /// placing it. Off by default: a placement is not allowed to sacrifice workloads.
    pub allow_parking: bool,
}

/// The outcome of [`ReconfigurationProblem::solve`].
#[derive(Debug)]
pub enum SolveOutcome {
    /// A feasible placement was found and turned into a plan.
    Reconfiguration(SolvedReconfiguration),
    /// The problem admits no feasible placement.
    Infeasible,
    /// The budget ran out before a placement was found; not an error.
    Timeout,
}

/// A solved placement: the target configuration and the plan reaching it from the source.
#[derive(Debug)]
pub struct SolvedReconfiguration {
    pub target: Configuration,
    pub plan: ReconfigurationPlan,
}

/// Encodes one what-if placement question over a snapshot of the infrastructure.
///
/// The hoster index space is the sorted list of online nodes followed by the externs; every
/// placeable VM gets a bin variable ranging over that space plus the spare bin (one past the
/// last hoster) which stands for leaving the VM waiting. Sleeping VMs are pinned to their
/// hoster, VMs with a declared migration target are pinned to it. The multi-resource packer
/// enforces every capacity during the search.
///
/// A problem owns its engine and its configuration snapshot; independent problems can
/// therefore be solved on separate threads without sharing anything.
pub struct ReconfigurationProblem {
    solver: ConstraintSolver,
    source: Configuration,
    resources: Vec<ResourceSpecification>,
    hosters: Vec<ElementName>,
    vms: Vec<(ElementName, VmState)>,
    bins: Vec<DomainId>,
    views: Vec<Box<dyn View>>,
    root_infeasible: bool,
}

impl std::fmt::Debug for ReconfigurationProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconfigurationProblem")
            .field("num_hosters", &self.hosters.len())
            .field("num_vms", &self.vms.len())
            .field("num_views", &self.views.len())
            .finish()
    }
}

impl ReconfigurationProblem {
    pub fn new(
        source: Configuration,
        resources: Vec<ResourceSpecification>,
        options: ProblemOptions,
    ) -> Result<Self, ProblemError> {
        let hosters: Vec<ElementName> = source
            .online_nodes()
            .cloned()
            .chain(source.externs().cloned())
            .collect();
        let spare = hosters.len();

        let vms: Vec<(ElementName, VmState)> = source
            .vms()
            .filter(|(_, state)| !matches!(state, VmState::Stopped))
            .map(|(name, state)| (name.clone(), state.clone()))
            .collect();

        let mut solver = ConstraintSolver::default();
        let mut bins = Vec::with_capacity(vms.len());
        let mut root_infeasible = false;

        let hoster_index = |name: &ElementName| hosters.iter().position(|hoster| hoster == name);

        for (_, state) in &vms {
            let placed = state.host().is_some();
            let upper_bound = if placed && !options.allow_parking {
                spare as i32 - 1
            } else {
                spare as i32
            };
            if upper_bound < 0 {
                // A placed VM with no candidate hoster at all.
                root_infeasible = true;
                bins.push(solver.new_bounded_integer(0, 0));
                continue;
            }
            let bin = solver.new_bounded_integer(0, upper_bound);
            bins.push(bin);

            // Pins: sleeping VMs stay where they are, committed migrations land on their
            // target.
            let pin = match state {
                VmState::Sleeping { host } => Some(host),
                VmState::Migrating { to, .. } => Some(to),
                _ => None,
            };
            if let Some(host) = pin {
                let Some(index) = hoster_index(host) else {
                    return Err(ModelError::UnknownElement(host.clone()).into());
                };
                if solver
                    .post_at_root(Predicate::equal(bin, index as i32))
                    .is_err()
                {
                    root_infeasible = true;
                }
            }
        }

        if !resources.is_empty() && !root_infeasible {
            let mut dimensions = Vec::with_capacity(resources.len());
            for resource in &resources {
                let mut loads = Vec::with_capacity(vms.len());
                for (vm, _) in &vms {
                    loads.push(resource.use_of(vm)?);
                }
                let mut capacities = Vec::with_capacity(hosters.len());
                let mut additional_uses = Vec::with_capacity(hosters.len());
                for hoster in &hosters {
                    capacities.push(resource.capacity_of(hoster)?);
                    additional_uses.push(resource.additional_use_of(hoster));
                }
                dimensions.push(
                    PackingDimension::new(loads, capacities)
                        .with_additional_uses(additional_uses),
                );
            }
            if solver
                .add_propagator(MultiBinPackingPropagator::new(bins.clone(), dimensions))
                .is_err()
            {
                root_infeasible = true;
            }
        }

        Ok(ReconfigurationProblem {
            solver,
            source,
            resources,
            hosters,
            vms,
            bins,
            views: Vec::new(),
            root_infeasible,
        })
    }

    pub fn source(&self) -> &Configuration {
        &self.source
    }

    pub fn resources(&self) -> &[ResourceSpecification] {
        &self.resources
    }

    /// The hoster index space: online nodes in name order, then externs.
    pub fn hosters(&self) -> &[ElementName] {
        &self.hosters
    }

    pub fn hoster_index(&self, name: &ElementName) -> Option<usize> {
        self.hosters.iter().position(|hoster| hoster == name)
    }

    /// The spare bin index: the value of a bin variable for a VM left waiting.
    pub fn spare_bin(&self) -> usize {
        self.hosters.len()
    }

    pub fn bins(&self) -> &[DomainId] {
        &self.bins
    }

    /// Creates a view-specific variable in the problem's engine.
    pub fn new_bounded_integer(&mut self, lower_bound: i32, upper_bound: i32) -> DomainId {
        self.solver.new_bounded_integer(lower_bound, upper_bound)
    }

    /// Posts a view-specific propagator; a root-level conflict makes the problem infeasible.
    pub fn add_propagator(
        &mut self,
        propagator: impl crate::engine::propagation::Propagator + 'static,
    ) {
        if self.solver.add_propagator(propagator).is_err() {
            self.root_infeasible = true;
        }
    }

    /// Associates a view with the problem; the view's constraints are posted now, its
    /// heuristics and actions are collected during [`ReconfigurationProblem::solve`].
    pub fn add_view(&mut self, mut view: Box<dyn View>) -> Result<(), ProblemError> {
        view.associate(self)?;
        self.views.push(view);
        Ok(())
    }

    /// The per-VM branching input of this problem, for heuristics.
    pub fn branching_infos(&self) -> Vec<VmBranchingInfo> {
        let primary = self.resources.first();
        self.vms
            .iter()
            .zip(&self.bins)
            .map(|((vm, state), &bin)| VmBranchingInfo {
                variable: bin,
                current_bin: state.host().and_then(|host| self.hoster_index(host)),
                load: primary.map_or(0, |resource| resource.use_of_or_default(vm)),
            })
            .collect()
    }

    /// Runs the search and, on success, derives the target configuration and its plan.
    pub fn solve(
        &mut self,
        termination: &mut impl TerminationCondition,
    ) -> Result<SolveOutcome, ProblemError> {
        if self.root_infeasible {
            return Ok(SolveOutcome::Infeasible);
        }

        let infos = self.branching_infos();
        let mut heuristics: Vec<Box<dyn SearchHeuristic>> = vec![
            Box::new(StickToCurrentHost::new(infos.clone())),
            Box::new(PackOnActiveHosters::new(infos, self.hosters.len())),
        ];
        for view in &self.views {
            heuristics.append(&mut view.heuristics(self));
        }
        let mut brancher =
            HeuristicBrancher::new(HeuristicList::new(heuristics), self.bins.clone());

        match self.solver.satisfy(&mut brancher, termination) {
            SatisfactionResult::Satisfiable(solution) => {
                let target = self.decode(&solution)?;
                let mut graph = build_action_graph(&self.source, &target, &self.resources)?;
                for view in &self.views {
                    view.extract_actions(&solution, self, &mut graph)?;
                }
                let plan = graph.extract_plan(&self.source)?;
                debug!(
                    "placement solved: {} actions over {} time units",
                    plan.len(),
                    plan.duration()
                );
                Ok(SolveOutcome::Reconfiguration(SolvedReconfiguration {
                    target,
                    plan,
                }))
            }
            SatisfactionResult::Unsatisfiable => Ok(SolveOutcome::Infeasible),
            SatisfactionResult::Unknown => Ok(SolveOutcome::Timeout),
        }
    }

    /// Maps a full assignment of the bin variables back onto the configuration model.
    fn decode(&self, solution: &Solution) -> Result<Configuration, ProblemError> {
        let mut target = self.source.clone();
        let spare = self.spare_bin();

        for ((vm, state), &bin) in self.vms.iter().zip(&self.bins) {
            let value = solution.value(bin) as usize;
            match state {
                VmState::Waiting => {
                    if value < spare {
                        target.run_vm(vm, &self.hosters[value])?;
                    }
                }
                VmState::Running { host } => {
                    if value == spare {
                        target.stop_vm(vm)?;
                    } else if &self.hosters[value] != host {
                        target.migrate_vm(vm, &self.hosters[value])?;
                    }
                }
                VmState::Migrating { .. } => {
                    target.migrate_vm(vm, &self.hosters[value])?;
                }
                // Pinned in place; stays sleeping.
                VmState::Sleeping { .. } => {}
                VmState::Stopped => {}
            }
        }
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::termination::Indefinite;

    fn memory(uses: &[(&str, i64)], capacities: &[(&str, i64)]) -> ResourceSpecification {
        let mut resource = ResourceSpecification::new("mem");
        for (vm, amount) in uses {
            let _ = resource.set_use(*vm, *amount);
        }
        for (hoster, amount) in capacities {
            let _ = resource.set_capacity(*hoster, *amount);
        }
        resource
    }

    #[test]
    fn a_waiting_vm_is_placed_and_started() {
        let mut source = Configuration::default();
        source.add_online_node("n1");
        source.add_online_node("n2");
        source.add_running_vm("vm1", "n1").expect("n1 is online");
        source.add_waiting_vm("vm2");

        let resources = vec![memory(
            &[("vm1", 1), ("vm2", 1)],
            &[("n1", 2), ("n2", 2)],
        )];
        let mut problem =
            ReconfigurationProblem::new(source, resources, ProblemOptions::default())
                .expect("the model is complete");

        let outcome = problem.solve(&mut Indefinite).expect("solving succeeds");
        let SolveOutcome::Reconfiguration(solved) = outcome else {
            panic!("a placement exists");
        };
        assert!(solved
            .target
            .vm_state(&"vm2".into())
            .expect("vm2 is registered")
            .is_running());
        // vm1 stays put: the plan is exactly the run action.
        assert_eq!(solved.plan.len(), 1);
    }

    #[test]
    fn an_oversized_vm_stays_waiting() {
        let mut source = Configuration::default();
        source.add_online_node("n1");
        source.add_waiting_vm("vm1");

        let resources = vec![memory(&[("vm1", 10)], &[("n1", 2)])];
        let mut problem =
            ReconfigurationProblem::new(source, resources, ProblemOptions::default())
                .expect("the model is complete");

        let outcome = problem.solve(&mut Indefinite).expect("solving succeeds");
        let SolveOutcome::Reconfiguration(solved) = outcome else {
            panic!("leaving the VM waiting is feasible");
        };
        assert!(solved
            .target
            .vm_state(&"vm1".into())
            .expect("vm1 is registered")
            .is_waiting());
        assert!(solved.plan.is_empty());
    }

    #[test]
    fn a_placed_vm_is_never_sacrificed_by_default() {
        // vm1 runs on the only node and a huge waiting VM would love its slot; without
        // parking permission vm1 must stay running.
        let mut source = Configuration::default();
        source.add_online_node("n1");
        source.add_running_vm("vm1", "n1").expect("n1 is online");
        source.add_waiting_vm("vm2");

        let resources = vec![memory(&[("vm1", 1), ("vm2", 2)], &[("n1", 2)])];
        let mut problem =
            ReconfigurationProblem::new(source, resources, ProblemOptions::default())
                .expect("the model is complete");

        let outcome = problem.solve(&mut Indefinite).expect("solving succeeds");
        let SolveOutcome::Reconfiguration(solved) = outcome else {
            panic!("keeping vm1 and leaving vm2 waiting is feasible");
        };
        assert!(solved
            .target
            .vm_state(&"vm1".into())
            .expect("vm1 is registered")
            .is_running());
        assert!(solved
            .target
            .vm_state(&"vm2".into())
            .expect("vm2 is registered")
            .is_waiting());
    }

    #[test]
    fn missing_resource_values_fail_the_encoding() {
        let mut source = Configuration::default();
        source.add_online_node("n1");
        source.add_waiting_vm("vm1");

        // vm1 has no declared memory use.
        let resources = vec![memory(&[], &[("n1", 2)])];
        let result = ReconfigurationProblem::new(source, resources, ProblemOptions::default());
        assert!(matches!(
            result,
            Err(ProblemError::Model(ModelError::UndefinedResourceValue { .. }))
        ));
    }
}
