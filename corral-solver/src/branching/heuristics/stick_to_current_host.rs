use crate::branching::heuristics::sort_by_decreasing_load;
use crate::branching::heuristics::VmBranchingInfo;
use crate::branching::ActivationState;
use crate::branching::SearchHeuristic;
use crate::branching::SelectionContext;
use crate::engine::predicates::Predicate;

/// Tries to keep every VM on the hoster it currently runs on, biggest VMs first.
///
/// Reassigning a placed VM means a migration, so anchoring the heavy VMs to their current
/// hosts early keeps the eventual plan short. VMs whose current host has been pruned from
/// their domain are skipped; the packer has already decided they must move.
#[derive(Debug)]
pub struct StickToCurrentHost {
    vms: Vec<VmBranchingInfo>,
    state: ActivationState,
}

impl StickToCurrentHost {
    pub fn new(mut vms: Vec<VmBranchingInfo>) -> Self {
        sort_by_decreasing_load(&mut vms);
        StickToCurrentHost {
            vms,
            state: ActivationState::Inactive,
        }
    }
}

impl SearchHeuristic for StickToCurrentHost {
    fn name(&self) -> &str {
        "StickToCurrentHost"
    }

    fn state(&self) -> ActivationState {
        self.state
    }

    fn check_activated(&mut self, _context: &SelectionContext) -> bool {
        if self.state == ActivationState::Inactive
            && self.vms.iter().any(|vm| vm.current_bin.is_some())
        {
            self.state = ActivationState::Active;
        }
        self.state == ActivationState::Active
    }

    fn next_decision(&mut self, context: &mut SelectionContext) -> Option<Predicate> {
        for vm in &self.vms {
            let Some(bin) = vm.current_bin else {
                continue;
            };
            if !context.is_fixed(vm.variable) && context.contains(vm.variable, bin as i32) {
                return Some(Predicate::equal(vm.variable, bin as i32));
            }
        }
        self.state = ActivationState::Exhausted;
        None
    }
}
