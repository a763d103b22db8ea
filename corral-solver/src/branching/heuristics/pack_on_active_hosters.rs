use fnv::FnvHashSet;

use crate::branching::heuristics::sort_by_decreasing_load;
use crate::branching::heuristics::VmBranchingInfo;
use crate::branching::ActivationState;
use crate::branching::SearchHeuristic;
use crate::branching::SelectionContext;
use crate::engine::predicates::Predicate;

/// Packs undecided VMs onto hosters which already carry an assigned VM.
///
/// Stays inactive until at least one bin variable has been fixed to a real bin, so it
/// naturally runs after an anchoring heuristic such as
/// [`StickToCurrentHost`](crate::branching::heuristics::StickToCurrentHost) has seeded some
/// placements.
#[derive(Debug)]
pub struct PackOnActiveHosters {
    vms: Vec<VmBranchingInfo>,
    /// Number of real bins; values at or above this (the spare bin) never count as active.
    num_bins: usize,
    state: ActivationState,
}

impl PackOnActiveHosters {
    pub fn new(mut vms: Vec<VmBranchingInfo>, num_bins: usize) -> Self {
        sort_by_decreasing_load(&mut vms);
        PackOnActiveHosters {
            vms,
            num_bins,
            state: ActivationState::Inactive,
        }
    }

    fn active_bins(&self, context: &SelectionContext) -> FnvHashSet<i32> {
        self.vms
            .iter()
            .filter(|vm| context.is_fixed(vm.variable))
            .map(|vm| context.assigned_value(vm.variable))
            .filter(|&bin| (bin as usize) < self.num_bins)
            .collect()
    }
}

impl SearchHeuristic for PackOnActiveHosters {
    fn name(&self) -> &str {
        "PackOnActiveHosters"
    }

    fn state(&self) -> ActivationState {
        self.state
    }

    fn check_activated(&mut self, context: &SelectionContext) -> bool {
        if self.state == ActivationState::Inactive && !self.active_bins(context).is_empty() {
            self.state = ActivationState::Active;
        }
        self.state == ActivationState::Active
    }

    fn next_decision(&mut self, context: &mut SelectionContext) -> Option<Predicate> {
        let active = self.active_bins(context);
        for vm in &self.vms {
            if context.is_fixed(vm.variable) {
                continue;
            }
            let candidate = (0..self.num_bins as i32)
                .filter(|bin| active.contains(bin))
                .find(|&bin| context.contains(vm.variable, bin));
            if let Some(bin) = candidate {
                return Some(Predicate::equal(vm.variable, bin));
            }
        }
        self.state = ActivationState::Exhausted;
        None
    }
}
