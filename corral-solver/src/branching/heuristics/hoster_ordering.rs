use crate::branching::heuristics::VmBranchingInfo;
use crate::branching::ActivationState;
use crate::branching::SearchHeuristic;
use crate::branching::SelectionContext;
use crate::engine::predicates::Predicate;
use crate::model::Direction;

/// Orders the candidate hosters of every undecided VM by a caller-supplied weight.
///
/// With [`Direction::Increasing`] the cheapest hoster is tried first (fill emptied hosts
/// last, which drives consolidation); with [`Direction::Decreasing`] the heaviest-weight
/// hoster is preferred. Ties between equal weights go to the lower bin index.
#[derive(Debug)]
pub struct HosterOrdering {
    vms: Vec<VmBranchingInfo>,
    weights: Vec<i64>,
    direction: Direction,
    state: ActivationState,
}

impl HosterOrdering {
    /// `weights[bin]` is the weight of the real bin `bin`; the spare bin carries no weight and
    /// is never proposed by this heuristic.
    pub fn new(vms: Vec<VmBranchingInfo>, weights: Vec<i64>, direction: Direction) -> Self {
        HosterOrdering {
            vms,
            weights,
            direction,
            state: ActivationState::Inactive,
        }
    }

    fn best_bin(&self, context: &SelectionContext, vm: &VmBranchingInfo) -> Option<i32> {
        let mut best: Option<(i64, i32)> = None;
        for (bin, &weight) in self.weights.iter().enumerate() {
            let bin = bin as i32;
            if !context.contains(vm.variable, bin) {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_weight, _)) => match self.direction {
                    Direction::Increasing => weight < best_weight,
                    Direction::Decreasing => weight > best_weight,
                },
            };
            if better {
                best = Some((weight, bin));
            }
        }
        best.map(|(_, bin)| bin)
    }
}

impl SearchHeuristic for HosterOrdering {
    fn name(&self) -> &str {
        "HosterOrdering"
    }

    fn state(&self) -> ActivationState {
        self.state
    }

    fn check_activated(&mut self, _context: &SelectionContext) -> bool {
        if self.state == ActivationState::Inactive {
            self.state = ActivationState::Active;
        }
        self.state == ActivationState::Active
    }

    fn next_decision(&mut self, context: &mut SelectionContext) -> Option<Predicate> {
        for vm in &self.vms {
            if context.is_fixed(vm.variable) {
                continue;
            }
            if let Some(bin) = self.best_bin(context, vm) {
                return Some(Predicate::equal(vm.variable, bin));
            }
        }
        self.state = ActivationState::Exhausted;
        None
    }
}
