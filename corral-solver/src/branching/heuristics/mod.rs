//! Placement heuristics built on the [`SearchHeuristic`](crate::branching::SearchHeuristic)
//! framework. All of them operate on the bin variables of a placement problem: one variable per
//! VM whose value is the index of the hoster the VM lands on (or the spare bin for VMs left
//! waiting).

mod hoster_ordering;
mod pack_on_active_hosters;
mod stick_to_current_host;

pub use hoster_ordering::HosterOrdering;
pub use pack_on_active_hosters::PackOnActiveHosters;
pub use stick_to_current_host::StickToCurrentHost;

use crate::engine::variables::DomainId;

/// Per-VM branching input: the VM's bin variable together with placement facts derived from the
/// source configuration.
#[derive(Debug, Copy, Clone)]
pub struct VmBranchingInfo {
    /// The VM's bin variable.
    pub variable: DomainId,
    /// Index of the VM's current hoster in the problem's hoster space, if it is placed.
    pub current_bin: Option<usize>,
    /// The VM's use of the primary resource; drives the decreasing-use orderings.
    pub load: i64,
}

/// Stable decreasing-load order; ties keep the original (input) order.
fn sort_by_decreasing_load(vms: &mut [VmBranchingInfo]) {
    vms.sort_by(|a, b| b.load.cmp(&a.load));
}
