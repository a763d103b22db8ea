use itertools::Itertools;

use crate::model::Configuration;
use crate::plan::MergeError;
use crate::plan::ReconfigurationPlan;

/// The element-disjoint union of two configurations.
///
/// An element present in both inputs is accepted only when both define it identically (same
/// kind, same state); any disagreement, including a name registered as different kinds, is a
/// [`MergeError::Conflict`]. Nothing is returned on failure, so no partial union escapes.
pub fn merge_configurations(
    a: &Configuration,
    b: &Configuration,
) -> Result<Configuration, MergeError> {
    let mut merged = a.clone();

    for (name, node) in b.nodes() {
        match merged.node(name) {
            Some(existing) if existing == node => {}
            None if !merged.contains_element(name) => {
                if node.online {
                    merged.add_online_node(name.clone());
                } else {
                    merged.add_offline_node(name.clone());
                }
            }
            _ => return Err(MergeError::Conflict(name.clone())),
        }
    }

    for name in b.externs() {
        if merged.is_extern(name) {
            continue;
        }
        if merged.contains_element(name) {
            return Err(MergeError::Conflict(name.clone()));
        }
        merged.add_extern(name.clone());
    }

    for (name, state) in b.vms() {
        match merged.vm_state(name) {
            Some(existing) if existing == state => {}
            None if !merged.contains_element(name) => {
                merged.insert_vm_state(name.clone(), state.clone());
            }
            _ => return Err(MergeError::Conflict(name.clone())),
        }
    }

    for (name, members) in b.sites() {
        match merged.site(name) {
            Some(existing) if existing == members => {}
            None if !merged.contains_element(name) => {
                merged.add_site(name.clone(), members.iter().cloned());
            }
            _ => return Err(MergeError::Conflict(name.clone())),
        }
    }

    Ok(merged)
}

/// Merges independently computed plans into one.
///
/// The source configurations are united first; the actions are then inserted sorted by start
/// time (a stable sort, so equal start times keep the order of the input plans). Any action the
/// merged plan rejects aborts the merge. The operation is associative on plans with disjoint
/// sources, which is what allows solving site partitions independently and combining the
/// results in any grouping.
pub fn merge_plans(plans: &[ReconfigurationPlan]) -> Result<ReconfigurationPlan, MergeError> {
    let mut source = Configuration::default();
    for plan in plans {
        source = merge_configurations(&source, plan.source())?;
    }

    let mut merged = ReconfigurationPlan::new(source);
    let actions = plans
        .iter()
        .flat_map(|plan| plan.actions())
        .sorted_by_key(|action| action.start);
    for action in actions {
        merged.add(action.clone())?;
    }
    Ok(merged)
}

impl ReconfigurationPlan {
    /// Binary merge; see [`merge_plans`].
    pub fn merge(&self, other: &ReconfigurationPlan) -> Result<ReconfigurationPlan, MergeError> {
        merge_plans(&[self.clone(), other.clone()])
    }
}
