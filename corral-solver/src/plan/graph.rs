use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::corral_assert_simple;
use crate::model::Configuration;
use crate::model::ElementName;
use crate::plan::Action;
use crate::plan::PlanError;
use crate::plan::ReconfigurationPlan;

/// Identifier of an action within an [`ActionGraph`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ActionId(u32);

impl StorageKey for ActionId {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        ActionId(index as u32)
    }
}

/// A directed dependency graph over reconfiguration actions.
///
/// An edge from an action to a dependency means the dependency must execute first. The graph
/// rejects self-loops, and removing an action removes every edge touching it.
#[derive(Debug, Default)]
pub struct ActionGraph {
    actions: KeyedVec<ActionId, Option<Action>>,
    /// For each action, the actions which must execute before it.
    dependencies: KeyedVec<ActionId, Vec<ActionId>>,
    /// The reverse edges: the actions waiting on each action.
    dependents: KeyedVec<ActionId, Vec<ActionId>>,
    num_live: usize,
}

impl ActionGraph {
    pub fn add_action(&mut self, action: Action) -> ActionId {
        let id = self.actions.push(Some(action));
        let _ = self.dependencies.push(Vec::new());
        let _ = self.dependents.push(Vec::new());
        self.num_live += 1;
        id
    }

    /// Declares that `dependency` must execute before `action`. Duplicate declarations are
    /// collapsed.
    pub fn add_dependency(&mut self, action: ActionId, dependency: ActionId) {
        corral_assert_simple!(action != dependency, "an action cannot depend on itself");
        if self.dependencies[action].contains(&dependency) {
            return;
        }
        self.dependencies[action].push(dependency);
        self.dependents[dependency].push(action);
    }

    /// Removes an action and every edge touching it; returns the action if it was live.
    pub fn remove_action(&mut self, id: ActionId) -> Option<Action> {
        let action = self.actions[id].take()?;
        self.num_live -= 1;

        let dependents = std::mem::take(&mut self.dependents[id]);
        for dependent in dependents {
            self.dependencies[dependent].retain(|&dependency| dependency != id);
        }
        let dependencies = std::mem::take(&mut self.dependencies[id]);
        for dependency in dependencies {
            self.dependents[dependency].retain(|&dependent| dependent != id);
        }
        Some(action)
    }

    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.actions[id].as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.num_live == 0
    }

    pub fn num_actions(&self) -> usize {
        self.num_live
    }

    /// The frontier: every live action with no outstanding dependency, ready to execute.
    pub fn free_actions(&self) -> Vec<ActionId> {
        self.actions
            .keys()
            .filter(|&id| self.actions[id].is_some() && self.dependencies[id].is_empty())
            .collect()
    }

    /// Every live action touching one of the given elements; used to re-check feasibility
    /// after partial execution.
    pub fn actions_related(&self, elements: &[&ElementName]) -> Vec<ActionId> {
        self.actions
            .keys()
            .filter(|&id| {
                self.actions[id].as_ref().is_some_and(|action| {
                    action
                        .touched_elements()
                        .iter()
                        .any(|touched| elements.contains(touched))
                })
            })
            .collect()
    }

    /// Drains the graph into a dependency-safe plan over `source`.
    ///
    /// Repeatedly executes the free frontier against a working copy of the configuration,
    /// scheduling each wave one time unit after the previous one. A non-empty graph without
    /// free actions is a dependency cycle and aborts the extraction.
    pub fn extract_plan(
        mut self,
        source: &Configuration,
    ) -> Result<ReconfigurationPlan, PlanError> {
        let mut working = source.clone();
        let mut plan = ReconfigurationPlan::new(source.clone());
        let mut time = 0;

        while !self.is_empty() {
            let frontier = self.free_actions();
            if frontier.is_empty() {
                let stuck = self
                    .actions
                    .iter()
                    .filter_map(|action| action.clone())
                    .collect();
                return Err(PlanError::DependencyCycle { stuck });
            }
            for id in frontier {
                let mut action = self
                    .remove_action(id)
                    .expect("free actions are live by construction");
                if !action.apply(&mut working) {
                    return Err(PlanError::NotApplicable { action });
                }
                action.start = time;
                action.end = time + 1;
                plan.add(action)?;
            }
            time += 1;
        }
        Ok(plan)
    }
}
