use crate::model::Configuration;
use crate::plan::Action;
use crate::plan::PlanError;

/// An ordered collection of actions over a source configuration.
///
/// Two plans are equal when their sources are equal and they contain the same multiset of
/// actions; the insertion order is irrelevant.
#[derive(Debug, Clone)]
pub struct ReconfigurationPlan {
    source: Configuration,
    actions: Vec<Action>,
}

impl ReconfigurationPlan {
    pub fn new(source: Configuration) -> Self {
        ReconfigurationPlan {
            source,
            actions: Vec::new(),
        }
    }

    pub fn source(&self) -> &Configuration {
        &self.source
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// The makespan: the largest end time of any action.
    pub fn duration(&self) -> u32 {
        self.actions.iter().map(|action| action.end).max().unwrap_or(0)
    }

    /// Adds an action to the plan.
    ///
    /// An exact duplicate and an action touching elements the source does not know are both
    /// rejected; the plan is unchanged in that case.
    pub fn add(&mut self, action: Action) -> Result<(), PlanError> {
        if self.actions.contains(&action) {
            return Err(PlanError::DuplicateAction { action });
        }
        let foreign = action.touched_elements().into_iter().any(|element| {
            !self.source.is_hoster(element) && self.source.vm_state(element).is_none()
        });
        if foreign {
            return Err(PlanError::ForeignAction { action });
        }
        self.actions.push(action);
        Ok(())
    }

    /// Replays the plan on a copy of the source, in start order, and returns the resulting
    /// configuration.
    pub fn apply(&self) -> Result<Configuration, PlanError> {
        let mut configuration = self.source.clone();
        let mut ordered: Vec<&Action> = self.actions.iter().collect();
        ordered.sort_by_key(|action| action.start);
        for action in ordered {
            if !action.apply(&mut configuration) {
                return Err(PlanError::NotApplicable {
                    action: action.clone(),
                });
            }
        }
        Ok(configuration)
    }
}

impl PartialEq for ReconfigurationPlan {
    fn eq(&self, other: &Self) -> bool {
        if self.source != other.source || self.actions.len() != other.actions.len() {
            return false;
        }
        let mut lhs = self.actions.clone();
        let mut rhs = other.actions.clone();
        lhs.sort();
        rhs.sort();
        lhs == rhs
    }
}

impl Eq for ReconfigurationPlan {}

impl std::fmt::Display for ReconfigurationPlan {
    /// One action per line, in start order.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ordered: Vec<&Action> = self.actions.iter().collect();
        ordered.sort_by_key(|action| action.start);
        for action in ordered {
            writeln!(f, "{action}")?;
        }
        Ok(())
    }
}
