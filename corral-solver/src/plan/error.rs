use crate::model::ElementName;
use crate::plan::Action;

/// Errors raised while building, extracting, or amending a plan.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// The dependency graph has no executable action left while actions remain: the
    /// dependencies form a cycle. Fatal for the extraction; the stuck actions identify the
    /// cycle.
    #[error("no executable action among {} pending actions; the dependencies form a cycle", .stuck.len())]
    DependencyCycle { stuck: Vec<Action> },

    #[error("action '{action}' is not applicable to the current configuration")]
    NotApplicable { action: Action },

    #[error("action '{action}' is already part of the plan")]
    DuplicateAction { action: Action },

    #[error("action '{action}' touches elements outside the plan's source configuration")]
    ForeignAction { action: Action },
}

/// Errors raised while merging plans; a failed merge leaves no partial result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("element '{0}' has conflicting definitions in the merged configurations")]
    Conflict(ElementName),

    #[error("merged action rejected: {0}")]
    IncompatibleAction(#[from] PlanError),
}

/// Errors raised while reading a plan or configuration from its text form.
#[derive(Debug, thiserror::Error)]
pub enum PlanTextError {
    #[error(transparent)]
    Format(#[from] rplan_format::ReadError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("line {line_nr} references unknown element '{element}'")]
    UnknownElement { line_nr: usize, element: ElementName },
}
