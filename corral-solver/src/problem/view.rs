use std::collections::BTreeMap;

use crate::basic_types::Solution;
use crate::branching::heuristics::HosterOrdering;
use crate::branching::SearchHeuristic;
use crate::model::Direction;
use crate::model::ElementName;
use crate::plan::ActionGraph;
use crate::problem::ProblemError;
use crate::problem::ReconfigurationProblem;

/// A pluggable placement policy.
///
/// A view may post extra variables and constraints against the problem's hoster/VM index space
/// ([`View::associate`]), steer the search ([`View::heuristics`]), and contribute actions to
/// the dependency graph after a solution was found ([`View::extract_actions`]). All hooks have
/// do-nothing defaults, so a view implements only what it cares about.
pub trait View {
    /// The registry name of the view.
    fn name(&self) -> &str;

    /// Creates view-specific variables and constraints. Called once, when the view is added.
    fn associate(&mut self, _problem: &mut ReconfigurationProblem) -> Result<(), ProblemError> {
        Ok(())
    }

    /// The search heuristics this view contributes, in priority order.
    fn heuristics(&self, _problem: &ReconfigurationProblem) -> Vec<Box<dyn SearchHeuristic>> {
        Vec::new()
    }

    /// Contributes view-specific actions to the dependency graph of a solved placement.
    fn extract_actions(
        &self,
        _solution: &Solution,
        _problem: &ReconfigurationProblem,
        _graph: &mut ActionGraph,
    ) -> Result<(), ProblemError> {
        Ok(())
    }
}

/// An explicit list of view factories.
///
/// Views are registered by name at startup and instantiated on demand; there is no runtime
/// discovery and no process-wide state.
#[derive(Default)]
pub struct ViewRegistry {
    factories: Vec<(String, fn() -> Box<dyn View>)>,
}

impl std::fmt::Debug for ViewRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewRegistry")
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl ViewRegistry {
    pub fn register(&mut self, name: impl Into<String>, factory: fn() -> Box<dyn View>) {
        self.factories.push((name.into(), factory));
    }

    /// Instantiates the view registered under `name`.
    pub fn create(&self, name: &str) -> Option<Box<dyn View>> {
        self.factories
            .iter()
            .find(|(registered, _)| registered == name)
            .map(|(_, factory)| factory())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.iter().map(|(name, _)| name.as_str())
    }
}

/// Cost-aware placement: every hoster carries a running-cost weight and the search tries the
/// cheap hosters first.
#[derive(Debug, Default)]
pub struct CostView {
    weights: BTreeMap<ElementName, i64>,
}

impl CostView {
    pub fn new() -> Self {
        CostView::default()
    }

    pub fn set_weight(&mut self, hoster: impl Into<ElementName>, weight: i64) -> &mut Self {
        let _ = self.weights.insert(hoster.into(), weight);
        self
    }

    /// The weight of a hoster, defaulting to one more than the largest declared weight: a
    /// hoster nobody priced is treated as at least as expensive as every known one, so the
    /// search never gravitates towards it by accident.
    pub fn weight_or_default(&self, hoster: &ElementName) -> i64 {
        self.weights.get(hoster).copied().unwrap_or_else(|| {
            self.weights.values().max().copied().unwrap_or(0) + 1
        })
    }
}

impl View for CostView {
    fn name(&self) -> &str {
        "cost"
    }

    fn heuristics(&self, problem: &ReconfigurationProblem) -> Vec<Box<dyn SearchHeuristic>> {
        let weights = problem
            .hosters()
            .iter()
            .map(|hoster| self.weight_or_default(hoster))
            .collect();
        vec![Box::new(HosterOrdering::new(
            problem.branching_infos(),
            weights,
            Direction::Increasing,
        ))]
    }
}
