//! The embedded constraint engine.
//!
//! This module implements the engine contract the placement core is written against: integer
//! variables with backtrackable domains ([`Assignments`]), propagator registration with
//! watch-lists and event masks ([`propagation`]), a propagation fixpoint and depth-first search
//! with pluggable branching ([`ConstraintSolver`]), and solve budgets ([`termination`]).
//!
//! The engine is deliberately minimal: no learning, no restarts, no explanations. It exists so
//! the propagators and heuristics in this crate are exercisable end-to-end; a deployment may
//! substitute any engine honouring the same contract.

mod assignments;
mod domain_events;
pub mod predicates;
pub mod propagation;
mod solver;
pub mod termination;
pub(crate) mod test_solver;
pub mod variables;

pub use assignments::Assignments;
pub use domain_events::DomainEvents;
pub use domain_events::IntDomainEvent;
pub use solver::ConstraintSolver;
pub use solver::OptimisationResult;
pub use solver::SatisfactionResult;
pub use solver::SolverStatistics;
