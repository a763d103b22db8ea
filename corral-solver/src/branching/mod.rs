//! Search ordering: the [`Brancher`] interface consumed by the engine's depth-first search, and
//! the activation-gated [`SearchHeuristic`] framework the placement heuristics are built on.
//!
//! A [`SearchHeuristic`] moves through the states `Inactive -> Active -> Exhausted`. Activation
//! is re-evaluated from the current domains; exhaustion is a latch — once a heuristic reports
//! it has no more decisions it stays exhausted for the remainder of the search, which prevents
//! heuristics from cycling. A [`HeuristicList`] composes heuristics in priority order and a
//! [`HeuristicBrancher`] bridges the list onto the engine, falling back to a first-unfixed /
//! smallest-value strategy so the search stays complete.

mod brancher;
mod heuristic;
mod heuristic_brancher;
mod heuristic_list;
pub mod heuristics;
mod selection_context;

pub use brancher::Brancher;
pub use heuristic::ActivationState;
pub use heuristic::SearchHeuristic;
pub use heuristic_brancher::HeuristicBrancher;
pub use heuristic_list::HeuristicList;
pub use selection_context::SelectionContext;
