//! # Corral
//! Corral is a constraint-based placement and reconfiguration planner for virtualized data
//! centers. Given a snapshot of the infrastructure (nodes, VMs, externs, sites) and the
//! resource specifications binding them, it computes a feasible assignment of VMs to hosters
//! under multi-resource capacity constraints and derives a dependency-safe plan of migrate,
//! start, stop, suspend, and resume actions taking the infrastructure from its current state
//! to the computed one.
//!
//! The crate is organised in layers:
//! * [`model`] — the configuration model: managed elements, lifecycle states, resource
//!   specifications, and aggregated use/capacity queries.
//! * [`engine`] — a minimal embedded constraint engine: backtrackable integer domains,
//!   event-driven propagator scheduling, depth-first search with budgets. It implements
//!   exactly the contract the placement core consumes, so a full-blown CP engine can be
//!   substituted.
//! * [`propagators`] — the consistency filters: single- and multi-resource bin packing over
//!   the VM bin variables, and the range/stage channeling propagators.
//! * [`branching`] — the activation-gated search-heuristic framework and the placement
//!   heuristics built on it.
//! * [`plan`] — actions, the dependency graph derived from a configuration delta, plan
//!   extraction and merging, and the text formats.
//! * [`problem`] — the facade assembling all of the above, plus the [`problem::View`]
//!   contract for pluggable placement policies.
//!
//! # Solving a placement
//! ```rust
//! use corral_solver::engine::termination::Indefinite;
//! use corral_solver::model::Configuration;
//! use corral_solver::model::ResourceSpecification;
//! use corral_solver::problem::ProblemOptions;
//! use corral_solver::problem::ReconfigurationProblem;
//! use corral_solver::problem::SolveOutcome;
//!
//! // The current state: vm1 runs on n1, vm2 is waiting to be placed.
//! let mut configuration = Configuration::default();
//! configuration.add_online_node("n1");
//! configuration.add_online_node("n2");
//! configuration.add_running_vm("vm1", "n1").unwrap();
//! configuration.add_waiting_vm("vm2");
//!
//! let mut memory = ResourceSpecification::new("mem");
//! memory.set_use("vm1", 2).set_use("vm2", 3);
//! memory.set_capacity("n1", 4).set_capacity("n2", 4);
//!
//! let mut problem = ReconfigurationProblem::new(
//!     configuration,
//!     vec![memory],
//!     ProblemOptions::default(),
//! )
//! .unwrap();
//!
//! // Solve without a budget; pass a TimeBudget or BacktrackBudget to bound the search.
//! match problem.solve(&mut Indefinite).unwrap() {
//!     SolveOutcome::Reconfiguration(solved) => {
//!         // vm2 found a hoster, and the plan starts it there.
//!         assert_eq!(solved.plan.len(), 1);
//!     }
//!     SolveOutcome::Infeasible | SolveOutcome::Timeout => panic!("a placement exists"),
//! }
//! ```

pub mod asserts;
pub mod basic_types;
pub mod branching;
pub mod containers;
pub mod engine;
pub mod model;
pub mod plan;
pub mod problem;
pub mod propagators;

pub use problem::ProblemOptions;
pub use problem::ReconfigurationProblem;
pub use problem::SolveOutcome;
