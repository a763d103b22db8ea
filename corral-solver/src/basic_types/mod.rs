mod inconsistency;
mod solution;

pub use inconsistency::EmptyDomain;
pub use inconsistency::Inconsistency;
pub use solution::Solution;

/// The result of invoking a propagator: either the propagator made the current partial
/// assignment (more) consistent, or it detected that no solution extends it.
///
/// An [`Err`] is not an error in the usual sense; the search interprets it as "undo and try the
/// next branch". Propagators therefore never unwind on expected infeasibility.
pub type PropagationStatus = Result<(), Inconsistency>;
