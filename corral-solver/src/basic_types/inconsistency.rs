/// Signal that a domain operation removed the last value from a domain.
///
/// Carries no payload; the engine identifies the affected variable through the context in which
/// the operation was performed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EmptyDomain;

/// The reason a propagator concluded that the current partial assignment admits no solution.
///
/// Inconsistencies are local and recoverable: the search undoes the current branch and tries the
/// next one. They are never surfaced to the caller as errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    /// A domain operation wiped out a variable's domain.
    EmptyDomain,
    /// A packing propagator proved that the load which must go onto a node exceeds its
    /// capacity in some resource dimension.
    InfeasiblePacking {
        /// Index of the overloaded node in the propagator's node space.
        node: usize,
        /// Index of the resource dimension in which the overload was detected.
        resource: usize,
    },
}

impl From<EmptyDomain> for Inconsistency {
    fn from(_: EmptyDomain) -> Self {
        Inconsistency::EmptyDomain
    }
}
