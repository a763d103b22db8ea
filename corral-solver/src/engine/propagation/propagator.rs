use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatus;
use crate::engine::domain_events::IntDomainEvent;
use crate::engine::propagation::LocalId;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::PropagatorInitialisationContext;

/// Whether a notified propagator should be scheduled for propagation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EnqueueDecision {
    /// The propagator should be enqueued.
    Enqueue,
    /// The propagator should not be enqueued.
    Skip,
}

/// The interface every consistency filter implements.
///
/// Propagators are invoked repeatedly by the engine's fixpoint loop, in any order consistent
/// with the registered events; they may be called when nothing relevant changed and are not
/// required to propagate to a fixpoint in one call. Any internal state must be re-derivable
/// from the current domains: [`Propagator::synchronise`] is called after backtracking so
/// incremental structures can be rebuilt.
pub trait Propagator {
    /// The name of the propagator; used for logging and failure reporting.
    fn name(&self) -> &str;

    /// Called once when the propagator is added to the engine, at the root of the search.
    ///
    /// The propagator registers its variables with the watch-list through the provided context
    /// and may initialise internal state. Detecting a root-level inconsistency here makes the
    /// whole problem infeasible.
    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency>;

    /// Extends the current partial assignment with inferred domain changes, or reports an
    /// [`Inconsistency`] when no solution extends it.
    fn propagate(&mut self, context: PropagationContextMut) -> PropagationStatus;

    /// Called when a watched event happens on one of the registered variables; decides whether
    /// the propagator is worth scheduling. Cheap bookkeeping only.
    fn notify(
        &mut self,
        _context: PropagationContext,
        _local_id: LocalId,
        _event: IntDomainEvent,
    ) -> EnqueueDecision {
        EnqueueDecision::Enqueue
    }

    /// Called after the engine backtracked, so incremental state can be recomputed from the
    /// restored domains.
    fn synchronise(&mut self, _context: PropagationContext) {}
}
