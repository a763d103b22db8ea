use crate::basic_types::EmptyDomain;
use crate::engine::domain_events::DomainEvents;
use crate::engine::propagation::LocalId;
use crate::engine::propagation::PropagatorId;
use crate::engine::propagation::WatchListCP;
use crate::engine::propagation::Watcher;
use crate::engine::variables::DomainId;
use crate::engine::Assignments;

/// Read access to the current domains, shared by every propagation context.
pub trait ReadDomains {
    fn lower_bound(&self, domain: DomainId) -> i32;

    fn upper_bound(&self, domain: DomainId) -> i32;

    fn contains(&self, domain: DomainId, value: i32) -> bool;

    fn is_fixed(&self, domain: DomainId) -> bool {
        self.lower_bound(domain) == self.upper_bound(domain)
    }
}

/// Read-only view of the domains, handed to [`Propagator::notify`] and
/// [`Propagator::synchronise`].
///
/// [`Propagator::notify`]: crate::engine::propagation::Propagator::notify
/// [`Propagator::synchronise`]: crate::engine::propagation::Propagator::synchronise
#[derive(Debug, Clone, Copy)]
pub struct PropagationContext<'a> {
    assignments: &'a Assignments,
}

impl<'a> PropagationContext<'a> {
    pub fn new(assignments: &'a Assignments) -> Self {
        PropagationContext { assignments }
    }
}

/// Mutable view of the domains, handed to [`Propagator::propagate`]; pruning goes through this
/// context so every change is trailed and produces events.
///
/// [`Propagator::propagate`]: crate::engine::propagation::Propagator::propagate
#[derive(Debug)]
pub struct PropagationContextMut<'a> {
    assignments: &'a mut Assignments,
}

impl<'a> PropagationContextMut<'a> {
    pub fn new(assignments: &'a mut Assignments) -> Self {
        PropagationContextMut { assignments }
    }

    pub fn set_lower_bound(&mut self, domain: DomainId, bound: i32) -> Result<(), EmptyDomain> {
        self.assignments.tighten_lower_bound(domain, bound)
    }

    pub fn set_upper_bound(&mut self, domain: DomainId, bound: i32) -> Result<(), EmptyDomain> {
        self.assignments.tighten_upper_bound(domain, bound)
    }

    pub fn remove(&mut self, domain: DomainId, value: i32) -> Result<(), EmptyDomain> {
        self.assignments.remove_value_from_domain(domain, value)
    }

    pub fn assign(&mut self, domain: DomainId, value: i32) -> Result<(), EmptyDomain> {
        self.assignments.make_assignment(domain, value)
    }

    pub fn as_readonly(&self) -> PropagationContext<'_> {
        PropagationContext {
            assignments: self.assignments,
        }
    }
}

/// Context handed to [`Propagator::initialise_at_root`]; registers the propagator's variables
/// in the engine's watch-lists.
///
/// [`Propagator::initialise_at_root`]: crate::engine::propagation::Propagator::initialise_at_root
#[derive(Debug)]
pub struct PropagatorInitialisationContext<'a> {
    watch_list: &'a mut WatchListCP,
    propagator_id: PropagatorId,
    assignments: &'a Assignments,
}

impl<'a> PropagatorInitialisationContext<'a> {
    pub(crate) fn new(
        watch_list: &'a mut WatchListCP,
        propagator_id: PropagatorId,
        assignments: &'a Assignments,
    ) -> Self {
        PropagatorInitialisationContext {
            watch_list,
            propagator_id,
            assignments,
        }
    }

    /// Subscribes the propagator to `events` on `domain`; notifications carry `local_id`.
    pub fn register(&mut self, domain: DomainId, events: DomainEvents, local_id: LocalId) {
        self.watch_list.add_watcher(
            domain,
            Watcher {
                propagator: self.propagator_id,
                local_id,
                events,
            },
        );
    }

    pub fn as_readonly(&self) -> PropagationContext<'_> {
        PropagationContext {
            assignments: self.assignments,
        }
    }
}

macro_rules! impl_read_domains {
    ($ctx:ident) => {
        impl ReadDomains for $ctx<'_> {
            fn lower_bound(&self, domain: DomainId) -> i32 {
                self.assignments.get_lower_bound(domain)
            }

            fn upper_bound(&self, domain: DomainId) -> i32 {
                self.assignments.get_upper_bound(domain)
            }

            fn contains(&self, domain: DomainId, value: i32) -> bool {
                self.assignments.is_value_in_domain(domain, value)
            }
        }
    };
}

impl_read_domains!(PropagationContext);
impl_read_domains!(PropagationContextMut);
impl_read_domains!(PropagatorInitialisationContext);
