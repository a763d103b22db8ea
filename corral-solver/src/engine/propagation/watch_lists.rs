use crate::containers::KeyedVec;
use crate::engine::domain_events::DomainEvents;
use crate::engine::propagation::LocalId;
use crate::engine::propagation::PropagatorId;
use crate::engine::variables::DomainId;

/// For each variable, the propagators interested in its domain events.
#[derive(Debug, Default)]
pub(crate) struct WatchListCP {
    watchers: KeyedVec<DomainId, Vec<Watcher>>,
}

#[derive(Debug, Clone)]
pub(crate) struct Watcher {
    pub(crate) propagator: PropagatorId,
    pub(crate) local_id: LocalId,
    pub(crate) events: DomainEvents,
}

impl WatchListCP {
    /// Grows the watch-list to accommodate a newly created variable.
    pub(crate) fn grow(&mut self) {
        let _ = self.watchers.push(Vec::new());
    }

    pub(crate) fn add_watcher(&mut self, domain: DomainId, watcher: Watcher) {
        self.watchers[domain].push(watcher);
    }

    pub(crate) fn watchers(&self, domain: DomainId) -> &[Watcher] {
        &self.watchers[domain]
    }
}
