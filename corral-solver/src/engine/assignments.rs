use fnv::FnvHashSet;

use crate::basic_types::EmptyDomain;
use crate::containers::KeyedVec;
use crate::corral_assert_moderate;
use crate::corral_assert_simple;
use crate::engine::domain_events::IntDomainEvent;
use crate::engine::predicates::Predicate;
use crate::engine::variables::DomainId;

/// The backtrackable domain store of the engine.
///
/// Every domain is a bounded integer interval with an optional set of removed inner values
/// (holes). All domain operations are trailed so the search can undo them level by level; a
/// failed operation leaves the store untouched.
///
/// Domain changes additionally produce [`IntDomainEvent`]s which the solver drains to schedule
/// the propagators watching the affected variable.
#[derive(Debug, Default)]
pub struct Assignments {
    domains: KeyedVec<DomainId, IntegerDomain>,
    trail: Vec<TrailEntry>,
    /// Trail length at the moment each decision level was opened.
    decision_level_limits: Vec<usize>,
    events: Vec<(DomainId, IntDomainEvent)>,
}

#[derive(Debug, Clone)]
struct IntegerDomain {
    lower_bound: i32,
    upper_bound: i32,
    /// Values strictly between the bounds which have been removed.
    holes: FnvHashSet<i32>,
}

#[derive(Debug)]
enum TrailEntry {
    LowerBound { domain: DomainId, previous: i32 },
    UpperBound { domain: DomainId, previous: i32 },
    Removal { domain: DomainId, value: i32 },
}

impl Assignments {
    /// Creates a new integer variable with the inclusive domain `[lower_bound, upper_bound]`.
    pub fn grow(&mut self, lower_bound: i32, upper_bound: i32) -> DomainId {
        corral_assert_simple!(
            lower_bound <= upper_bound,
            "cannot create a variable with an empty domain"
        );
        self.domains.push(IntegerDomain {
            lower_bound,
            upper_bound,
            holes: FnvHashSet::default(),
        })
    }

    pub fn num_domains(&self) -> usize {
        self.domains.len()
    }

    pub fn domains(&self) -> impl Iterator<Item = DomainId> {
        self.domains.keys()
    }

    pub fn get_lower_bound(&self, domain: DomainId) -> i32 {
        self.domains[domain].lower_bound
    }

    pub fn get_upper_bound(&self, domain: DomainId) -> i32 {
        self.domains[domain].upper_bound
    }

    pub fn is_domain_assigned(&self, domain: DomainId) -> bool {
        let domain = &self.domains[domain];
        domain.lower_bound == domain.upper_bound
    }

    /// The value of an assigned variable; only meaningful when
    /// [`Assignments::is_domain_assigned`] holds.
    pub fn get_assigned_value(&self, domain: DomainId) -> i32 {
        corral_assert_moderate!(self.is_domain_assigned(domain));
        self.domains[domain].lower_bound
    }

    pub fn is_value_in_domain(&self, domain: DomainId, value: i32) -> bool {
        let domain = &self.domains[domain];
        value >= domain.lower_bound
            && value <= domain.upper_bound
            && !domain.holes.contains(&value)
    }

    /// The number of values currently in the domain.
    pub fn get_domain_size(&self, domain: DomainId) -> usize {
        let domain = &self.domains[domain];
        (domain.upper_bound - domain.lower_bound + 1) as usize - domain.holes.len()
    }

    /// Tightens the lower bound of `domain` to at least `bound`.
    ///
    /// A no-op if the current lower bound is already at least `bound`. Fails without mutating
    /// the store if the tightening would wipe out the domain.
    pub fn tighten_lower_bound(
        &mut self,
        domain: DomainId,
        bound: i32,
    ) -> Result<(), EmptyDomain> {
        let state = &self.domains[domain];
        if bound <= state.lower_bound {
            return Ok(());
        }

        // Skip over holes so the new lower bound is a value in the domain.
        let mut new_bound = bound;
        while new_bound <= state.upper_bound && state.holes.contains(&new_bound) {
            new_bound += 1;
        }
        if new_bound > state.upper_bound {
            return Err(EmptyDomain);
        }

        let previous = state.lower_bound;
        self.trail.push(TrailEntry::LowerBound { domain, previous });
        self.domains[domain].lower_bound = new_bound;

        self.events.push((domain, IntDomainEvent::LowerBound));
        if self.is_domain_assigned(domain) {
            self.events.push((domain, IntDomainEvent::Assign));
        }
        Ok(())
    }

    /// Tightens the upper bound of `domain` to at most `bound`.
    pub fn tighten_upper_bound(
        &mut self,
        domain: DomainId,
        bound: i32,
    ) -> Result<(), EmptyDomain> {
        let state = &self.domains[domain];
        if bound >= state.upper_bound {
            return Ok(());
        }

        let mut new_bound = bound;
        while new_bound >= state.lower_bound && state.holes.contains(&new_bound) {
            new_bound -= 1;
        }
        if new_bound < state.lower_bound {
            return Err(EmptyDomain);
        }

        let previous = state.upper_bound;
        self.trail.push(TrailEntry::UpperBound { domain, previous });
        self.domains[domain].upper_bound = new_bound;

        self.events.push((domain, IntDomainEvent::UpperBound));
        if self.is_domain_assigned(domain) {
            self.events.push((domain, IntDomainEvent::Assign));
        }
        Ok(())
    }

    /// Removes a single value from the domain.
    pub fn remove_value_from_domain(
        &mut self,
        domain: DomainId,
        value: i32,
    ) -> Result<(), EmptyDomain> {
        if !self.is_value_in_domain(domain, value) {
            return Ok(());
        }
        let state = &self.domains[domain];
        if state.lower_bound == value && state.upper_bound == value {
            return Err(EmptyDomain);
        }
        if state.lower_bound == value {
            return self.tighten_lower_bound(domain, value + 1);
        }
        if state.upper_bound == value {
            return self.tighten_upper_bound(domain, value - 1);
        }

        let _ = self.domains[domain].holes.insert(value);
        self.trail.push(TrailEntry::Removal { domain, value });
        self.events.push((domain, IntDomainEvent::Removal));
        Ok(())
    }

    /// Assigns the domain to a single value.
    pub fn make_assignment(&mut self, domain: DomainId, value: i32) -> Result<(), EmptyDomain> {
        if !self.is_value_in_domain(domain, value) {
            return Err(EmptyDomain);
        }
        self.tighten_lower_bound(domain, value)?;
        self.tighten_upper_bound(domain, value)
    }

    /// Applies a [`Predicate`] to the store.
    pub fn post(&mut self, predicate: Predicate) -> Result<(), EmptyDomain> {
        match predicate {
            Predicate::LowerBound { domain, bound } => self.tighten_lower_bound(domain, bound),
            Predicate::UpperBound { domain, bound } => self.tighten_upper_bound(domain, bound),
            Predicate::Equal { domain, value } => self.make_assignment(domain, value),
            Predicate::NotEqual { domain, value } => self.remove_value_from_domain(domain, value),
        }
    }

    /// Evaluates a predicate against the current domains; `None` when it is undecided.
    pub fn evaluate_predicate(&self, predicate: Predicate) -> Option<bool> {
        match predicate {
            Predicate::LowerBound { domain, bound } => {
                if self.get_lower_bound(domain) >= bound {
                    Some(true)
                } else if self.get_upper_bound(domain) < bound {
                    Some(false)
                } else {
                    None
                }
            }
            Predicate::UpperBound { domain, bound } => {
                if self.get_upper_bound(domain) <= bound {
                    Some(true)
                } else if self.get_lower_bound(domain) > bound {
                    Some(false)
                } else {
                    None
                }
            }
            Predicate::Equal { domain, value } => {
                if !self.is_value_in_domain(domain, value) {
                    Some(false)
                } else if self.is_domain_assigned(domain) {
                    Some(true)
                } else {
                    None
                }
            }
            Predicate::NotEqual { domain, value } => self
                .evaluate_predicate(Predicate::Equal { domain, value })
                .map(|truth_value| !truth_value),
        }
    }

    pub fn get_decision_level(&self) -> usize {
        self.decision_level_limits.len()
    }

    pub fn increase_decision_level(&mut self) {
        self.decision_level_limits.push(self.trail.len());
    }

    /// Undoes every domain operation performed after `level` was opened.
    ///
    /// Pending events from the abandoned branch are dropped.
    pub fn backtrack_to(&mut self, level: usize) {
        corral_assert_simple!(level <= self.get_decision_level());
        while self.decision_level_limits.len() > level {
            let limit = self
                .decision_level_limits
                .pop()
                .expect("checked by the loop condition");
            while self.trail.len() > limit {
                let entry = self.trail.pop().expect("trail cannot be shorter than limit");
                self.undo(entry);
            }
        }
        self.events.clear();
    }

    fn undo(&mut self, entry: TrailEntry) {
        match entry {
            TrailEntry::LowerBound { domain, previous } => {
                self.domains[domain].lower_bound = previous;
            }
            TrailEntry::UpperBound { domain, previous } => {
                self.domains[domain].upper_bound = previous;
            }
            TrailEntry::Removal { domain, value } => {
                let removed = self.domains[domain].holes.remove(&value);
                corral_assert_moderate!(removed, "trail entry must match a recorded hole");
            }
        }
    }

    pub(crate) fn drain_events(&mut self) -> Vec<(DomainId, IntDomainEvent)> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Total number of trailed operations; a cheap fixpoint indicator for tests.
    pub(crate) fn num_trail_entries(&self) -> usize {
        self.trail.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_tightened_and_restored() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(0, 10);

        assignments.increase_decision_level();
        assignments
            .tighten_lower_bound(x, 3)
            .expect("domain stays non-empty");
        assignments
            .tighten_upper_bound(x, 7)
            .expect("domain stays non-empty");
        assert_eq!(assignments.get_lower_bound(x), 3);
        assert_eq!(assignments.get_upper_bound(x), 7);

        assignments.backtrack_to(0);
        assert_eq!(assignments.get_lower_bound(x), 0);
        assert_eq!(assignments.get_upper_bound(x), 10);
    }

    #[test]
    fn removing_a_bound_value_advances_past_holes() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(0, 5);

        assignments
            .remove_value_from_domain(x, 1)
            .expect("domain stays non-empty");
        assignments
            .remove_value_from_domain(x, 0)
            .expect("domain stays non-empty");

        // 0 and 1 are both gone, so the lower bound lands on 2.
        assert_eq!(assignments.get_lower_bound(x), 2);
        assert!(!assignments.is_value_in_domain(x, 1));
    }

    #[test]
    fn wipeout_leaves_the_domain_untouched() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(2, 4);

        assert_eq!(assignments.tighten_lower_bound(x, 5), Err(EmptyDomain));
        assert_eq!(assignments.get_lower_bound(x), 2);
        assert_eq!(assignments.get_upper_bound(x), 4);
    }

    #[test]
    fn assignment_produces_assign_event() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(0, 1);

        assignments.make_assignment(x, 1).expect("1 is in the domain");
        let events = assignments.drain_events();
        assert!(events.contains(&(x, IntDomainEvent::Assign)));
        assert!(events.contains(&(x, IntDomainEvent::LowerBound)));
    }

    #[test]
    fn removing_the_last_value_is_a_wipeout() {
        let mut assignments = Assignments::default();
        let x = assignments.grow(3, 3);

        assert_eq!(assignments.remove_value_from_domain(x, 3), Err(EmptyDomain));
        assert!(assignments.is_value_in_domain(x, 3));
    }
}
