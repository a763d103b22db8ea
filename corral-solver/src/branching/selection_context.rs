use crate::engine::variables::DomainId;
use crate::engine::Assignments;

/// Read-only view of the current domains from which branchers and heuristics pick their next
/// decision.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    assignments: &'a Assignments,
}

impl<'a> SelectionContext<'a> {
    pub fn new(assignments: &'a Assignments) -> Self {
        SelectionContext { assignments }
    }

    pub fn lower_bound(&self, domain: DomainId) -> i32 {
        self.assignments.get_lower_bound(domain)
    }

    pub fn upper_bound(&self, domain: DomainId) -> i32 {
        self.assignments.get_upper_bound(domain)
    }

    pub fn contains(&self, domain: DomainId, value: i32) -> bool {
        self.assignments.is_value_in_domain(domain, value)
    }

    pub fn is_fixed(&self, domain: DomainId) -> bool {
        self.assignments.is_domain_assigned(domain)
    }

    /// The value of a fixed variable.
    pub fn assigned_value(&self, domain: DomainId) -> i32 {
        self.assignments.get_assigned_value(domain)
    }

    pub fn domains(&self) -> impl Iterator<Item = DomainId> {
        self.assignments.domains()
    }
}
