use crate::containers::KeyedVec;
use crate::engine::variables::DomainId;

/// A snapshot of fixed variable values taken when the search found a full assignment.
#[derive(Debug, Clone, Default)]
pub struct Solution {
    values: KeyedVec<DomainId, i32>,
}

impl Solution {
    pub(crate) fn new(values: KeyedVec<DomainId, i32>) -> Self {
        Solution { values }
    }

    /// The value the solution assigns to `domain`.
    pub fn value(&self, domain: DomainId) -> i32 {
        self.values[domain]
    }

    /// The number of variables captured by the solution.
    pub fn num_domains(&self) -> usize {
        self.values.len()
    }
}
