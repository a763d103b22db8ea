use super::TerminationCondition;

/// A [`TerminationCondition`] which never triggers; the search runs to completion.
#[derive(Debug, Copy, Clone)]
pub struct Indefinite;

impl TerminationCondition for Indefinite {
    fn should_stop(&mut self) -> bool {
        false
    }
}
