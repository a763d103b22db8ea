use std::cmp::Ordering;

use crate::model::ElementName;
use crate::model::ResourceSpecification;

/// Whether an ordering puts the smallest or the largest value first.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Increasing,
    Decreasing,
}

/// Compares two VMs by their use of `resource`; undeclared uses compare as zero.
///
/// Equal uses compare as [`Ordering::Equal`]: the comparison is a pure function of the
/// resource map, so a caller needing a total order must supply its own secondary key (the
/// sorting helpers below rely on stable sorting and the input order instead).
pub fn compare_vms_by_use(
    resource: &ResourceSpecification,
    direction: Direction,
    a: &ElementName,
    b: &ElementName,
) -> Ordering {
    let ordering = resource
        .use_of_or_default(a)
        .cmp(&resource.use_of_or_default(b));
    match direction {
        Direction::Increasing => ordering,
        Direction::Decreasing => ordering.reverse(),
    }
}

/// Compares two hosters by their capacity for `resource`; undeclared capacities compare as
/// zero.
pub fn compare_hosters_by_capacity(
    resource: &ResourceSpecification,
    direction: Direction,
    a: &ElementName,
    b: &ElementName,
) -> Ordering {
    let ordering = resource
        .capacity_of_or_default(a)
        .cmp(&resource.capacity_of_or_default(b));
    match direction {
        Direction::Increasing => ordering,
        Direction::Decreasing => ordering.reverse(),
    }
}

/// Sorts VMs by resource use; the sort is stable, so ties keep their input order.
pub fn sort_vms_by_use(
    resource: &ResourceSpecification,
    direction: Direction,
    vms: &mut [ElementName],
) {
    vms.sort_by(|a, b| compare_vms_by_use(resource, direction, a, b));
}
