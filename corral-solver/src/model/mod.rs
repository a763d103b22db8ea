//! The data-center configuration model: managed elements (nodes, VMs, externs, sites), the
//! resource specifications mapping them to integer uses and capacities, and the
//! [`Configuration`] aggregate owning a consistent snapshot of the whole infrastructure.

mod configuration;
mod element;
mod error;
mod ordering;
mod resources;

pub use configuration::Configuration;
pub use element::ElementName;
pub use element::Node;
pub use element::VmState;
pub use error::ModelError;
pub use ordering::compare_hosters_by_capacity;
pub use ordering::compare_vms_by_use;
pub use ordering::sort_vms_by_use;
pub use ordering::Direction;
pub use resources::ResourceSpecification;
