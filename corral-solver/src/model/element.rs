/// The identity of a managed element (node, VM, extern, or site).
///
/// Elements are compared, ordered, and hashed by name alone; two elements with equal names are
/// the same element.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementName(String);

impl ElementName {
    pub fn new(name: impl Into<String>) -> Self {
        ElementName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementName {
    fn from(name: &str) -> Self {
        ElementName(name.to_owned())
    }
}

impl From<String> for ElementName {
    fn from(name: String) -> Self {
        ElementName(name)
    }
}

impl std::borrow::Borrow<str> for ElementName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A physical host.
///
/// The capacity of a node lives in the
/// [`ResourceSpecification`](crate::model::ResourceSpecification)s; the node itself only
/// carries its power state, which is mutated exclusively through
/// [`Configuration::set_node_online`](crate::model::Configuration::set_node_online) and
/// [`Configuration::set_node_offline`](crate::model::Configuration::set_node_offline).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Node {
    pub online: bool,
}

/// The lifecycle state of a VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmState {
    /// Not placed on any hoster yet.
    Waiting,
    /// Running on a node or extern.
    Running { host: ElementName },
    /// Suspended to disk on its hoster.
    Sleeping { host: ElementName },
    /// Mid-migration: still consuming resources on `from`, committed to land on `to`.
    Migrating { from: ElementName, to: ElementName },
    /// Terminated; keeps the name registered but consumes nothing.
    Stopped,
}

impl VmState {
    /// The hoster currently carrying the VM's footprint, if any.
    pub fn host(&self) -> Option<&ElementName> {
        match self {
            VmState::Running { host } | VmState::Sleeping { host } => Some(host),
            VmState::Migrating { from, .. } => Some(from),
            VmState::Waiting | VmState::Stopped => None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, VmState::Running { .. })
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self, VmState::Waiting)
    }
}
