use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::model::ElementName;
use crate::model::ModelError;
use crate::model::Node;
use crate::model::ResourceSpecification;
use crate::model::VmState;

/// A consistent snapshot of the infrastructure: every node, VM, extern, and site, with their
/// current states.
///
/// The configuration is the single source of truth for a "current" or "target" state. It owns
/// its elements; states are only changed through the explicit transition operations below.
/// Cloning yields a deep, independent copy, which is how what-if encodings and parallel solves
/// obtain their working state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    nodes: BTreeMap<ElementName, Node>,
    externs: BTreeSet<ElementName>,
    vms: BTreeMap<ElementName, VmState>,
    sites: BTreeMap<ElementName, BTreeSet<ElementName>>,
}

impl Configuration {
    // ---------- registration ----------

    pub fn add_online_node(&mut self, name: impl Into<ElementName>) {
        let _ = self.nodes.insert(name.into(), Node { online: true });
    }

    pub fn add_offline_node(&mut self, name: impl Into<ElementName>) {
        let _ = self.nodes.insert(name.into(), Node { online: false });
    }

    pub fn add_extern(&mut self, name: impl Into<ElementName>) {
        let _ = self.externs.insert(name.into());
    }

    /// Registers a named group of hosters.
    pub fn add_site(
        &mut self,
        name: impl Into<ElementName>,
        members: impl IntoIterator<Item = ElementName>,
    ) {
        let _ = self.sites.insert(name.into(), members.into_iter().collect());
    }

    pub fn add_waiting_vm(&mut self, name: impl Into<ElementName>) {
        let _ = self.vms.insert(name.into(), VmState::Waiting);
    }

    /// Registers a VM already running on `host`, which must be a registered, online hoster.
    pub fn add_running_vm(
        &mut self,
        name: impl Into<ElementName>,
        host: impl Into<ElementName>,
    ) -> Result<(), ModelError> {
        let host = host.into();
        self.ensure_online_hoster(&host)?;
        let _ = self.vms.insert(name.into(), VmState::Running { host });
        Ok(())
    }

    /// Registers a VM suspended on `host`.
    pub fn add_sleeping_vm(
        &mut self,
        name: impl Into<ElementName>,
        host: impl Into<ElementName>,
    ) -> Result<(), ModelError> {
        let host = host.into();
        self.ensure_online_hoster(&host)?;
        let _ = self.vms.insert(name.into(), VmState::Sleeping { host });
        Ok(())
    }

    pub fn remove_vm(&mut self, name: &ElementName) -> Result<(), ModelError> {
        self.vms
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ModelError::UnknownElement(name.clone()))
    }

    /// Removes an extern; it must not host any VM.
    pub fn remove_extern(&mut self, name: &ElementName) -> Result<(), ModelError> {
        if !self.externs.contains(name) {
            return Err(ModelError::UnknownElement(name.clone()));
        }
        if !self.vms_on(name).is_empty() {
            return Err(ModelError::NodeNotEmpty(name.clone()));
        }
        let _ = self.externs.remove(name);
        Ok(())
    }

    pub fn remove_site(&mut self, name: &ElementName) -> Result<(), ModelError> {
        self.sites
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ModelError::UnknownElement(name.clone()))
    }

    /// Removes a node; it must not host any VM.
    pub fn remove_node(&mut self, name: &ElementName) -> Result<(), ModelError> {
        if !self.nodes.contains_key(name) {
            return Err(ModelError::UnknownElement(name.clone()));
        }
        if !self.vms_on(name).is_empty() {
            return Err(ModelError::NodeNotEmpty(name.clone()));
        }
        let _ = self.nodes.remove(name);
        Ok(())
    }

    // ---------- queries ----------

    pub fn node(&self, name: &ElementName) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn vm_state(&self, name: &ElementName) -> Option<&VmState> {
        self.vms.get(name)
    }

    pub fn site(&self, name: &ElementName) -> Option<&BTreeSet<ElementName>> {
        self.sites.get(name)
    }

    pub fn is_extern(&self, name: &ElementName) -> bool {
        self.externs.contains(name)
    }

    /// Whether `name` refers to an entity able to run VMs (a node or an extern).
    pub fn is_hoster(&self, name: &ElementName) -> bool {
        self.nodes.contains_key(name) || self.externs.contains(name)
    }

    /// Whether `name` can accept VMs right now: externs always can, nodes only while online.
    pub fn is_hoster_online(&self, name: &ElementName) -> bool {
        self.externs.contains(name) || self.nodes.get(name).is_some_and(|node| node.online)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&ElementName, &Node)> {
        self.nodes.iter()
    }

    pub fn online_nodes(&self) -> impl Iterator<Item = &ElementName> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.online)
            .map(|(name, _)| name)
    }

    pub fn offline_nodes(&self) -> impl Iterator<Item = &ElementName> {
        self.nodes
            .iter()
            .filter(|(_, node)| !node.online)
            .map(|(name, _)| name)
    }

    pub fn externs(&self) -> impl Iterator<Item = &ElementName> {
        self.externs.iter()
    }

    pub fn vms(&self) -> impl Iterator<Item = (&ElementName, &VmState)> {
        self.vms.iter()
    }

    pub fn sites(&self) -> impl Iterator<Item = (&ElementName, &BTreeSet<ElementName>)> {
        self.sites.iter()
    }

    pub fn waiting_vms(&self) -> impl Iterator<Item = &ElementName> {
        self.vms
            .iter()
            .filter(|(_, state)| state.is_waiting())
            .map(|(name, _)| name)
    }

    /// The VMs whose footprint currently sits on `hoster`, in name order.
    pub fn vms_on(&self, hoster: &ElementName) -> Vec<&ElementName> {
        self.vms
            .iter()
            .filter(|(_, state)| state.host() == Some(hoster))
            .map(|(name, _)| name)
            .collect()
    }

    // ---------- node transitions ----------

    pub fn set_node_online(&mut self, name: &ElementName) -> Result<(), ModelError> {
        let node = self
            .nodes
            .get_mut(name)
            .ok_or_else(|| ModelError::UnknownElement(name.clone()))?;
        node.online = true;
        Ok(())
    }

    /// Powers a node down; every VM must have vacated it first.
    pub fn set_node_offline(&mut self, name: &ElementName) -> Result<(), ModelError> {
        if !self.nodes.contains_key(name) {
            return Err(ModelError::UnknownElement(name.clone()));
        }
        if !self.vms_on(name).is_empty() {
            return Err(ModelError::NodeNotEmpty(name.clone()));
        }
        self.nodes
            .get_mut(name)
            .expect("presence checked above")
            .online = false;
        Ok(())
    }

    // ---------- VM transitions ----------

    /// Waiting -> Running.
    pub fn run_vm(&mut self, vm: &ElementName, host: &ElementName) -> Result<(), ModelError> {
        self.ensure_online_hoster(host)?;
        match self.vm_state_mut(vm)? {
            state @ VmState::Waiting => {
                *state = VmState::Running { host: host.clone() };
                Ok(())
            }
            _ => Err(ModelError::InvalidTransition {
                vm: vm.clone(),
                transition: "start running",
            }),
        }
    }

    /// Running -> Running on another hoster.
    pub fn migrate_vm(&mut self, vm: &ElementName, to: &ElementName) -> Result<(), ModelError> {
        self.ensure_online_hoster(to)?;
        match self.vm_state_mut(vm)? {
            state @ (VmState::Running { .. } | VmState::Migrating { .. }) => {
                *state = VmState::Running { host: to.clone() };
                Ok(())
            }
            _ => Err(ModelError::InvalidTransition {
                vm: vm.clone(),
                transition: "migrate",
            }),
        }
    }

    /// Marks a running VM as committed to move to `to` without completing the move yet.
    pub fn set_migration_target(
        &mut self,
        vm: &ElementName,
        to: &ElementName,
    ) -> Result<(), ModelError> {
        self.ensure_online_hoster(to)?;
        let to = to.clone();
        let state = self.vm_state_mut(vm)?;
        match state {
            VmState::Running { host } => {
                let from = host.clone();
                *state = VmState::Migrating { from, to };
                Ok(())
            }
            _ => Err(ModelError::InvalidTransition {
                vm: vm.clone(),
                transition: "become a migration source",
            }),
        }
    }

    /// Running -> Sleeping, in place.
    pub fn suspend_vm(&mut self, vm: &ElementName) -> Result<(), ModelError> {
        let state = self.vm_state_mut(vm)?;
        match state {
            VmState::Running { host } => {
                let host = host.clone();
                *state = VmState::Sleeping { host };
                Ok(())
            }
            _ => Err(ModelError::InvalidTransition {
                vm: vm.clone(),
                transition: "suspend",
            }),
        }
    }

    /// Sleeping -> Running, possibly on a different hoster.
    pub fn resume_vm(&mut self, vm: &ElementName, to: &ElementName) -> Result<(), ModelError> {
        self.ensure_online_hoster(to)?;
        match self.vm_state_mut(vm)? {
            state @ VmState::Sleeping { .. } => {
                *state = VmState::Running { host: to.clone() };
                Ok(())
            }
            _ => Err(ModelError::InvalidTransition {
                vm: vm.clone(),
                transition: "resume",
            }),
        }
    }

    /// Running -> Stopped.
    pub fn stop_vm(&mut self, vm: &ElementName) -> Result<(), ModelError> {
        match self.vm_state_mut(vm)? {
            state @ VmState::Running { .. } => {
                *state = VmState::Stopped;
                Ok(())
            }
            _ => Err(ModelError::InvalidTransition {
                vm: vm.clone(),
                transition: "stop",
            }),
        }
    }

    // ---------- resource aggregation ----------

    /// The aggregated use of `resource` on `hoster`: the sum over every VM whose footprint sits
    /// there. The hoster's additional use is *not* included; see
    /// [`ResourceSpecification::additional_use_of`].
    pub fn used(
        &self,
        resource: &ResourceSpecification,
        hoster: &ElementName,
    ) -> Result<i64, ModelError> {
        if !self.is_hoster(hoster) {
            return Err(ModelError::UnknownElement(hoster.clone()));
        }
        self.vms_on(hoster)
            .into_iter()
            .try_fold(0, |total, vm| Ok(total + resource.use_of(vm)?))
    }

    /// Whether `hoster` can take `vm` on top of its current load, in every given resource
    /// dimension.
    pub fn can_host(
        &self,
        resources: &[ResourceSpecification],
        hoster: &ElementName,
        vm: &ElementName,
    ) -> Result<bool, ModelError> {
        if !self.vms.contains_key(vm) {
            return Err(ModelError::UnknownElement(vm.clone()));
        }
        if !self.is_hoster_online(hoster) {
            return Ok(false);
        }
        for resource in resources {
            let used = self.used(resource, hoster)?;
            let load = used + resource.additional_use_of(hoster) + resource.use_of(vm)?;
            if load > resource.capacity_of(hoster)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Whether any kind of element is registered under `name`.
    pub fn contains_element(&self, name: &ElementName) -> bool {
        self.nodes.contains_key(name)
            || self.externs.contains(name)
            || self.vms.contains_key(name)
            || self.sites.contains_key(name)
    }

    /// Raw VM insertion for merge plumbing; state consistency is the caller's responsibility.
    pub(crate) fn insert_vm_state(&mut self, name: ElementName, state: VmState) {
        let _ = self.vms.insert(name, state);
    }

    fn vm_state_mut(&mut self, vm: &ElementName) -> Result<&mut VmState, ModelError> {
        self.vms
            .get_mut(vm)
            .ok_or_else(|| ModelError::UnknownElement(vm.clone()))
    }

    fn ensure_online_hoster(&self, hoster: &ElementName) -> Result<(), ModelError> {
        if !self.is_hoster(hoster) {
            return Err(ModelError::UnknownElement(hoster.clone()));
        }
        if !self.is_hoster_online(hoster) {
            return Err(ModelError::HosterOffline(hoster.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_configuration() -> Configuration {
        let mut configuration = Configuration::default();
        configuration.add_online_node("n1");
        configuration.add_online_node("n2");
        configuration.add_offline_node("n3");
        configuration
            .add_running_vm("vm1", "n1")
            .expect("n1 is online");
        configuration
            .add_running_vm("vm2", "n1")
            .expect("n1 is online");
        configuration.add_waiting_vm("vm3");
        configuration
    }

    #[test]
    fn aggregated_use_sums_hosted_vms() {
        let configuration = small_configuration();
        let mut memory = ResourceSpecification::new("mem");
        let _ = memory.set_use("vm1", 2).set_use("vm2", 3).set_use("vm3", 1);
        let _ = memory.set_capacity("n1", 8).set_capacity("n2", 8);

        let n1 = ElementName::new("n1");
        assert_eq!(configuration.used(&memory, &n1), Ok(5));
    }

    #[test]
    fn unknown_hoster_is_an_error() {
        let configuration = small_configuration();
        let memory = ResourceSpecification::new("mem");
        let ghost = ElementName::new("ghost");
        assert_eq!(
            configuration.used(&memory, &ghost),
            Err(ModelError::UnknownElement(ghost))
        );
    }

    #[test]
    fn can_host_respects_capacity_and_additional_use() {
        let configuration = small_configuration();
        let mut memory = ResourceSpecification::new("mem");
        let _ = memory.set_use("vm1", 2).set_use("vm2", 3).set_use("vm3", 2);
        let _ = memory.set_capacity("n1", 8).set_capacity("n2", 8);
        let _ = memory.set_additional_use("n1", 2);
        let resources = [memory];

        let n1 = ElementName::new("n1");
        let n2 = ElementName::new("n2");
        let n3 = ElementName::new("n3");
        let vm3 = ElementName::new("vm3");

        // n1 carries 5 used + 2 additional; the load-2 vm3 does not fit within 8.
        assert_eq!(configuration.can_host(&resources, &n1, &vm3), Ok(false));
        assert_eq!(configuration.can_host(&resources, &n2, &vm3), Ok(true));
        // An offline node hosts nothing.
        assert_eq!(configuration.can_host(&resources, &n3, &vm3), Ok(false));
    }

    #[test]
    fn shutdown_requires_an_empty_node() {
        let mut configuration = small_configuration();
        let n1 = ElementName::new("n1");
        assert_eq!(
            configuration.set_node_offline(&n1),
            Err(ModelError::NodeNotEmpty(n1.clone()))
        );

        let n2 = ElementName::new("n2");
        assert_eq!(configuration.set_node_offline(&n2), Ok(()));
        assert!(!configuration.node(&n2).expect("n2 is registered").online);
    }

    #[test]
    fn lifecycle_transitions_are_checked() {
        let mut configuration = small_configuration();
        let vm3 = ElementName::new("vm3");
        let n2 = ElementName::new("n2");

        configuration.run_vm(&vm3, &n2).expect("vm3 is waiting");
        assert_eq!(
            configuration.vm_state(&vm3),
            Some(&VmState::Running { host: n2.clone() })
        );

        // Running VMs cannot be started again.
        assert!(matches!(
            configuration.run_vm(&vm3, &n2),
            Err(ModelError::InvalidTransition { .. })
        ));

        configuration.suspend_vm(&vm3).expect("vm3 is running");
        configuration.resume_vm(&vm3, &n2).expect("vm3 is sleeping");
        configuration.stop_vm(&vm3).expect("vm3 is running");
        assert_eq!(configuration.vm_state(&vm3), Some(&VmState::Stopped));
    }

    #[test]
    fn a_deep_clone_is_independent() {
        let configuration = small_configuration();
        let mut copy = configuration.clone();
        let vm1 = ElementName::new("vm1");
        copy.suspend_vm(&vm1).expect("vm1 is running");

        assert!(configuration
            .vm_state(&vm1)
            .expect("vm1 is registered")
            .is_running());
        assert!(!copy.vm_state(&vm1).expect("vm1 is registered").is_running());
    }
}
