use std::collections::BTreeMap;

use crate::model::ElementName;
use crate::model::ModelError;

/// A named resource dimension (e.g. `"mem"` or `"cpu"`): how much of it every VM consumes and
/// how much every hoster offers.
///
/// A hoster may additionally carry an *additional use*, a constant baseline consumption
/// independent of the hosted VMs (typically hypervisor overhead); it defaults to zero.
///
/// Every VM and hoster referenced by a placement problem must have a value defined for every
/// declared resource; querying an element without one is reported as an error rather than
/// silently defaulting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSpecification {
    identifier: String,
    vm_uses: BTreeMap<ElementName, i64>,
    capacities: BTreeMap<ElementName, i64>,
    additional_uses: BTreeMap<ElementName, i64>,
}

impl ResourceSpecification {
    pub fn new(identifier: impl Into<String>) -> Self {
        ResourceSpecification {
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn set_use(&mut self, vm: impl Into<ElementName>, amount: i64) -> &mut Self {
        let _ = self.vm_uses.insert(vm.into(), amount);
        self
    }

    pub fn set_capacity(&mut self, hoster: impl Into<ElementName>, amount: i64) -> &mut Self {
        let _ = self.capacities.insert(hoster.into(), amount);
        self
    }

    pub fn set_additional_use(
        &mut self,
        hoster: impl Into<ElementName>,
        amount: i64,
    ) -> &mut Self {
        let _ = self.additional_uses.insert(hoster.into(), amount);
        self
    }

    pub fn use_of(&self, vm: &ElementName) -> Result<i64, ModelError> {
        self.vm_uses
            .get(vm)
            .copied()
            .ok_or_else(|| ModelError::UndefinedResourceValue {
                resource: self.identifier.clone(),
                element: vm.clone(),
            })
    }

    /// The VM's use, or zero when none is declared; for orderings where a missing declaration
    /// must not abort the comparison.
    pub fn use_of_or_default(&self, vm: &ElementName) -> i64 {
        self.vm_uses.get(vm).copied().unwrap_or(0)
    }

    pub fn capacity_of(&self, hoster: &ElementName) -> Result<i64, ModelError> {
        self.capacities
            .get(hoster)
            .copied()
            .ok_or_else(|| ModelError::UndefinedResourceValue {
                resource: self.identifier.clone(),
                element: hoster.clone(),
            })
    }

    pub fn capacity_of_or_default(&self, hoster: &ElementName) -> i64 {
        self.capacities.get(hoster).copied().unwrap_or(0)
    }

    pub fn additional_use_of(&self, hoster: &ElementName) -> i64 {
        self.additional_uses.get(hoster).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undeclared_elements_are_reported() {
        let mut memory = ResourceSpecification::new("mem");
        let _ = memory.set_use("vm1", 512);

        let vm2 = ElementName::new("vm2");
        assert_eq!(
            memory.use_of(&vm2),
            Err(ModelError::UndefinedResourceValue {
                resource: "mem".to_owned(),
                element: vm2,
            })
        );
    }

    #[test]
    fn additional_use_defaults_to_zero() {
        let memory = ResourceSpecification::new("mem");
        assert_eq!(memory.additional_use_of(&ElementName::new("n1")), 0);
    }
}
