use crate::model::Configuration;
use crate::model::ElementName;
use crate::model::VmState;

/// What a reconfiguration action does, with exactly the elements each kind needs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionKind {
    /// Start a waiting VM on a hoster.
    Run { vm: ElementName, host: ElementName },
    /// Move a running VM between hosters.
    Migrate {
        vm: ElementName,
        from: ElementName,
        to: ElementName,
    },
    /// Power a node up.
    Startup { node: ElementName },
    /// Power a node down; every VM must have vacated it.
    Shutdown { node: ElementName },
    /// Suspend a running VM in place.
    Suspend { vm: ElementName, on: ElementName },
    /// Wake a sleeping VM, possibly on a different hoster.
    Resume {
        vm: ElementName,
        from: ElementName,
        to: ElementName,
    },
    /// Terminate a running VM.
    Stop { vm: ElementName, on: ElementName },
}

/// An immutable description of a single state change, scheduled over the half-open interval
/// `[start, end)`.
///
/// Application is all-or-nothing: [`Action::apply`] performs the change only when
/// [`Action::can_apply`] holds and reports whether it did. The elements an action touches
/// drive the dependency computation in the
/// [`ActionGraph`](crate::plan::ActionGraph).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Action {
    pub kind: ActionKind,
    pub start: u32,
    pub end: u32,
}

impl Action {
    /// An action scheduled at the origin; extraction assigns the real interval.
    pub fn new(kind: ActionKind) -> Self {
        Action {
            kind,
            start: 0,
            end: 0,
        }
    }

    pub fn scheduled(kind: ActionKind, start: u32, end: u32) -> Self {
        Action { kind, start, end }
    }

    /// Whether the action is executable against `configuration` right now.
    pub fn can_apply(&self, configuration: &Configuration) -> bool {
        match &self.kind {
            ActionKind::Run { vm, host } => {
                matches!(configuration.vm_state(vm), Some(VmState::Waiting))
                    && configuration.is_hoster_online(host)
            }
            ActionKind::Migrate { vm, from, to } => {
                configuration.is_hoster_online(to)
                    && match configuration.vm_state(vm) {
                        Some(VmState::Running { host }) => host == from,
                        Some(VmState::Migrating { from: source, to: target }) => {
                            source == from && target == to
                        }
                        _ => false,
                    }
            }
            ActionKind::Startup { node } => configuration
                .node(node)
                .is_some_and(|node| !node.online),
            ActionKind::Shutdown { node } => {
                configuration.node(node).is_some_and(|node| node.online)
                    && configuration.vms_on(node).is_empty()
            }
            ActionKind::Suspend { vm, on } => {
                matches!(configuration.vm_state(vm), Some(VmState::Running { host }) if host == on)
            }
            ActionKind::Resume { vm, from, to } => {
                configuration.is_hoster_online(to)
                    && matches!(
                        configuration.vm_state(vm),
                        Some(VmState::Sleeping { host }) if host == from
                    )
            }
            ActionKind::Stop { vm, on } => {
                matches!(configuration.vm_state(vm), Some(VmState::Running { host }) if host == on)
            }
        }
    }

    /// Applies the action; a `false` return means nothing was changed.
    pub fn apply(&self, configuration: &mut Configuration) -> bool {
        if !self.can_apply(configuration) {
            return false;
        }
        let result = match &self.kind {
            ActionKind::Run { vm, host } => configuration.run_vm(vm, host),
            ActionKind::Migrate { vm, to, .. } => configuration.migrate_vm(vm, to),
            ActionKind::Startup { node } => configuration.set_node_online(node),
            ActionKind::Shutdown { node } => configuration.set_node_offline(node),
            ActionKind::Suspend { vm, .. } => configuration.suspend_vm(vm),
            ActionKind::Resume { vm, to, .. } => configuration.resume_vm(vm, to),
            ActionKind::Stop { vm, .. } => configuration.stop_vm(vm),
        };
        result.is_ok()
    }

    /// The managed elements the action reads or writes.
    pub fn touched_elements(&self) -> Vec<&ElementName> {
        match &self.kind {
            ActionKind::Run { vm, host } => vec![vm, host],
            ActionKind::Migrate { vm, from, to } | ActionKind::Resume { vm, from, to } => {
                vec![vm, from, to]
            }
            ActionKind::Startup { node } | ActionKind::Shutdown { node } => vec![node],
            ActionKind::Suspend { vm, on } | ActionKind::Stop { vm, on } => vec![vm, on],
        }
    }

    /// The hoster this action moves a VM footprint onto, if any.
    pub(crate) fn arrival(&self) -> Option<(&ElementName, &ElementName)> {
        match &self.kind {
            ActionKind::Run { vm, host } => Some((vm, host)),
            ActionKind::Migrate { vm, to, .. } | ActionKind::Resume { vm, to, .. } => {
                Some((vm, to))
            }
            _ => None,
        }
    }

    /// The hoster this action moves a VM footprint off, if any.
    pub(crate) fn departure(&self) -> Option<(&ElementName, &ElementName)> {
        match &self.kind {
            ActionKind::Migrate { vm, from, .. } | ActionKind::Resume { vm, from, .. } => {
                Some((vm, from))
            }
            ActionKind::Stop { vm, on } => Some((vm, on)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Action {
    /// The canonical one-line form, e.g. `migrate(vm3,n1,n4,0,5)`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (start, end) = (self.start, self.end);
        match &self.kind {
            ActionKind::Run { vm, host } => write!(f, "run({vm},{host},{start},{end})"),
            ActionKind::Migrate { vm, from, to } => {
                write!(f, "migrate({vm},{from},{to},{start},{end})")
            }
            ActionKind::Startup { node } => write!(f, "startup({node},{start},{end})"),
            ActionKind::Shutdown { node } => write!(f, "shutdown({node},{start},{end})"),
            ActionKind::Suspend { vm, on } => write!(f, "suspend({vm},{on},{start},{end})"),
            ActionKind::Resume { vm, from, to } => {
                write!(f, "resume({vm},{from},{to},{start},{end})")
            }
            ActionKind::Stop { vm, on } => write!(f, "stop({vm},{on},{start},{end})"),
        }
    }
}
