/// A reconfiguration action as it appears in a plan file.
///
/// The names are uninterpreted strings at this level; binding them to the elements of a
/// configuration is the consumer's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
    Run {
        vm: String,
        host: String,
        start: u32,
        end: u32,
    },
    Migrate {
        vm: String,
        from: String,
        to: String,
        start: u32,
        end: u32,
    },
    Startup {
        node: String,
        start: u32,
        end: u32,
    },
    Shutdown {
        node: String,
        start: u32,
        end: u32,
    },
    Suspend {
        vm: String,
        on: String,
        start: u32,
        end: u32,
    },
    Resume {
        vm: String,
        from: String,
        to: String,
        start: u32,
        end: u32,
    },
    Stop {
        vm: String,
        on: String,
        start: u32,
        end: u32,
    },
}

impl PlanAction {
    /// The keyword identifying the action kind in the text format.
    pub fn keyword(&self) -> &'static str {
        match self {
            PlanAction::Run { .. } => "run",
            PlanAction::Migrate { .. } => "migrate",
            PlanAction::Startup { .. } => "startup",
            PlanAction::Shutdown { .. } => "shutdown",
            PlanAction::Suspend { .. } => "suspend",
            PlanAction::Resume { .. } => "resume",
            PlanAction::Stop { .. } => "stop",
        }
    }
}

/// One line of a configuration layout file: an online node and the VMs hosted on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLine {
    pub node: String,
    pub vms: Vec<String>,
}
