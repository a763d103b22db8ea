//! Binding between the in-memory plan/configuration types and their text formats in
//! [`rplan_format`].

use std::io::Read;
use std::io::Write;

use rplan_format::reader::LayoutReader;
use rplan_format::reader::PlanReader;
use rplan_format::writer::LayoutWriter;
use rplan_format::writer::PlanWriter;
use rplan_format::NodeLine;
use rplan_format::PlanAction;

use crate::model::Configuration;
use crate::model::ElementName;
use crate::plan::Action;
use crate::plan::ActionKind;
use crate::plan::PlanTextError;
use crate::plan::ReconfigurationPlan;

/// Writes the plan's actions in start order, one canonical line each.
pub fn write_plan<W: Write>(
    plan: &ReconfigurationPlan,
    sink: W,
) -> std::io::Result<()> {
    let mut writer = PlanWriter::new(sink);
    let mut ordered: Vec<&Action> = plan.actions().iter().collect();
    ordered.sort_by_key(|action| action.start);
    for action in ordered {
        writer.write_action(&to_plan_action(action))?;
    }
    writer.finish()
}

/// Reads a plan file back over its source configuration.
///
/// Together with [`write_plan`] this is a round trip: the parsed plan equals the written one
/// (same source, same action multiset).
pub fn read_plan<R: Read>(
    source: R,
    configuration: Configuration,
) -> Result<ReconfigurationPlan, PlanTextError> {
    let mut reader = PlanReader::new(source);
    let mut plan = ReconfigurationPlan::new(configuration);
    while let Some(action) = reader.next_action()? {
        plan.add(from_plan_action(action))?;
    }
    Ok(plan)
}

/// Writes the layout of the online nodes: each with the VMs whose footprint sits on it.
pub fn write_configuration<W: Write>(
    configuration: &Configuration,
    sink: W,
) -> std::io::Result<()> {
    let mut writer = LayoutWriter::new(sink);
    for node in configuration.online_nodes() {
        let vms = configuration
            .vms_on(node)
            .into_iter()
            .map(ElementName::to_string)
            .collect();
        writer.write_node(&NodeLine {
            node: node.to_string(),
            vms,
        })?;
    }
    writer.finish()
}

/// Reads a layout file into a configuration of online nodes and running VMs.
pub fn read_configuration<R: Read>(source: R) -> Result<Configuration, PlanTextError> {
    let mut reader = LayoutReader::new(source);
    let mut configuration = Configuration::default();
    let mut line_nr = 0;
    while let Some(line) = reader.next_node()? {
        line_nr += 1;
        let node = ElementName::new(line.node);
        configuration.add_online_node(node.clone());
        for vm in line.vms {
            configuration
                .add_running_vm(vm, node.clone())
                .map_err(|_| PlanTextError::UnknownElement {
                    line_nr,
                    element: node.clone(),
                })?;
        }
    }
    Ok(configuration)
}

fn to_plan_action(action: &Action) -> PlanAction {
    let (start, end) = (action.start, action.end);
    match &action.kind {
        ActionKind::Run { vm, host } => PlanAction::Run {
            vm: vm.to_string(),
            host: host.to_string(),
            start,
            end,
        },
        ActionKind::Migrate { vm, from, to } => PlanAction::Migrate {
            vm: vm.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            start,
            end,
        },
        ActionKind::Startup { node } => PlanAction::Startup {
            node: node.to_string(),
            start,
            end,
        },
        ActionKind::Shutdown { node } => PlanAction::Shutdown {
            node: node.to_string(),
            start,
            end,
        },
        ActionKind::Suspend { vm, on } => PlanAction::Suspend {
            vm: vm.to_string(),
            on: on.to_string(),
            start,
            end,
        },
        ActionKind::Resume { vm, from, to } => PlanAction::Resume {
            vm: vm.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            start,
            end,
        },
        ActionKind::Stop { vm, on } => PlanAction::Stop {
            vm: vm.to_string(),
            on: on.to_string(),
            start,
            end,
        },
    }
}

fn from_plan_action(action: PlanAction) -> Action {
    match action {
        PlanAction::Run {
            vm,
            host,
            start,
            end,
        } => Action::scheduled(
            ActionKind::Run {
                vm: vm.into(),
                host: host.into(),
            },
            start,
            end,
        ),
        PlanAction::Migrate {
            vm,
            from,
            to,
            start,
            end,
        } => Action::scheduled(
            ActionKind::Migrate {
                vm: vm.into(),
                from: from.into(),
                to: to.into(),
            },
            start,
            end,
        ),
        PlanAction::Startup { node, start, end } => {
            Action::scheduled(ActionKind::Startup { node: node.into() }, start, end)
        }
        PlanAction::Shutdown { node, start, end } => {
            Action::scheduled(ActionKind::Shutdown { node: node.into() }, start, end)
        }
        PlanAction::Suspend { vm, on, start, end } => Action::scheduled(
            ActionKind::Suspend {
                vm: vm.into(),
                on: on.into(),
            },
            start,
            end,
        ),
        PlanAction::Resume {
            vm,
            from,
            to,
            start,
            end,
        } => Action::scheduled(
            ActionKind::Resume {
                vm: vm.into(),
                from: from.into(),
                to: to.into(),
            },
            start,
            end,
        ),
        PlanAction::Stop { vm, on, start, end } => Action::scheduled(
            ActionKind::Stop {
                vm: vm.into(),
                on: on.into(),
            },
            start,
            end,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_plan_survives_the_text_round_trip() {
        let mut configuration = Configuration::default();
        configuration.add_online_node("n1");
        configuration.add_online_node("n2");
        configuration
            .add_running_vm("vm1", "n1")
            .expect("n1 is online");

        let mut plan = ReconfigurationPlan::new(configuration.clone());
        plan.add(Action::scheduled(
            ActionKind::Migrate {
                vm: "vm1".into(),
                from: "n1".into(),
                to: "n2".into(),
            },
            0,
            1,
        ))
        .expect("fresh action");

        let mut sink: Vec<u8> = Vec::new();
        write_plan(&plan, &mut sink).expect("writing to memory");
        let parsed =
            read_plan(sink.as_slice(), configuration).expect("the written plan parses back");

        assert_eq!(parsed, plan);
    }

    #[test]
    fn a_layout_survives_the_text_round_trip() {
        let mut configuration = Configuration::default();
        configuration.add_online_node("n1");
        configuration.add_offline_node("n2");
        configuration
            .add_running_vm("vm1", "n1")
            .expect("n1 is online");
        configuration
            .add_running_vm("vm2", "n1")
            .expect("n1 is online");

        let mut sink: Vec<u8> = Vec::new();
        write_configuration(&configuration, &mut sink).expect("writing to memory");
        let parsed = read_configuration(sink.as_slice()).expect("the layout parses back");

        // The layout format captures the online nodes and their VMs; n2 is offline and not
        // part of the round trip.
        let n1 = ElementName::new("n1");
        assert_eq!(parsed.vms_on(&n1).len(), 2);
        assert!(parsed.node(&ElementName::new("n2")).is_none());
    }
}
