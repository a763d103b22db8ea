use std::collections::BTreeMap;

use crate::model::Configuration;
use crate::model::ElementName;
use crate::model::ModelError;
use crate::model::ResourceSpecification;
use crate::model::VmState;
use crate::plan::Action;
use crate::plan::ActionGraph;
use crate::plan::ActionId;
use crate::plan::ActionKind;

/// A VM footprint moving onto or off a hoster.
#[derive(Debug, Copy, Clone)]
struct Movement<'a> {
    id: ActionId,
    vm: &'a ElementName,
}

/// Derives the action-dependency graph taking `source` to `target`.
///
/// The primitive actions come from the per-element delta. Three families of dependencies are
/// declared:
///
/// * an action placing a VM onto a node which is offline in `source` waits for that node's
///   startup;
/// * a node shutdown waits for every action vacating the node;
/// * when a hoster cannot carry its arriving VMs on top of its current load, each arrival
///   waits for enough departures to have freed the capacity it needs (in every resource
///   dimension).
pub fn build_action_graph(
    source: &Configuration,
    target: &Configuration,
    resources: &[ResourceSpecification],
) -> Result<ActionGraph, ModelError> {
    let mut graph = ActionGraph::default();

    let mut startups: BTreeMap<&ElementName, ActionId> = BTreeMap::new();
    let mut shutdowns: Vec<(&ElementName, ActionId)> = Vec::new();
    for (name, node) in target.nodes() {
        let source_node = source
            .node(name)
            .ok_or_else(|| ModelError::UnknownElement(name.clone()))?;
        if node.online && !source_node.online {
            let id = graph.add_action(Action::new(ActionKind::Startup { node: name.clone() }));
            let _ = startups.insert(name, id);
        } else if !node.online && source_node.online {
            let id = graph.add_action(Action::new(ActionKind::Shutdown { node: name.clone() }));
            shutdowns.push((name, id));
        }
    }

    let mut arrivals: BTreeMap<&ElementName, Vec<Movement>> = BTreeMap::new();
    let mut departures: BTreeMap<&ElementName, Vec<Movement>> = BTreeMap::new();

    for (vm, target_state) in target.vms() {
        let source_state = source
            .vm_state(vm)
            .ok_or_else(|| ModelError::UnknownElement(vm.clone()))?;

        // The derived action, and the hosters gaining respectively losing the VM's footprint.
        let (kind, arrival, departure) = match (source_state, target_state) {
            (VmState::Waiting, VmState::Running { host }) => (
                Some(ActionKind::Run {
                    vm: vm.clone(),
                    host: host.clone(),
                }),
                Some(host),
                None,
            ),
            (VmState::Running { host: from }, VmState::Running { host: to }) if from != to => (
                Some(ActionKind::Migrate {
                    vm: vm.clone(),
                    from: from.clone(),
                    to: to.clone(),
                }),
                Some(to),
                Some(from),
            ),
            (VmState::Migrating { from, .. }, VmState::Running { host: to }) => (
                Some(ActionKind::Migrate {
                    vm: vm.clone(),
                    from: from.clone(),
                    to: to.clone(),
                }),
                (from != to).then_some(to),
                (from != to).then_some(from),
            ),
            (VmState::Running { host }, VmState::Sleeping { .. }) => (
                Some(ActionKind::Suspend {
                    vm: vm.clone(),
                    on: host.clone(),
                }),
                None,
                None,
            ),
            (VmState::Sleeping { host: from }, VmState::Running { host: to }) => (
                Some(ActionKind::Resume {
                    vm: vm.clone(),
                    from: from.clone(),
                    to: to.clone(),
                }),
                (from != to).then_some(to),
                (from != to).then_some(from),
            ),
            (VmState::Running { host }, VmState::Stopped) => (
                Some(ActionKind::Stop {
                    vm: vm.clone(),
                    on: host.clone(),
                }),
                None,
                Some(host),
            ),
            _ => (None, None, None),
        };

        let Some(kind) = kind else {
            continue;
        };
        let id = graph.add_action(Action::new(kind));
        if let Some(host) = arrival {
            arrivals.entry(host).or_default().push(Movement { id, vm });
        }
        if let Some(host) = departure {
            departures.entry(host).or_default().push(Movement { id, vm });
        }
    }

    // Arrivals at a node which is down in the source wait for its startup.
    for (host, movements) in &arrivals {
        if source.node(host).is_some_and(|node| !node.online) {
            if let Some(&startup) = startups.get(host) {
                for movement in movements {
                    graph.add_dependency(movement.id, startup);
                }
            }
        }
    }

    // A shutdown waits for every VM to have vacated the node.
    for (node, shutdown) in shutdowns {
        if let Some(movements) = departures.get(node) {
            for movement in movements {
                graph.add_dependency(shutdown, movement.id);
            }
        }
    }

    // Serialize conflicting resource claims: an arrival which does not fit into the hoster's
    // current free capacity waits for enough departures to have freed it.
    for (host, movements) in &arrivals {
        add_resource_dependencies(&mut graph, source, resources, host, movements, &departures)?;
    }

    Ok(graph)
}

fn add_resource_dependencies(
    graph: &mut ActionGraph,
    source: &Configuration,
    resources: &[ResourceSpecification],
    host: &ElementName,
    arrivals: &[Movement],
    departures: &BTreeMap<&ElementName, Vec<Movement>>,
) -> Result<(), ModelError> {
    if resources.is_empty() {
        return Ok(());
    }

    let mut free: Vec<i64> = Vec::with_capacity(resources.len());
    for resource in resources {
        let used = source.used(resource, host)?;
        free.push(resource.capacity_of(host)? - used - resource.additional_use_of(host));
    }

    let loads = |vm: &ElementName| -> Result<Vec<i64>, ModelError> {
        resources.iter().map(|resource| resource.use_of(vm)).collect()
    };

    // Biggest arrivals first, biggest departures first; ties keep the deterministic name
    // order the movements were collected in.
    let mut arrivals: Vec<(Movement, Vec<i64>)> = arrivals
        .iter()
        .map(|movement| Ok((*movement, loads(movement.vm)?)))
        .collect::<Result<_, ModelError>>()?;
    arrivals.sort_by(|a, b| b.1[0].cmp(&a.1[0]));

    let mut vacating: Vec<(Movement, Vec<i64>)> = departures
        .get(host)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .map(|movement| Ok((*movement, loads(movement.vm)?)))
        .collect::<Result<_, ModelError>>()?;
    vacating.sort_by(|a, b| b.1[0].cmp(&a.1[0]));

    let mut claimed = vec![0; resources.len()];
    let mut freed = vec![0; resources.len()];
    let mut prefix = 0;
    for (movement, arrival_loads) in &arrivals {
        for (claim, load) in claimed.iter_mut().zip(arrival_loads) {
            *claim += load;
        }
        let fits = |claimed: &[i64], freed: &[i64]| {
            claimed
                .iter()
                .zip(freed)
                .zip(&free)
                .all(|((claim, freed), free)| claim <= &(free + freed))
        };
        while !fits(&claimed, &freed) && prefix < vacating.len() {
            for (slot, load) in freed.iter_mut().zip(&vacating[prefix].1) {
                *slot += load;
            }
            prefix += 1;
        }
        for (departure, _) in &vacating[..prefix] {
            graph.add_dependency(movement.id, departure.id);
        }
    }
    Ok(())
}
