//! End-to-end scenarios: a mixed 10-node/10-VM reconfiguration surviving the text round
//! trip, saturation-driven migration, and merging of independently solved partitions.

use corral_solver::engine::termination::Indefinite;
use corral_solver::model::Configuration;
use corral_solver::model::ElementName;
use corral_solver::model::ResourceSpecification;
use corral_solver::model::VmState;
use corral_solver::plan::merge_plans;
use corral_solver::plan::text::read_plan;
use corral_solver::plan::text::write_plan;
use corral_solver::plan::Action;
use corral_solver::plan::ActionKind;
use corral_solver::plan::ReconfigurationPlan;
use corral_solver::problem::ProblemOptions;
use corral_solver::problem::ReconfigurationProblem;
use corral_solver::problem::SolveOutcome;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 10 nodes (8 online, 2 offline) and 10 VMs across waiting, running, and sleeping states.
fn data_center() -> Configuration {
    let mut configuration = Configuration::default();
    for node in 1..=8 {
        configuration.add_online_node(format!("n{node}"));
    }
    configuration.add_offline_node("n9");
    configuration.add_offline_node("n10");

    configuration.add_waiting_vm("vm1");
    configuration.add_running_vm("vm2", "n1").expect("n1 is online");
    configuration.add_running_vm("vm3", "n1").expect("n1 is online");
    configuration.add_running_vm("vm4", "n2").expect("n2 is online");
    configuration.add_sleeping_vm("vm5", "n3").expect("n3 is online");
    configuration.add_running_vm("vm6", "n5").expect("n5 is online");
    configuration.add_running_vm("vm7", "n1").expect("n1 is online");
    configuration.add_sleeping_vm("vm8", "n6").expect("n6 is online");
    configuration.add_running_vm("vm9", "n8").expect("n8 is online");
    configuration.add_waiting_vm("vm10");
    configuration
}

#[test]
fn a_mixed_reconfiguration_survives_the_text_round_trip() {
    init_logger();
    let source = data_center();

    let mut plan = ReconfigurationPlan::new(source.clone());
    let actions = [
        Action::scheduled(ActionKind::Startup { node: "n9".into() }, 0, 1),
        Action::scheduled(ActionKind::Startup { node: "n10".into() }, 0, 1),
        Action::scheduled(ActionKind::Shutdown { node: "n7".into() }, 1, 2),
        Action::scheduled(
            ActionKind::Migrate {
                vm: "vm3".into(),
                from: "n1".into(),
                to: "n4".into(),
            },
            0,
            3,
        ),
        Action::scheduled(
            ActionKind::Suspend {
                vm: "vm4".into(),
                on: "n2".into(),
            },
            0,
            1,
        ),
        Action::scheduled(
            ActionKind::Resume {
                vm: "vm5".into(),
                from: "n3".into(),
                to: "n6".into(),
            },
            1,
            2,
        ),
        Action::scheduled(
            ActionKind::Run {
                vm: "vm1".into(),
                host: "n1".into(),
            },
            0,
            1,
        ),
        Action::scheduled(
            ActionKind::Stop {
                vm: "vm7".into(),
                on: "n1".into(),
            },
            0,
            1,
        ),
    ];
    for action in actions {
        plan.add(action).expect("every action is fresh and well-bound");
    }

    // The plan replays cleanly on the source.
    let replayed = plan.apply().expect("the plan is consistent");
    assert!(!replayed.node(&"n7".into()).expect("n7 is registered").online);
    assert!(replayed.node(&"n9".into()).expect("n9 is registered").online);

    // And it survives serialisation: same action count, same content.
    let mut sink: Vec<u8> = Vec::new();
    write_plan(&plan, &mut sink).expect("writing to memory");
    let parsed = read_plan(sink.as_slice(), source).expect("the written plan parses back");

    assert_eq!(parsed.len(), 8);
    assert_eq!(parsed, plan);
}

#[test]
fn a_saturated_node_forces_a_migration() {
    init_logger();
    // Three capacity-2 nodes. vm0 (load 2) is committed to stay on n1, which saturates it;
    // vm1 (load 1) also lives on n1 and must be moved elsewhere.
    let mut source = Configuration::default();
    source.add_online_node("n1");
    source.add_online_node("n2");
    source.add_online_node("n3");
    source.add_running_vm("vm0", "n1").expect("n1 is online");
    source
        .set_migration_target(&"vm0".into(), &"n1".into())
        .expect("vm0 is running");
    source.add_running_vm("vm1", "n1").expect("n1 is online");
    source.add_running_vm("vm2", "n2").expect("n2 is online");

    let mut memory = ResourceSpecification::new("mem");
    let _ = memory.set_use("vm0", 2).set_use("vm1", 1).set_use("vm2", 1);
    let _ = memory
        .set_capacity("n1", 2)
        .set_capacity("n2", 2)
        .set_capacity("n3", 2);

    let mut problem =
        ReconfigurationProblem::new(source, vec![memory], ProblemOptions::default())
            .expect("the model is complete");
    let outcome = problem.solve(&mut Indefinite).expect("solving succeeds");

    let SolveOutcome::Reconfiguration(solved) = outcome else {
        panic!("moving vm1 off n1 is feasible");
    };
    let vm1_host = match solved
        .target
        .vm_state(&"vm1".into())
        .expect("vm1 is registered")
    {
        VmState::Running { host } => host.clone(),
        state => panic!("vm1 should still be running, got {state:?}"),
    };
    assert_ne!(vm1_host, ElementName::new("n1"));

    // The plan moves vm1 exactly once.
    let migrations: Vec<_> = solved
        .plan
        .actions()
        .iter()
        .filter(|action| {
            matches!(&action.kind, ActionKind::Migrate { vm, .. } if vm.as_str() == "vm1")
        })
        .collect();
    assert_eq!(migrations.len(), 1);
}

#[test]
fn partitions_solved_on_separate_threads_merge_into_one_plan() {
    init_logger();

    let partition = |node_prefix: &str, vm_prefix: &str| {
        let mut configuration = Configuration::default();
        configuration.add_online_node(format!("{node_prefix}1"));
        configuration.add_online_node(format!("{node_prefix}2"));
        configuration
            .add_running_vm(format!("{vm_prefix}1"), format!("{node_prefix}1"))
            .expect("the node is online");
        configuration.add_waiting_vm(format!("{vm_prefix}2"));

        let mut memory = ResourceSpecification::new("mem");
        let _ = memory
            .set_use(format!("{vm_prefix}1"), 1)
            .set_use(format!("{vm_prefix}2"), 1);
        let _ = memory
            .set_capacity(format!("{node_prefix}1"), 2)
            .set_capacity(format!("{node_prefix}2"), 2);
        (configuration, vec![memory])
    };

    // Each partition owns its engine and configuration clone; nothing is shared.
    let handles: Vec<_> = [partition("a", "u"), partition("b", "v")]
        .into_iter()
        .map(|(configuration, resources)| {
            std::thread::spawn(move || {
                let mut problem = ReconfigurationProblem::new(
                    configuration,
                    resources,
                    ProblemOptions::default(),
                )
                .expect("the model is complete");
                match problem.solve(&mut Indefinite).expect("solving succeeds") {
                    SolveOutcome::Reconfiguration(solved) => solved.plan,
                    outcome => panic!("each partition is feasible, got {outcome:?}"),
                }
            })
        })
        .collect();

    let plans: Vec<ReconfigurationPlan> = handles
        .into_iter()
        .map(|handle| handle.join().expect("the solve does not panic"))
        .collect();

    let merged = merge_plans(&plans).expect("the partitions are disjoint");
    assert_eq!(merged.len(), plans.iter().map(ReconfigurationPlan::len).sum::<usize>());
    assert!(merged.source().node(&"a1".into()).is_some());
    assert!(merged.source().node(&"b1".into()).is_some());
    // The merged plan still replays cleanly on the merged source.
    let _ = merged.apply().expect("the merged plan is consistent");
}
