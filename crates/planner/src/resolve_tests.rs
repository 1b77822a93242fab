// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ens_core::test_support::provider_user_assembly;
use ens_core::ComponentType;
use ens_messaging::{GlobalAckRegistry, MailboxMessaging};

fn mailbox_for(assembly: &Assembly) -> Arc<dyn Messaging> {
    Arc::new(MailboxMessaging::new(
        assembly.ids().cloned().collect::<Vec<_>>(),
        GlobalAckRegistry::new(),
    ))
}

fn no_goals() -> IndexMap<ComponentId, Vec<ReconfigurationGoal>> {
    IndexMap::new()
}

#[tokio::test]
async fn resolve_single_instance() {
    let assembly = provider_user_assembly();
    let messaging = mailbox_for(&assembly);
    let goals = IndexMap::from([(
        ComponentId::new("prov"),
        vec![ReconfigurationGoal::state("on", true)],
    )]);

    let plans = resolve(&assembly, &goals, &IndexMap::new(), messaging, &PlannerConfig::default())
        .await
        .unwrap();

    assert_eq!(plans.len(), 2);
    assert_eq!(plans["prov"].instructions(), [Instruction::push_b("prov", "deploy")]);
    assert!(plans["user"].is_empty());
}

#[tokio::test]
async fn resolve_update_scenario_plans_both_sides() {
    let mut assembly = provider_user_assembly();
    assembly.set_active_place("prov", "on").unwrap();
    assembly.set_active_place("user", "running").unwrap();
    let messaging = mailbox_for(&assembly);

    let goals = IndexMap::from([(
        ComponentId::new("prov"),
        vec![ReconfigurationGoal::behavior("update", false)],
    )]);
    let state_targets = IndexMap::from([
        (ComponentId::new("prov"), StateTarget::Start),
        (ComponentId::new("user"), StateTarget::Start),
    ]);

    let plans = resolve(&assembly, &goals, &state_targets, messaging, &PlannerConfig::default())
        .await
        .unwrap();

    assert_eq!(
        plans["prov"].instructions().first(),
        Some(&Instruction::push_b("prov", "update")),
    );
    assert!(plans["prov"].instructions().iter().all(|i| i.is_push_b()));
    assert_eq!(
        plans["user"].instructions(),
        [
            Instruction::push_b("user", "stop"),
            Instruction::wait("prov", "update"),
            Instruction::push_b("user", "start"),
        ],
    );
}

#[tokio::test]
async fn resolve_with_no_goals_returns_empty_plans() {
    let assembly = provider_user_assembly();
    let messaging = mailbox_for(&assembly);

    let plans =
        resolve(&assembly, &no_goals(), &IndexMap::new(), messaging, &PlannerConfig::default())
            .await
            .unwrap();

    assert!(plans.values().all(|p| p.is_empty()));
}

#[tokio::test]
async fn unreachable_goal_bearing_instance_times_out() {
    let assembly = provider_user_assembly();
    let messaging = mailbox_for(&assembly);
    // A goal for an instance hosted nowhere: quiescence can never hold.
    let goals = IndexMap::from([(
        ComponentId::new("elsewhere"),
        vec![ReconfigurationGoal::behavior("deploy", false)],
    )]);
    let config = PlannerConfig::default().deadline_ms(200u64).poll_interval_ms(5);

    let err = resolve(&assembly, &goals, &IndexMap::new(), messaging, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::PlanningTimedOut { deadline_ms: 200 }));
}

#[tokio::test]
async fn invalid_goal_surfaces() {
    let assembly = provider_user_assembly();
    let messaging = mailbox_for(&assembly);
    let goals = IndexMap::from([(
        ComponentId::new("prov"),
        vec![ReconfigurationGoal::behavior("reboot", false)],
    )]);

    let err = resolve(&assembly, &goals, &IndexMap::new(), messaging, &PlannerConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::Goal(GoalError::UnknownBehavior { .. })));
}

#[tokio::test]
async fn plan_wraps_merged_plan_in_diff() {
    let assembly = provider_user_assembly();
    let messaging = mailbox_for(&assembly);
    let state_targets = IndexMap::from([
        (ComponentId::new("prov"), StateTarget::Running),
        (ComponentId::new("user"), StateTarget::Running),
    ]);

    // Target drops the user instance and its connection.
    let mut target = AssemblySkeleton::new();
    target.components.insert(ComponentId::new("prov"), "provider".into());

    let final_plan = plan(
        &assembly,
        &target,
        &no_goals(),
        &state_targets,
        messaging,
        &PlannerConfig::default(),
    )
    .await
    .unwrap();

    let rendered: Vec<String> =
        final_plan.instructions().iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        [
            "pushB(prov, deploy)",
            "pushB(user, start)",
            "discon(prov, service, user, service)",
            "del(user)",
        ],
    );
}

#[yare::parameterized(
    start   = { StateTarget::Start,   "idle" },
    initial = { StateTarget::Initial, "idle" },
    running = { StateTarget::Running, "running" },
    named   = { StateTarget::Place("running".into()), "running" },
)]
fn promotion(target: StateTarget, expected: &str) {
    let assembly = provider_user_assembly();
    let instance = assembly.instance("user").unwrap();
    let active = assembly.active_place("user").unwrap();

    let goal = promote_state_target(instance, active, &target).unwrap();
    assert_eq!(goal, ReconfigurationGoal::state(expected, true));
}

#[test]
fn promotion_of_unknown_place_fails() {
    let assembly = provider_user_assembly();
    let instance = assembly.instance("user").unwrap();
    let active = assembly.active_place("user").unwrap();

    let err =
        promote_state_target(instance, active, &StateTarget::Place("limbo".into())).unwrap_err();
    assert!(matches!(err, GoalError::UnknownPlace { .. }));
}

#[test]
fn promotion_without_running_place_fails() {
    let ty = ComponentType::builder("minimal")
        .places(["only"])
        .initial("only")
        .build()
        .unwrap();
    let mut assembly = Assembly::new();
    assembly.add_instance("solo", Arc::new(ty)).unwrap();
    let instance = assembly.instance("solo").unwrap();
    let active = assembly.active_place("solo").unwrap();

    let err = promote_state_target(instance, active, &StateTarget::Running).unwrap_err();
    assert!(matches!(err, GoalError::NoRunningPlace { .. }));
}
