// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ens_core::test_support::provider_user_assembly;
use ens_core::{Assembly, PortStatus};
use ens_messaging::{GlobalAckRegistry, MailboxMessaging};

fn nodes(assembly: &Assembly) -> (PlannerNode, PlannerNode, MailboxMessaging) {
    let prov = assembly.instance("prov").unwrap();
    let user = assembly.instance("user").unwrap();
    let prov_node =
        PlannerNode::new(prov, assembly.active_place("prov").unwrap(), None).unwrap();
    let user_node =
        PlannerNode::new(user, assembly.active_place("user").unwrap(), None).unwrap();
    let messaging = MailboxMessaging::new(["prov", "user"], GlobalAckRegistry::new());
    (prov_node, user_node, messaging)
}

#[tokio::test]
async fn goalless_node_stays_idle() {
    let assembly = provider_user_assembly();
    let (mut prov_node, _, messaging) = nodes(&assembly);

    let report = prov_node.step(&messaging).await.unwrap();

    assert_eq!(report.round, 0);
    assert!(!report.inferred);
    assert_eq!(report.messages_sent, 0);
    assert!(messaging.global_acks().await.unwrap().is_empty());
}

#[tokio::test]
async fn settled_goal_bearing_node_root_acks() {
    let assembly = provider_user_assembly();
    let (mut prov_node, _, messaging) = nodes(&assembly);
    prov_node.add_goal(ReconfigurationGoal::state("on", true)).unwrap();

    let report = prov_node.step(&messaging).await.unwrap();

    assert_eq!(report.round, 1);
    assert!(report.inferred);
    // Bring-up emits no constraint, so the node settles immediately.
    assert_eq!(report.messages_sent, 0);
    assert!(prov_node.is_settled());
    assert!(messaging.global_acks().await.unwrap().contains(&ComponentId::new("prov")));
}

#[tokio::test]
async fn update_scenario_exchanges_constraint_and_acks() {
    let mut assembly = provider_user_assembly();
    assembly.set_active_place("prov", "on").unwrap();
    assembly.set_active_place("user", "running").unwrap();
    let (mut prov_node, mut user_node, messaging) = nodes(&assembly);

    prov_node.add_goal(ReconfigurationGoal::behavior("update", false)).unwrap();
    prov_node.add_goal(ReconfigurationGoal::state("on", true)).unwrap();
    user_node.add_goal(ReconfigurationGoal::state("running", true)).unwrap();

    // Round 1: the provider announces the disabled window.
    let report = prov_node.step(&messaging).await.unwrap();
    assert_eq!(report.messages_sent, 1);
    assert!(prov_node.waiting_acks().contains(&ComponentId::new("user")));
    assert!(!messaging.global_acks().await.unwrap().contains(&ComponentId::new("prov")));

    // The user folds the constraint in, owes an ack, flushes it, settles.
    let report = user_node.step(&messaging).await.unwrap();
    assert_eq!(report.messages_sent, 0);
    assert!(user_node.is_settled());
    assert!(messaging.global_acks().await.unwrap().contains(&ComponentId::new("user")));

    // The provider consumes the ack and settles too.
    prov_node.step(&messaging).await.unwrap();
    assert!(prov_node.is_settled());
    assert!(messaging.global_acks().await.unwrap().contains(&ComponentId::new("prov")));

    // Plans: the provider runs its update; the user steps aside and waits.
    let prov_plan = prov_node.final_plan().unwrap();
    assert_eq!(prov_plan.instructions().first(), Some(&Instruction::push_b("prov", "update")));
    assert!(prov_plan.instructions().iter().all(|i| i.is_push_b()));

    let user_plan = user_node.final_plan().unwrap();
    assert_eq!(
        user_plan.instructions(),
        [
            Instruction::push_b("user", "stop"),
            Instruction::wait("prov", "update"),
            Instruction::push_b("user", "start"),
        ],
    );
}

#[tokio::test]
async fn repeated_steps_send_no_duplicate_constraints() {
    let mut assembly = provider_user_assembly();
    assembly.set_active_place("prov", "on").unwrap();
    let (mut prov_node, _, messaging) = nodes(&assembly);
    prov_node.add_goal(ReconfigurationGoal::behavior("update", false)).unwrap();
    prov_node.add_goal(ReconfigurationGoal::state("on", true)).unwrap();

    let first = prov_node.step(&messaging).await.unwrap();
    assert_eq!(first.messages_sent, 1);

    // Push another message at the node so it runs a second inference round.
    messaging
        .send_messages(
            &ComponentId::new("user"),
            1,
            vec![(
                ComponentId::new("prov"),
                ens_wire::PortConstraintMessage::new(
                    "user",
                    "service",
                    PortStatus::Enabled,
                    None,
                ),
            )],
        )
        .await
        .unwrap();

    let second = prov_node.step(&messaging).await.unwrap();
    assert_eq!(second.round, 2);
    // The same constraint is not re-sent.
    assert_eq!(second.messages_sent, 0);
}

#[tokio::test]
async fn unknown_peer_port_is_ignored_but_acked() {
    let assembly = provider_user_assembly();
    let (_, mut user_node, messaging) = nodes(&assembly);
    user_node.add_goal(ReconfigurationGoal::state("idle", true)).unwrap();

    messaging
        .send_messages(
            &ComponentId::new("prov"),
            1,
            vec![(
                ComponentId::new("user"),
                ens_wire::PortConstraintMessage::new(
                    "prov",
                    "telemetry",
                    PortStatus::Disabled,
                    None,
                ),
            )],
        )
        .await
        .unwrap();

    user_node.step(&messaging).await.unwrap();

    // The malformed constraint was dropped, not stored.
    assert!(user_node.received.values().all(|s| s.constraints.is_empty()));
    // Its sender still got an ack, so the protocol stays balanced.
    assert_eq!(messaging.get_acks(&ComponentId::new("prov")).await.unwrap().len(), 1);
    assert!(user_node.is_settled());
}

#[tokio::test]
async fn stale_rounds_are_discarded() {
    let assembly = provider_user_assembly();
    let (_, mut user_node, messaging) = nodes(&assembly);
    user_node.add_goal(ReconfigurationGoal::state("idle", true)).unwrap();

    let newer = ens_wire::PortConstraintMessage::new(
        "prov",
        "service",
        PortStatus::Disabled,
        Some("update".into()),
    );
    let older =
        ens_wire::PortConstraintMessage::new("prov", "service", PortStatus::Enabled, None);

    messaging
        .send_messages(&ComponentId::new("prov"), 5, vec![(ComponentId::new("user"), newer)])
        .await
        .unwrap();
    messaging
        .send_messages(&ComponentId::new("prov"), 3, vec![(ComponentId::new("user"), older)])
        .await
        .unwrap();

    user_node.step(&messaging).await.unwrap();

    let stored = &user_node.received[&ComponentId::new("prov")];
    assert_eq!(stored.round, 5);
    assert_eq!(stored.constraints.len(), 1);
    assert_eq!(stored.constraints[0].status, PortStatus::Disabled);
}

#[tokio::test]
async fn newer_round_replaces_previous_constraints() {
    let assembly = provider_user_assembly();
    let (_, mut user_node, messaging) = nodes(&assembly);
    user_node.add_goal(ReconfigurationGoal::state("idle", true)).unwrap();

    let first =
        ens_wire::PortConstraintMessage::new("prov", "service", PortStatus::Enabled, None);
    messaging
        .send_messages(&ComponentId::new("prov"), 1, vec![(ComponentId::new("user"), first)])
        .await
        .unwrap();
    user_node.step(&messaging).await.unwrap();

    let second = ens_wire::PortConstraintMessage::new(
        "prov",
        "service",
        PortStatus::Disabled,
        Some("update".into()),
    );
    messaging
        .send_messages(&ComponentId::new("prov"), 2, vec![(ComponentId::new("user"), second)])
        .await
        .unwrap();
    user_node.step(&messaging).await.unwrap();

    let stored = &user_node.received[&ComponentId::new("prov")];
    assert_eq!(stored.round, 2);
    assert_eq!(stored.constraints.len(), 1);
    assert_eq!(stored.constraints[0].status, PortStatus::Disabled);
}
