// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::strategies::*;
use proptest::prelude::*;

#[test]
fn goal_display() {
    assert_eq!(ReconfigurationGoal::behavior("update", false).to_string(), "[BEHAVIOR] update");
    assert_eq!(ReconfigurationGoal::state("running", true).to_string(), "[STATE] running (final)");
    assert_eq!(
        ReconfigurationGoal::port("service", PortStatus::Disabled, false).to_string(),
        "[PORT] service - disabled",
    );
}

#[test]
fn goal_structural_equality() {
    let g1 = ReconfigurationGoal::behavior("deploy", false);
    let g2 = ReconfigurationGoal::behavior("deploy", false);
    let g3 = ReconfigurationGoal::behavior("deploy", true);
    assert_eq!(g1, g2);
    assert_ne!(g1, g3);
}

#[test]
fn goals_dedupe_in_sets() {
    let mut goals = std::collections::HashSet::new();
    goals.insert(ReconfigurationGoal::state("on", true));
    goals.insert(ReconfigurationGoal::state("on", true));
    assert_eq!(goals.len(), 1);
}

#[yare::parameterized(
    start   = { "start",   StateTarget::Start },
    initial = { "initial", StateTarget::Initial },
    running = { "running", StateTarget::Running },
)]
fn state_target_keywords(input: &str, expected: StateTarget) {
    assert_eq!(StateTarget::parse(input), expected);
}

#[test]
fn state_target_explicit_place() {
    assert_eq!(StateTarget::parse("configured"), StateTarget::Place(PlaceName::new("configured")));
}

#[test]
fn port_constraint_display() {
    let permanent =
        PortConstraint::new("prov", "service", PortStatus::Disabled, None);
    assert_eq!(permanent.to_string(), "[PORT] service - disabled");
    assert!(!permanent.is_until());

    let until = PortConstraint::new(
        "prov",
        "service",
        PortStatus::Disabled,
        Some(BehaviorName::new("update")),
    );
    assert_eq!(until.to_string(), "[PORT] service - disabled (until prov.update)");
    assert!(until.is_until());
}

#[yare::parameterized(
    enabled  = { PortStatus::Enabled,  true },
    disabled = { PortStatus::Disabled, false },
)]
fn port_status_of(status: PortStatus, active: bool) {
    assert_eq!(PortStatus::of(active), status);
    assert_eq!(status.is_enabled(), active);
}

#[yare::parameterized(
    enabled  = { PortStatus::Enabled,  "enabled" },
    disabled = { PortStatus::Disabled, "disabled" },
)]
fn port_status_label(status: PortStatus, expected: &str) {
    assert_eq!(status.label(), expected);
    assert_eq!(status.to_string(), expected);
}

proptest! {
    #[test]
    fn goal_serde_roundtrip(goal in arb_goal()) {
        let json = serde_json::to_string(&goal).unwrap();
        let parsed: ReconfigurationGoal = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(goal, parsed);
    }
}
