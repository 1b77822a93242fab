// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn push(c: &str, b: &str) -> Instruction {
    Instruction::push_b(c, b)
}

fn wait(c: &str, b: &str) -> Instruction {
    Instruction::wait(c, b)
}

fn index_of(merged: &Plan, instruction: &Instruction) -> usize {
    merged
        .instructions()
        .iter()
        .position(|i| i == instruction)
        .unwrap_or_else(|| panic!("{instruction} missing from merged plan"))
}

#[test]
fn merge_respects_intra_plan_and_sync_order() {
    let plans = [
        Plan::new(
            "comp1",
            vec![
                push("comp1", "i1"),
                push("comp1", "i2"),
                push("comp1", "i3"),
                wait("comp2", "j2"),
                wait("comp2", "j3"),
                push("comp1", "i4"),
            ],
        ),
        Plan::new(
            "comp2",
            vec![push("comp2", "j1"), push("comp2", "j2"), push("comp2", "j3"), wait("comp1", "i4")],
        ),
        Plan::new(
            "comp3",
            vec![
                push("comp3", "k1"),
                push("comp3", "k2"),
                wait("comp1", "i2"),
                wait("comp2", "j2"),
                push("comp3", "k3"),
            ],
        ),
    ];

    let merged = merge_plans(&plans).unwrap();

    // Every plan's internal order is preserved.
    for plan in &plans {
        for pair in plan.instructions().windows(2) {
            assert!(
                index_of(&merged, &pair[0]) < index_of(&merged, &pair[1]),
                "{} must precede {}",
                pair[0],
                pair[1],
            );
        }
    }
    // Every wait follows its matching pushB.
    for plan in &plans {
        for instruction in plan.instructions() {
            if let Instruction::Wait { component, behavior } = instruction {
                let matching = Instruction::PushB {
                    component: component.clone(),
                    behavior: behavior.clone(),
                };
                assert!(index_of(&merged, &matching) < index_of(&merged, instruction));
            }
        }
    }
}

#[test]
fn merge_emits_unique_vertices() {
    let plans = [
        Plan::new("a", vec![push("a", "go"), wait("b", "go")]),
        Plan::new("b", vec![push("b", "go"), wait("a", "go")]),
    ];

    let merged = merge_plans(&plans).unwrap();
    assert_eq!(merged.len(), 4);

    let mut seen = std::collections::HashSet::new();
    for instruction in merged.instructions() {
        assert!(seen.insert(instruction.clone()), "duplicate {instruction}");
    }
}

#[test]
fn duplicate_instructions_collapse() {
    let plans = [Plan::new("prov", vec![push("prov", "update"), push("prov", "update")])];

    let merged = merge_plans(&plans).unwrap();
    assert_eq!(merged.instructions(), [push("prov", "update")]);
}

#[test]
fn plan_starting_with_wait_is_pulled_in_by_its_push() {
    let plans = [
        Plan::new("a", vec![push("a", "deploy")]),
        Plan::new("b", vec![wait("a", "deploy"), push("b", "start")]),
    ];

    let merged = merge_plans(&plans).unwrap();
    assert_eq!(
        merged.instructions(),
        [push("a", "deploy"), wait("a", "deploy"), push("b", "start")],
    );
}

#[test]
fn crossed_waits_are_a_cycle() {
    let plans = [
        Plan::new("a", vec![wait("b", "y"), push("a", "x")]),
        Plan::new("b", vec![wait("a", "x"), push("b", "y")]),
    ];

    let err = merge_plans(&plans).unwrap_err();
    match err {
        MergeError::Cycle { involved } => assert_eq!(involved.len(), 4),
    }
}

#[test]
fn empty_plans_merge_to_empty() {
    let plans = [Plan::empty("a"), Plan::empty("b")];
    let merged = merge_plans(&plans).unwrap();
    assert!(merged.is_empty());
    assert_eq!(merged.name(), "merged");
}

#[test]
fn single_plan_is_preserved() {
    let plan = Plan::new("p", vec![push("p", "a"), push("p", "b"), push("p", "c")]);
    let merged = merge_plans([&plan]).unwrap();
    assert_eq!(merged.instructions(), plan.instructions());
}

#[test]
fn wait_without_matching_push_is_still_ordered() {
    // A wait for a behavior no local plan pushes (its pushB lives on another
    // node) must not break the merge.
    let plans = [Plan::new("a", vec![push("a", "deploy"), wait("remote", "boot")])];
    let merged = merge_plans(&plans).unwrap();
    assert_eq!(merged.len(), 2);
}
