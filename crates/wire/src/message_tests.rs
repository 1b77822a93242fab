// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ens_core::test_support::strategies::arb_port_status;
use ens_core::{BehaviorName, PortStatus};
use proptest::prelude::*;

#[test]
fn constraint_message_display() {
    let permanent = PortConstraintMessage::new("prov", "service", PortStatus::Disabled, None);
    assert_eq!(permanent.to_string(), "the port prov.service will be disabled");

    let until = PortConstraintMessage::new(
        "prov",
        "service",
        PortStatus::Disabled,
        Some(BehaviorName::new("update")),
    );
    assert_eq!(until.to_string(), "the port prov.service will be disabled until update");
}

#[test]
fn constraint_message_until_is_omitted_from_json_when_absent() {
    let permanent = PortConstraintMessage::new("prov", "service", PortStatus::Disabled, None);
    let json = serde_json::to_string(&permanent).unwrap();
    assert!(!json.contains("until"));
}

#[test]
fn frame_json_is_tagged() {
    let frame = PlannerFrame::RootAck { source: "prov".into() };
    let json = serde_json::to_string(&frame).unwrap();
    assert!(json.contains("\"type\":\"root_ack\""));
}

#[yare::parameterized(
    permanent = { None },
    until     = { Some(BehaviorName::new("update")) },
)]
fn constraint_frame_roundtrip(until: Option<BehaviorName>) {
    let frame = PlannerFrame::Constraint {
        target: "user".into(),
        round: 7,
        message: PortConstraintMessage::new("prov", "service", PortStatus::Disabled, until),
    };
    let json = serde_json::to_string(&frame).unwrap();
    let parsed: PlannerFrame = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, frame);
}

proptest! {
    #[test]
    fn message_serde_roundtrip(
        source in "[a-z]{1,8}",
        port in "[a-z]{1,8}",
        status in arb_port_status(),
        until in proptest::option::of("[a-z]{1,8}"),
    ) {
        let message = PortConstraintMessage::new(
            source,
            port,
            status,
            until.map(BehaviorName::new),
        );
        let json = serde_json::to_string(&message).unwrap();
        let parsed: PortConstraintMessage = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(message, parsed);
    }
}
