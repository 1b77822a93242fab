// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures and proptest strategies for tests across the workspace.

#![allow(clippy::unwrap_used)]

use crate::assembly::Assembly;
use crate::lifecycle::ComponentType;
use std::sync::Arc;

/// A provider component: `service` is offered only at `on`, and `update`
/// passes through `off` before coming back up.
pub fn provider_type() -> Arc<ComponentType> {
    Arc::new(
        ComponentType::builder("provider")
            .places(["off", "on"])
            .initial("off")
            .running("on")
            .behavior("deploy", [("off", "on", 1)])
            .behavior("update", [("on", "off", 1), ("off", "on", 1)])
            .provide_port("service", ["on"])
            .build()
            .unwrap(),
    )
}

/// A user component consuming `service` while at `running`.
pub fn user_type() -> Arc<ComponentType> {
    Arc::new(
        ComponentType::builder("user")
            .places(["idle", "running"])
            .initial("idle")
            .running("running")
            .behavior("start", [("idle", "running", 1)])
            .behavior("stop", [("running", "idle", 1)])
            .use_port("service", ["running"])
            .build()
            .unwrap(),
    )
}

/// The two-instance assembly used by the provider/user scenarios:
/// `prov.service ↔ user.service`, both at their initial places.
pub fn provider_user_assembly() -> Assembly {
    let mut assembly = Assembly::new();
    assembly.add_instance("prov", provider_type()).unwrap();
    assembly.add_instance("user", user_type()).unwrap();
    assembly.connect("prov", "service", "user", "service").unwrap();
    assembly
}

pub mod strategies {
    use crate::goal::{PortStatus, ReconfigurationGoal};
    use crate::plan::Instruction;
    use proptest::prelude::*;

    pub fn arb_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,8}"
    }

    pub fn arb_port_status() -> impl Strategy<Value = PortStatus> {
        prop_oneof![Just(PortStatus::Enabled), Just(PortStatus::Disabled)]
    }

    pub fn arb_goal() -> impl Strategy<Value = ReconfigurationGoal> {
        prop_oneof![
            (arb_name(), any::<bool>())
                .prop_map(|(b, f)| ReconfigurationGoal::behavior(b, f)),
            (arb_name(), any::<bool>()).prop_map(|(p, f)| ReconfigurationGoal::state(p, f)),
            (arb_name(), arb_port_status(), any::<bool>())
                .prop_map(|(p, s, f)| ReconfigurationGoal::port(p, s, f)),
        ]
    }

    pub fn arb_instruction() -> impl Strategy<Value = Instruction> {
        prop_oneof![
            (arb_name(), arb_name()).prop_map(|(c, t)| Instruction::add(c, t)),
            arb_name().prop_map(Instruction::del),
            (arb_name(), arb_name(), arb_name(), arb_name())
                .prop_map(|(p, pp, u, up)| Instruction::connect(p, pp, u, up)),
            (arb_name(), arb_name(), arb_name(), arb_name())
                .prop_map(|(p, pp, u, up)| Instruction::disconnect(p, pp, u, up)),
            (arb_name(), arb_name()).prop_map(|(c, b)| Instruction::push_b(c, b)),
            (arb_name(), arb_name()).prop_map(|(c, b)| Instruction::wait(c, b)),
        ]
    }
}
