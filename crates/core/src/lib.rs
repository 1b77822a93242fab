// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ens-core: Data model for the Ensemble reconfiguration planner.
//!
//! Component lifecycles (places, behaviors, ports), assemblies of connected
//! instances, reconfiguration goals, and the instruction/plan vocabulary
//! shared by the solver, the planner nodes, and the merger.

pub mod macros;

pub mod assembly;
pub mod diff;
pub mod goal;
pub mod lifecycle;
pub mod names;
pub mod plan;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use assembly::{Assembly, AssemblyError, AssemblySkeleton, ConnectionEnds};
pub use diff::{diff_assembly, AssemblyDiff};
pub use goal::{GoalError, PortConstraint, PortStatus, ReconfigurationGoal, StateTarget};
pub use lifecycle::{
    Behavior, ComponentType, ComponentTypeBuilder, ModelError, Port, PortDirection, Transition,
};
pub use names::{BehaviorName, ComponentId, PlaceName, PortName, TypeName};
pub use plan::{Instruction, Plan};

pub use assembly::ComponentInstance;
