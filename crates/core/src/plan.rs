// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plans: totally-ordered sequences of reconfiguration instructions.

use crate::names::{BehaviorName, ComponentId, PortName, TypeName};
use serde::{Deserialize, Serialize};

/// One reconfiguration instruction.
///
/// Equality and hashing are structural so that identical instructions from
/// different plans collapse to one vertex in the merger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    /// Create an instance of a type.
    Add { component: ComponentId, component_type: TypeName },
    /// Remove an instance.
    Del { component: ComponentId },
    /// Connect a provider's provide-port to a user's use-port.
    Connect {
        provider: ComponentId,
        provide_port: PortName,
        user: ComponentId,
        use_port: PortName,
    },
    /// Remove a connection.
    Disconnect {
        provider: ComponentId,
        provide_port: PortName,
        user: ComponentId,
        use_port: PortName,
    },
    /// Execute a behavior on a local instance.
    PushB { component: ComponentId, behavior: BehaviorName },
    /// Block until the named instance has executed the named behavior.
    Wait { component: ComponentId, behavior: BehaviorName },
}

impl Instruction {
    pub fn add(component: impl Into<ComponentId>, component_type: impl Into<TypeName>) -> Self {
        Self::Add { component: component.into(), component_type: component_type.into() }
    }

    pub fn del(component: impl Into<ComponentId>) -> Self {
        Self::Del { component: component.into() }
    }

    pub fn connect(
        provider: impl Into<ComponentId>,
        provide_port: impl Into<PortName>,
        user: impl Into<ComponentId>,
        use_port: impl Into<PortName>,
    ) -> Self {
        Self::Connect {
            provider: provider.into(),
            provide_port: provide_port.into(),
            user: user.into(),
            use_port: use_port.into(),
        }
    }

    pub fn disconnect(
        provider: impl Into<ComponentId>,
        provide_port: impl Into<PortName>,
        user: impl Into<ComponentId>,
        use_port: impl Into<PortName>,
    ) -> Self {
        Self::Disconnect {
            provider: provider.into(),
            provide_port: provide_port.into(),
            user: user.into(),
            use_port: use_port.into(),
        }
    }

    pub fn push_b(component: impl Into<ComponentId>, behavior: impl Into<BehaviorName>) -> Self {
        Self::PushB { component: component.into(), behavior: behavior.into() }
    }

    pub fn wait(component: impl Into<ComponentId>, behavior: impl Into<BehaviorName>) -> Self {
        Self::Wait { component: component.into(), behavior: behavior.into() }
    }

    pub fn is_wait(&self) -> bool {
        matches!(self, Self::Wait { .. })
    }

    pub fn is_push_b(&self) -> bool {
        matches!(self, Self::PushB { .. })
    }

    /// Whether this is a structural (diff) instruction rather than a
    /// behavioral one.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::PushB { .. } | Self::Wait { .. })
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add { component, component_type } => write!(f, "add({component}, {component_type})"),
            Self::Del { component } => write!(f, "del({component})"),
            Self::Connect { provider, provide_port, user, use_port } => {
                write!(f, "con({provider}, {provide_port}, {user}, {use_port})")
            }
            Self::Disconnect { provider, provide_port, user, use_port } => {
                write!(f, "discon({provider}, {provide_port}, {user}, {use_port})")
            }
            Self::PushB { component, behavior } => write!(f, "pushB({component}, {behavior})"),
            Self::Wait { component, behavior } => write!(f, "wait({component}, {behavior})"),
        }
    }
}

/// A named, ordered instruction sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    name: String,
    instructions: Vec<Instruction>,
}

impl Plan {
    pub fn new(name: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        Self { name: name.into(), instructions }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instructions that execute behaviors (everything but the structural
    /// add/del/connect/disconnect buckets).
    pub fn behavioral_instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter().filter(|i| !i.is_structural())
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "==============")?;
        writeln!(f, "{}", self.name)?;
        writeln!(f, "==============")?;
        for instruction in &self.instructions {
            writeln!(f, "{instruction}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
