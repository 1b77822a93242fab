// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Planner message DTOs.

use ens_core::{BehaviorName, ComponentId, PortName, PortStatus};
use serde::{Deserialize, Serialize};

/// A port constraint as it travels between nodes.
///
/// `port` names the *sender's* port; the receiver translates it to its own
/// port through its reverse connection index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortConstraintMessage {
    pub source: ComponentId,
    pub port: PortName,
    pub status: PortStatus,
    /// When set, the constraint holds only until `source` has executed this
    /// behavior.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<BehaviorName>,
}

impl PortConstraintMessage {
    pub fn new(
        source: impl Into<ComponentId>,
        port: impl Into<PortName>,
        status: PortStatus,
        until: Option<BehaviorName>,
    ) -> Self {
        Self { source: source.into(), port: port.into(), status, until }
    }
}

impl std::fmt::Display for PortConstraintMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "the port {}.{} will be {}", self.source, self.port, self.status)?;
        if let Some(behavior) = &self.until {
            write!(f, " until {behavior}")?;
        }
        Ok(())
    }
}

/// One frame of the planner transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlannerFrame {
    /// A round-stamped constraint for `target`.
    Constraint {
        target: ComponentId,
        round: u64,
        message: PortConstraintMessage,
    },
    /// `source` acknowledges `target`'s constraints.
    Ack {
        source: ComponentId,
        target: ComponentId,
    },
    /// `source` broadcasts that its goals are globally settled.
    RootAck { source: ComponentId },
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
