// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconfiguration goals and cross-node port constraints.

use crate::names::{BehaviorName, ComponentId, PlaceName, PortName};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a goal does not fit the instance it targets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GoalError {
    #[error("{component}: goal names unknown behavior {behavior}")]
    UnknownBehavior { component: ComponentId, behavior: BehaviorName },
    #[error("{component}: goal names unknown place {place}")]
    UnknownPlace { component: ComponentId, place: PlaceName },
    #[error("{component}: goal names unknown port {port}")]
    UnknownPort { component: ComponentId, port: PortName },
    #[error("{component}: type has no running place")]
    NoRunningPlace { component: ComponentId },
    #[error("unknown instance {component}")]
    UnknownInstance { component: ComponentId },
}

/// Status of a port at one point of a lifecycle trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortStatus {
    Enabled,
    Disabled,
}

crate::display_label! {
    PortStatus {
        Enabled => "enabled",
        Disabled => "disabled",
    }
}

impl PortStatus {
    /// Status induced by a place: enabled iff the place is in the binding.
    pub fn of(active: bool) -> Self {
        if active {
            PortStatus::Enabled
        } else {
            PortStatus::Disabled
        }
    }

    pub fn is_enabled(self) -> bool {
        self == PortStatus::Enabled
    }
}

/// A declarative target the planner must satisfy for one instance.
///
/// `final_` marks goals that must hold at the end of the sequence rather than
/// at some point along it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconfigurationGoal {
    /// The behavior must appear in the sequence; if final, it is the last
    /// non-skip input.
    Behavior {
        behavior: BehaviorName,
        #[serde(rename = "final")]
        final_: bool,
    },
    /// The place must be visited; if final, it is the terminal state.
    State {
        place: PlaceName,
        #[serde(rename = "final")]
        final_: bool,
    },
    /// The port must assume the status at some point; if final, at the end.
    Port {
        port: PortName,
        status: PortStatus,
        #[serde(rename = "final")]
        final_: bool,
    },
}

impl ReconfigurationGoal {
    pub fn behavior(behavior: impl Into<BehaviorName>, final_: bool) -> Self {
        Self::Behavior { behavior: behavior.into(), final_ }
    }

    pub fn state(place: impl Into<PlaceName>, final_: bool) -> Self {
        Self::State { place: place.into(), final_ }
    }

    pub fn port(port: impl Into<PortName>, status: PortStatus, final_: bool) -> Self {
        Self::Port { port: port.into(), status, final_ }
    }

    pub fn is_final(&self) -> bool {
        match self {
            Self::Behavior { final_, .. } | Self::State { final_, .. } | Self::Port { final_, .. } => {
                *final_
            }
        }
    }
}

impl std::fmt::Display for ReconfigurationGoal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let suffix = if self.is_final() { " (final)" } else { "" };
        match self {
            Self::Behavior { behavior, .. } => write!(f, "[BEHAVIOR] {behavior}{suffix}"),
            Self::State { place, .. } => write!(f, "[STATE] {place}{suffix}"),
            Self::Port { port, status, .. } => write!(f, "[PORT] {port} - {status}{suffix}"),
        }
    }
}

/// Boundary-level state target: "start", "initial", "running", or an
/// explicit place name. Promoted to a final [`ReconfigurationGoal::State`]
/// against a concrete instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateTarget {
    /// The instance's current active place (stay where you are).
    Start,
    /// The type's initial place.
    Initial,
    /// The type's running place.
    Running,
    /// An explicit place of the type.
    Place(PlaceName),
}

impl StateTarget {
    pub fn parse(s: &str) -> Self {
        match s {
            "start" => Self::Start,
            "initial" => Self::Initial,
            "running" => Self::Running,
            other => Self::Place(PlaceName::new(other)),
        }
    }
}

/// A constraint received from a neighbor: "your port `port` (facing me) must
/// hold `status`", optionally only until my behavior `until` has executed.
///
/// `port` is already translated to the *local* port name of the instance the
/// constraint applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortConstraint {
    /// The neighbor that emitted the constraint.
    pub source: ComponentId,
    /// Local port the constraint applies to.
    pub port: PortName,
    pub status: PortStatus,
    /// When set, the constraint binds only until `source` has executed this
    /// behavior; the solver inserts a synchronisation wait for it.
    pub until: Option<BehaviorName>,
}

impl PortConstraint {
    pub fn new(
        source: impl Into<ComponentId>,
        port: impl Into<PortName>,
        status: PortStatus,
        until: Option<BehaviorName>,
    ) -> Self {
        Self { source: source.into(), port: port.into(), status, until }
    }

    /// Whether the constraint carries a synchronisation point.
    pub fn is_until(&self) -> bool {
        self.until.is_some()
    }
}

impl std::fmt::Display for PortConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[PORT] {} - {}", self.port, self.status)?;
        if let Some(behavior) = &self.until {
            write!(f, " (until {}.{})", self.source, behavior)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "goal_tests.rs"]
mod tests;
