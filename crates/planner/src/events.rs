// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port-transition events.
//!
//! Out-messages are derived exclusively from provide-port trajectories: a
//! use-port's requirements are guaranteed by its provider, so only the
//! provider broadcasts. Two patterns emit a constraint:
//!
//! - the port ends finally disabled → a permanent `disabled` constraint,
//! - the port is disabled mid-run and re-enabled → a `disabled` constraint
//!   bound until the behavior that caused the disable.

use ens_core::{ComponentId, PortName, PortStatus};
use ens_solver::{compress_trajectory, Solution, TrajectoryPoint};
use ens_wire::PortConstraintMessage;
use indexmap::{IndexMap, IndexSet};

/// Derive the constraints a solution obliges this instance to announce,
/// paired with the peers connected on each provide port.
pub(crate) fn derive_out_messages(
    component: &ComponentId,
    provide_peers: &IndexMap<PortName, Vec<ComponentId>>,
    solution: &Solution,
) -> Vec<(ComponentId, PortConstraintMessage)> {
    let mut out: IndexSet<(ComponentId, PortConstraintMessage)> = IndexSet::new();
    for (port, peers) in provide_peers {
        if peers.is_empty() {
            continue;
        }
        let Some(statuses) = solution.trajectories.get(port.as_str()) else {
            continue;
        };
        let points = compress_trajectory(statuses, &solution.word);
        for message in port_events(component, port, &points) {
            for peer in peers {
                out.insert((peer.clone(), message.clone()));
            }
        }
    }
    out.into_iter().collect()
}

fn port_events(
    component: &ComponentId,
    port: &PortName,
    points: &[TrajectoryPoint],
) -> Vec<PortConstraintMessage> {
    let mut messages = Vec::new();
    let n = points.len();
    if n < 2 {
        return messages;
    }
    // Finally disabled: the last change is enabled → disabled.
    if points[n - 2].status == PortStatus::Enabled && points[n - 1].status == PortStatus::Disabled {
        messages.push(PortConstraintMessage::new(
            component.clone(),
            port.clone(),
            PortStatus::Disabled,
            None,
        ));
    }
    // Disabled then re-enabled: bind the constraint to the disabling behavior.
    for window in points.windows(3) {
        if window[0].status == PortStatus::Enabled
            && window[1].status == PortStatus::Disabled
            && window[2].status == PortStatus::Enabled
        {
            if let Some(cause) = &window[1].cause {
                messages.push(PortConstraintMessage::new(
                    component.clone(),
                    port.clone(),
                    PortStatus::Disabled,
                    Some(cause.clone()),
                ));
            }
        }
    }
    messages
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
