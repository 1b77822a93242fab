// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-instance planner node.
//!
//! Owns the instance's constraint model, its round counter, and the ack
//! bookkeeping of the coordination protocol. The node's state is mutated
//! only from within [`PlannerNode::step`]; the messaging handle is its sole
//! channel to other nodes.

use crate::events::derive_out_messages;
use crate::PlanError;
use ens_core::{
    ComponentId, ComponentInstance, GoalError, Instruction, Plan, PlaceName, PortConstraint,
    PortName, ReconfigurationGoal,
};
use ens_messaging::Messaging;
use ens_solver::{ComponentModel, SolverInput};
use ens_wire::PortConstraintMessage;
use indexmap::{IndexMap, IndexSet};
use std::collections::{HashMap, HashSet};

/// What one protocol round did, for observability and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub round: u64,
    pub messages_sent: usize,
    pub inferred: bool,
}

/// Constraints received from one source, valid for one round stamp.
#[derive(Debug, Default)]
struct SourceConstraints {
    round: u64,
    constraints: Vec<PortConstraint>,
}

/// One planner-node actor.
pub struct PlannerNode {
    id: ComponentId,
    model: ComponentModel,
    /// Peers connected on each provide port.
    provide_peers: IndexMap<PortName, Vec<ComponentId>>,
    /// `(peer, peer port)` to the local port facing it.
    reverse_index: HashMap<(ComponentId, PortName), PortName>,
    round: u64,
    waiting_acks: IndexSet<ComponentId>,
    must_send_acks: IndexSet<ComponentId>,
    /// Latest-round constraints per source; newer rounds replace older ones.
    received: IndexMap<ComponentId, SourceConstraints>,
    /// Delta memo: everything ever sent, to emit only new messages.
    prev_sent: HashSet<(ComponentId, PortConstraintMessage)>,
    started: bool,
}

impl PlannerNode {
    /// Build a node from an instance's connection state and active place.
    pub fn new(
        instance: &ComponentInstance,
        active: &PlaceName,
        word_length: Option<usize>,
    ) -> Result<Self, GoalError> {
        let id = instance.id().clone();
        let model =
            ComponentModel::new(id.clone(), instance.component_type().clone(), active.clone(), word_length)?;

        let mut provide_peers: IndexMap<PortName, Vec<ComponentId>> = IndexMap::new();
        for port in instance.component_type().provide_ports() {
            let peers = instance.connections(port.name()).map(|(peer, _)| peer.clone()).collect();
            provide_peers.insert(port.name().clone(), peers);
        }
        let mut reverse_index = HashMap::new();
        for port in instance.component_type().ports() {
            for (peer, peer_port) in instance.connections(port.name()) {
                reverse_index.insert((peer.clone(), peer_port.clone()), port.name().clone());
            }
        }

        Ok(Self {
            id,
            model,
            provide_peers,
            reverse_index,
            round: 0,
            waiting_acks: IndexSet::new(),
            must_send_acks: IndexSet::new(),
            received: IndexMap::new(),
            prev_sent: HashSet::new(),
            started: false,
        })
    }

    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn add_goal(&mut self, goal: ReconfigurationGoal) -> Result<(), GoalError> {
        self.model.add_goal(goal)
    }

    pub fn has_goals(&self) -> bool {
        self.model.has_goals()
    }

    /// Peers we sent constraints to and still expect an ack from.
    pub fn waiting_acks(&self) -> &IndexSet<ComponentId> {
        &self.waiting_acks
    }

    /// Peers whose constraints we still owe an ack for.
    pub fn must_send_acks(&self) -> &IndexSet<ComponentId> {
        &self.must_send_acks
    }

    /// Whether this node has settled: nothing owed, nothing awaited.
    pub fn is_settled(&self) -> bool {
        self.waiting_acks.is_empty() && self.must_send_acks.is_empty()
    }

    /// Run one protocol round: drain, infer, emit deltas, keep the ack sets
    /// balanced, and broadcast the root-ack once settled.
    pub async fn step(&mut self, messaging: &dyn Messaging) -> Result<StepReport, PlanError> {
        let first = !self.started;
        self.started = true;

        for ack in messaging.get_acks(&self.id).await? {
            tracing::debug!(component = %self.id, from = %ack, "ack received");
            self.waiting_acks.shift_remove(&ack);
        }

        let inbox = messaging.get_messages(&self.id).await?;
        let mut messages_sent = 0;
        let mut inferred = false;

        if !inbox.is_empty() || (first && self.model.has_goals()) {
            self.round += 1;

            for received in inbox {
                self.accept(received);
            }

            // Local inference: observe the port trajectories this instance
            // would follow, and derive what its neighbors must be told.
            let constraints = self.received_constraints();
            let solution = self.model.solve_inference(&constraints)?;
            inferred = true;

            let out = derive_out_messages(&self.id, &self.provide_peers, &solution);
            let fresh: Vec<(ComponentId, PortConstraintMessage)> = out
                .into_iter()
                .filter(|message| !self.prev_sent.contains(message))
                .collect();

            if !fresh.is_empty() {
                messaging.send_messages(&self.id, self.round, fresh.clone()).await?;
                for message in fresh {
                    let target = message.0.clone();
                    self.prev_sent.insert(message);
                    // A message to a peer we owe an ack doubles as that ack.
                    if !self.must_send_acks.shift_remove(&target) {
                        self.waiting_acks.insert(target);
                    }
                    messages_sent += 1;
                }
            }
        }

        if messages_sent == 0 && !self.must_send_acks.is_empty() && self.waiting_acks.is_empty() {
            let targets: Vec<ComponentId> = self.must_send_acks.drain(..).collect();
            messaging.send_acks(&self.id, targets).await?;
        }

        if self.model.has_goals() && self.is_settled() {
            messaging.bcast_root_ack(&self.id).await?;
        }

        Ok(StepReport { round: self.round, messages_sent, inferred })
    }

    /// Produce the local plan. Call after global quiescence.
    pub fn final_plan(&self) -> Result<Plan, PlanError> {
        let constraints = self.received_constraints();
        let solution = self.model.solve_plan(&constraints)?;
        let instructions = solution
            .word
            .into_iter()
            .map(|input| match input {
                SolverInput::Behavior(behavior) => Instruction::PushB {
                    component: self.id.clone(),
                    behavior,
                },
                SolverInput::Wait(wait) => Instruction::Wait {
                    component: wait.peer,
                    behavior: wait.behavior,
                },
            })
            .collect();
        Ok(Plan::new(self.id.to_string(), instructions))
    }

    /// Record an inbound constraint, translating the peer's port name into
    /// ours and folding the message into the ack bookkeeping.
    fn accept(&mut self, received: ens_messaging::InboundConstraint) {
        let ens_messaging::InboundConstraint { source, round, message } = received;

        // Receipt from a peer we were awaiting counts as their ack.
        if !self.waiting_acks.shift_remove(&source) {
            self.must_send_acks.insert(source.clone());
        }

        let key = (message.source.clone(), message.port.clone());
        let Some(local_port) = self.reverse_index.get(&key) else {
            // Protocol violation: the peer references a connection we do not
            // know. Stale cross-node views must not halt planning.
            tracing::warn!(
                component = %self.id,
                source = %source,
                peer_port = %message.port,
                "ignoring constraint for unknown peer port"
            );
            return;
        };
        let constraint =
            PortConstraint::new(message.source, local_port.clone(), message.status, message.until);

        let entry = self.received.entry(source).or_default();
        match round.cmp(&entry.round) {
            std::cmp::Ordering::Greater => {
                entry.round = round;
                entry.constraints = vec![constraint];
            }
            std::cmp::Ordering::Equal => {
                if !entry.constraints.contains(&constraint) {
                    entry.constraints.push(constraint);
                }
            }
            // Older than what we already hold: stale, discard.
            std::cmp::Ordering::Less => {}
        }
    }

    fn received_constraints(&self) -> Vec<PortConstraint> {
        self.received.values().flat_map(|s| s.constraints.iter().cloned()).collect()
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
