// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ens-messaging: the planner's inter-node messaging contract and its
//! bundled implementations.
//!
//! Planner nodes exchange round-stamped port constraints and acks through a
//! [`Messaging`] handle; it is their sole channel of communication. Three
//! implementations are provided: an in-process [`MailboxMessaging`] for
//! co-located instances, a TCP [`RemoteMessaging`] for instances on other
//! nodes, and a [`HybridMessaging`] composing both by partitioning
//! recipients by locality.

mod hybrid;
mod mailbox;
mod registry;
mod remote;

use async_trait::async_trait;
use ens_core::ComponentId;
use ens_wire::PortConstraintMessage;
use std::collections::HashSet;
use thiserror::Error;

pub use hybrid::HybridMessaging;
pub use mailbox::MailboxMessaging;
pub use registry::GlobalAckRegistry;
pub use remote::{Inventory, RemoteMessaging, RetryPolicy};

/// Transport-level failures. Retries are the transport's responsibility;
/// a surfaced error means retries were exhausted.
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("no route to {target}")]
    UnknownTarget { target: ComponentId },
    #[error("transport failure after {attempts} attempts: {reason}")]
    Transport { attempts: u32, reason: String },
    #[error(transparent)]
    Protocol(#[from] ens_wire::ProtocolError),
}

/// A received constraint with its provenance and round stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundConstraint {
    pub source: ComponentId,
    pub round: u64,
    pub message: PortConstraintMessage,
}

/// The messaging contract consumed by planner nodes.
///
/// Drains are atomic and non-blocking; sends are best-effort and preserve
/// per-(source, target) order by round; the global-ack registry is a
/// monotonic set.
#[async_trait]
pub trait Messaging: Send + Sync {
    /// Drain the constraint inbox of `component`.
    async fn get_messages(
        &self,
        component: &ComponentId,
    ) -> Result<Vec<InboundConstraint>, MessagingError>;

    /// Send round-stamped constraints to their targets.
    async fn send_messages(
        &self,
        source: &ComponentId,
        round: u64,
        messages: Vec<(ComponentId, PortConstraintMessage)>,
    ) -> Result<(), MessagingError>;

    /// Drain the ack inbox of `component`.
    async fn get_acks(&self, component: &ComponentId) -> Result<Vec<ComponentId>, MessagingError>;

    /// Acknowledge the given peers' constraints.
    async fn send_acks(
        &self,
        source: &ComponentId,
        targets: Vec<ComponentId>,
    ) -> Result<(), MessagingError>;

    /// Broadcast that `source`'s goals are globally settled.
    async fn bcast_root_ack(&self, source: &ComponentId) -> Result<(), MessagingError>;

    /// Monotonic snapshot of the root-ack broadcasters.
    async fn global_acks(&self) -> Result<HashSet<ComponentId>, MessagingError>;
}
