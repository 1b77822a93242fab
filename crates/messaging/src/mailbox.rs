// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process mailbox messaging for co-located instances.

use crate::registry::GlobalAckRegistry;
use crate::{InboundConstraint, Messaging, MessagingError};
use async_trait::async_trait;
use ens_core::ComponentId;
use ens_wire::PortConstraintMessage;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
struct Inbox {
    messages: Vec<InboundConstraint>,
    acks: Vec<ComponentId>,
}

/// Mailbox messaging: one locked inbox per co-located instance, plus a
/// shared global-ack registry.
#[derive(Debug)]
pub struct MailboxMessaging {
    inboxes: Mutex<HashMap<ComponentId, Inbox>>,
    registry: GlobalAckRegistry,
}

impl MailboxMessaging {
    pub fn new<I, C>(components: I, registry: GlobalAckRegistry) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ComponentId>,
    {
        let inboxes = components
            .into_iter()
            .map(|c| (c.into(), Inbox::default()))
            .collect();
        Self { inboxes: Mutex::new(inboxes), registry }
    }

    pub fn registry(&self) -> &GlobalAckRegistry {
        &self.registry
    }
}

#[async_trait]
impl Messaging for MailboxMessaging {
    async fn get_messages(
        &self,
        component: &ComponentId,
    ) -> Result<Vec<InboundConstraint>, MessagingError> {
        let mut inboxes = self.inboxes.lock();
        let inbox = inboxes
            .get_mut(component)
            .ok_or_else(|| MessagingError::UnknownTarget { target: component.clone() })?;
        let messages = std::mem::take(&mut inbox.messages);
        for received in &messages {
            tracing::debug!(
                component = %component,
                source = %received.source,
                round = received.round,
                constraint = %received.message,
                "received constraint"
            );
        }
        Ok(messages)
    }

    async fn send_messages(
        &self,
        source: &ComponentId,
        round: u64,
        messages: Vec<(ComponentId, PortConstraintMessage)>,
    ) -> Result<(), MessagingError> {
        let mut inboxes = self.inboxes.lock();
        for (target, message) in messages {
            tracing::debug!(
                source = %source,
                target = %target,
                round,
                constraint = %message,
                "sending constraint"
            );
            let inbox = inboxes
                .get_mut(&target)
                .ok_or_else(|| MessagingError::UnknownTarget { target: target.clone() })?;
            inbox.messages.push(InboundConstraint { source: source.clone(), round, message });
        }
        Ok(())
    }

    async fn get_acks(&self, component: &ComponentId) -> Result<Vec<ComponentId>, MessagingError> {
        let mut inboxes = self.inboxes.lock();
        let inbox = inboxes
            .get_mut(component)
            .ok_or_else(|| MessagingError::UnknownTarget { target: component.clone() })?;
        Ok(std::mem::take(&mut inbox.acks))
    }

    async fn send_acks(
        &self,
        source: &ComponentId,
        targets: Vec<ComponentId>,
    ) -> Result<(), MessagingError> {
        let mut inboxes = self.inboxes.lock();
        for target in targets {
            tracing::debug!(source = %source, target = %target, "sending ack");
            let inbox = inboxes
                .get_mut(&target)
                .ok_or_else(|| MessagingError::UnknownTarget { target: target.clone() })?;
            inbox.acks.push(source.clone());
        }
        Ok(())
    }

    async fn bcast_root_ack(&self, source: &ComponentId) -> Result<(), MessagingError> {
        tracing::debug!(source = %source, "broadcasting root ack");
        self.registry.broadcast(source);
        Ok(())
    }

    async fn global_acks(&self) -> Result<HashSet<ComponentId>, MessagingError> {
        Ok(self.registry.snapshot())
    }
}

#[cfg(test)]
#[path = "mailbox_tests.rs"]
mod tests;
