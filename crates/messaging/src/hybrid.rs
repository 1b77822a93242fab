// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hybrid messaging: local mailbox for co-located instances, remote
//! transport for everyone else.

use crate::{InboundConstraint, Messaging, MessagingError};
use async_trait::async_trait;
use ens_core::ComponentId;
use ens_wire::PortConstraintMessage;
use std::collections::HashSet;
use std::sync::Arc;

/// Partitions recipients by locality between an inner local and remote
/// implementation. Reads merge both sides.
pub struct HybridMessaging {
    local: Arc<dyn Messaging>,
    remote: Arc<dyn Messaging>,
    local_components: HashSet<ComponentId>,
}

impl HybridMessaging {
    pub fn new<I, C>(local: Arc<dyn Messaging>, remote: Arc<dyn Messaging>, local_components: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ComponentId>,
    {
        Self {
            local,
            remote,
            local_components: local_components.into_iter().map(Into::into).collect(),
        }
    }

    fn is_local(&self, component: &ComponentId) -> bool {
        self.local_components.contains(component)
    }
}

#[async_trait]
impl Messaging for HybridMessaging {
    async fn get_messages(
        &self,
        component: &ComponentId,
    ) -> Result<Vec<InboundConstraint>, MessagingError> {
        let mut messages = self.local.get_messages(component).await?;
        messages.extend(self.remote.get_messages(component).await?);
        Ok(messages)
    }

    async fn send_messages(
        &self,
        source: &ComponentId,
        round: u64,
        messages: Vec<(ComponentId, PortConstraintMessage)>,
    ) -> Result<(), MessagingError> {
        let (local, remote): (Vec<_>, Vec<_>) =
            messages.into_iter().partition(|(target, _)| self.is_local(target));
        if !local.is_empty() {
            self.local.send_messages(source, round, local).await?;
        }
        if !remote.is_empty() {
            self.remote.send_messages(source, round, remote).await?;
        }
        Ok(())
    }

    async fn get_acks(&self, component: &ComponentId) -> Result<Vec<ComponentId>, MessagingError> {
        let mut acks = self.local.get_acks(component).await?;
        acks.extend(self.remote.get_acks(component).await?);
        Ok(acks)
    }

    async fn send_acks(
        &self,
        source: &ComponentId,
        targets: Vec<ComponentId>,
    ) -> Result<(), MessagingError> {
        let (local, remote): (Vec<_>, Vec<_>) =
            targets.into_iter().partition(|target| self.is_local(target));
        if !local.is_empty() {
            self.local.send_acks(source, local).await?;
        }
        if !remote.is_empty() {
            self.remote.send_acks(source, remote).await?;
        }
        Ok(())
    }

    async fn bcast_root_ack(&self, source: &ComponentId) -> Result<(), MessagingError> {
        self.local.bcast_root_ack(source).await?;
        self.remote.bcast_root_ack(source).await?;
        Ok(())
    }

    async fn global_acks(&self) -> Result<HashSet<ComponentId>, MessagingError> {
        let mut acks = self.local.global_acks().await?;
        acks.extend(self.remote.global_acks().await?);
        Ok(acks)
    }
}

#[cfg(test)]
#[path = "hybrid_tests.rs"]
mod tests;
