// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP transport between planner nodes.
//!
//! Each node binds one listener and keeps inboxes for its local instances;
//! peers address those instances through the inventory. Sends open a
//! connection per frame and retry with exponential backoff; a surfaced error
//! means retries were exhausted.

use crate::registry::GlobalAckRegistry;
use crate::{InboundConstraint, Messaging, MessagingError};
use async_trait::async_trait;
use ens_core::ComponentId;
use ens_wire::{read_frame, write_frame, PlannerFrame, PortConstraintMessage};
use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

/// Maps each remote instance to the socket address of its hosting node.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    addresses: IndexMap<ComponentId, SocketAddr>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, component: impl Into<ComponentId>, addr: SocketAddr) {
        self.addresses.insert(component.into(), addr);
    }

    pub fn address(&self, component: &ComponentId) -> Option<SocketAddr> {
        self.addresses.get(component).copied()
    }

    pub fn contains(&self, component: &ComponentId) -> bool {
        self.addresses.contains_key(component)
    }

    /// Distinct node addresses, for broadcasts.
    pub fn node_addresses(&self) -> IndexSet<SocketAddr> {
        self.addresses.values().copied().collect()
    }
}

/// Backoff schedule for sends.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: 4, base_delay: Duration::from_millis(50) }
    }
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

#[derive(Debug, Default)]
struct Inbox {
    messages: Vec<InboundConstraint>,
    acks: Vec<ComponentId>,
}

type Inboxes = Arc<Mutex<HashMap<ComponentId, Inbox>>>;

/// Remote messaging endpoint of one node.
#[derive(Debug)]
pub struct RemoteMessaging {
    local_addr: SocketAddr,
    inboxes: Inboxes,
    registry: GlobalAckRegistry,
    /// Routes can be learned after binding (nodes come up in any order).
    inventory: Mutex<Inventory>,
    retry: RetryPolicy,
    shutdown: CancellationToken,
}

impl RemoteMessaging {
    /// Bind the node's listener and start accepting peer connections.
    pub async fn bind<I, C>(
        bind_addr: SocketAddr,
        local_components: I,
        inventory: Inventory,
        registry: GlobalAckRegistry,
        retry: RetryPolicy,
    ) -> Result<Self, MessagingError>
    where
        I: IntoIterator<Item = C>,
        C: Into<ComponentId>,
    {
        let listener = TcpListener::bind(bind_addr).await.map_err(|e| {
            MessagingError::Transport { attempts: 1, reason: format!("bind {bind_addr}: {e}") }
        })?;
        let local_addr = listener.local_addr().map_err(|e| MessagingError::Transport {
            attempts: 1,
            reason: format!("local addr: {e}"),
        })?;

        let inboxes: Inboxes = Arc::new(Mutex::new(
            local_components.into_iter().map(|c| (c.into(), Inbox::default())).collect(),
        ));
        let shutdown = CancellationToken::new();

        let accept_inboxes = Arc::clone(&inboxes);
        let accept_registry = registry.clone();
        let accept_shutdown = shutdown.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = accept_shutdown.cancelled() => break,
                    accepted = listener.accept() => match accepted {
                        Ok((stream, peer)) => {
                            tracing::debug!(%peer, "accepted planner connection");
                            let inboxes = Arc::clone(&accept_inboxes);
                            let registry = accept_registry.clone();
                            tokio::spawn(handle_connection(stream, inboxes, registry));
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "accept failed");
                        }
                    },
                }
            }
        });

        Ok(Self { local_addr, inboxes, registry, inventory: Mutex::new(inventory), retry, shutdown })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn registry(&self) -> &GlobalAckRegistry {
        &self.registry
    }

    /// Add or replace the route to a remote instance.
    pub fn add_route(&self, component: impl Into<ComponentId>, addr: SocketAddr) {
        self.inventory.lock().insert(component, addr);
    }

    /// Stop accepting connections.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    async fn deliver(&self, addr: SocketAddr, frame: &PlannerFrame) -> Result<(), MessagingError> {
        let mut last_error = String::new();
        for attempt in 1..=self.retry.attempts {
            match self.try_deliver(addr, frame).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::debug!(%addr, attempt, error = %e, "delivery failed, backing off");
                    last_error = e.to_string();
                }
            }
            if attempt < self.retry.attempts {
                tokio::time::sleep(self.retry.delay(attempt)).await;
            }
        }
        Err(MessagingError::Transport {
            attempts: self.retry.attempts,
            reason: format!("{addr}: {last_error}"),
        })
    }

    async fn try_deliver(
        &self,
        addr: SocketAddr,
        frame: &PlannerFrame,
    ) -> Result<(), MessagingError> {
        let mut stream = TcpStream::connect(addr).await.map_err(|e| {
            MessagingError::Transport { attempts: 1, reason: e.to_string() }
        })?;
        write_frame(&mut stream, frame).await?;
        Ok(())
    }

    fn route(&self, target: &ComponentId) -> Result<SocketAddr, MessagingError> {
        self.inventory
            .lock()
            .address(target)
            .ok_or_else(|| MessagingError::UnknownTarget { target: target.clone() })
    }
}

impl Drop for RemoteMessaging {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_connection(mut stream: TcpStream, inboxes: Inboxes, registry: GlobalAckRegistry) {
    loop {
        match read_frame::<_, PlannerFrame>(&mut stream).await {
            Ok(frame) => dispatch(frame, &inboxes, &registry),
            // EOF or a malformed frame ends the connection.
            Err(e) => {
                tracing::debug!(error = %e, "planner connection closed");
                break;
            }
        }
    }
}

fn dispatch(frame: PlannerFrame, inboxes: &Inboxes, registry: &GlobalAckRegistry) {
    match frame {
        PlannerFrame::Constraint { target, round, message } => {
            let mut inboxes = inboxes.lock();
            match inboxes.get_mut(&target) {
                Some(inbox) => {
                    let source = message.source.clone();
                    inbox.messages.push(InboundConstraint { source, round, message });
                }
                None => {
                    tracing::warn!(%target, "constraint for unknown local instance dropped");
                }
            }
        }
        PlannerFrame::Ack { source, target } => {
            let mut inboxes = inboxes.lock();
            match inboxes.get_mut(&target) {
                Some(inbox) => inbox.acks.push(source),
                None => {
                    tracing::warn!(%target, "ack for unknown local instance dropped");
                }
            }
        }
        PlannerFrame::RootAck { source } => {
            registry.broadcast(&source);
        }
    }
}

#[async_trait]
impl Messaging for RemoteMessaging {
    async fn get_messages(
        &self,
        component: &ComponentId,
    ) -> Result<Vec<InboundConstraint>, MessagingError> {
        let mut inboxes = self.inboxes.lock();
        let inbox = inboxes
            .get_mut(component)
            .ok_or_else(|| MessagingError::UnknownTarget { target: component.clone() })?;
        Ok(std::mem::take(&mut inbox.messages))
    }

    async fn send_messages(
        &self,
        source: &ComponentId,
        round: u64,
        messages: Vec<(ComponentId, PortConstraintMessage)>,
    ) -> Result<(), MessagingError> {
        for (target, message) in messages {
            let addr = self.route(&target)?;
            tracing::debug!(
                source = %source,
                target = %target,
                %addr,
                round,
                constraint = %message,
                "sending remote constraint"
            );
            let frame = PlannerFrame::Constraint { target, round, message };
            self.deliver(addr, &frame).await?;
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
        for target in targets {
            let addr = self.route(&target)?;
            let frame = PlannerFrame::Ack { source: source.clone(), target };
            self.deliver(addr, &frame).await?;
        }
        Ok(())
    }

    async fn bcast_root_ack(&self, source: &ComponentId) -> Result<(), MessagingError> {
        self.registry.broadcast(source);
        let frame = PlannerFrame::RootAck { source: source.clone() };
        let addresses = self.inventory.lock().node_addresses();
        for addr in addresses {
            if addr == self.local_addr {
                continue;
            }
            self.deliver(addr, &frame).await?;
        }
        Ok(())
    }

    async fn global_acks(&self) -> Result<HashSet<ComponentId>, MessagingError> {
        Ok(self.registry.snapshot())
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
