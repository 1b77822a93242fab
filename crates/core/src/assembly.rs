// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Component instances and the assembly graph.
//!
//! Instances never hold references to peer instances, only peer identifiers;
//! the assembly is the index that resolves them. Connections are stored on
//! both ends and the symmetry is maintained by [`Assembly::connect`] /
//! [`Assembly::disconnect`].

use crate::lifecycle::ComponentType;
use crate::names::{ComponentId, PlaceName, PortName, TypeName};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while assembling instances and connections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("instance {component} already exists")]
    DuplicateInstance { component: ComponentId },
    #[error("unknown instance {component}")]
    UnknownInstance { component: ComponentId },
    #[error("{component} has no port named {port}")]
    UnknownPort { component: ComponentId, port: PortName },
    #[error("{component}.{port} is not a provide-port")]
    NotAProvidePort { component: ComponentId, port: PortName },
    #[error("{component}.{port} is not a use-port")]
    NotAUsePort { component: ComponentId, port: PortName },
    #[error("use-port {component}.{port} is already connected")]
    UseAlreadyConnected { component: ComponentId, port: PortName },
    #[error("{component} has no place named {place}")]
    UnknownPlace { component: ComponentId, place: PlaceName },
}

/// A component instance: a unique id, a shared type handle, and the
/// connection state of its ports.
#[derive(Debug, Clone)]
pub struct ComponentInstance {
    id: ComponentId,
    ty: Arc<ComponentType>,
    /// Per local port, the set of `(peer instance, peer port)` ends.
    connections: IndexMap<PortName, IndexSet<(ComponentId, PortName)>>,
    /// Reverse index: `(peer instance, peer port)` to the local port facing it.
    external: HashMap<(ComponentId, PortName), PortName>,
}

impl ComponentInstance {
    pub fn new(id: impl Into<ComponentId>, ty: Arc<ComponentType>) -> Self {
        let connections =
            ty.ports().map(|p| (p.name().clone(), IndexSet::new())).collect();
        Self { id: id.into(), ty, connections, external: HashMap::new() }
    }

    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    pub fn component_type(&self) -> &Arc<ComponentType> {
        &self.ty
    }

    /// Connections of a local port. Empty when the port is unknown.
    pub fn connections(&self, port: &str) -> impl Iterator<Item = &(ComponentId, PortName)> {
        self.connections.get(port).into_iter().flatten()
    }

    /// The local port facing `(peer, peer_port)`, if any.
    pub fn external_port_connection(
        &self,
        peer: &ComponentId,
        peer_port: &PortName,
    ) -> Option<&PortName> {
        self.external.get(&(peer.clone(), peer_port.clone()))
    }

    /// All peer instances this instance is connected to, on any port.
    pub fn neighbors(&self) -> IndexSet<ComponentId> {
        self.connections
            .values()
            .flatten()
            .map(|(peer, _)| peer.clone())
            .collect()
    }

    pub(crate) fn attach(
        &mut self,
        local_port: &PortName,
        peer: ComponentId,
        peer_port: PortName,
    ) -> Result<(), AssemblyError> {
        let port = self.ty.port(local_port).ok_or_else(|| AssemblyError::UnknownPort {
            component: self.id.clone(),
            port: local_port.clone(),
        })?;
        let ends = self
            .connections
            .get_mut(local_port.as_str())
            .ok_or_else(|| AssemblyError::UnknownPort {
                component: self.id.clone(),
                port: local_port.clone(),
            })?;
        // A use-port is connected to at most one provider.
        if port.is_use_port() && !ends.is_empty() {
            return Err(AssemblyError::UseAlreadyConnected {
                component: self.id.clone(),
                port: local_port.clone(),
            });
        }
        self.external.insert((peer.clone(), peer_port.clone()), local_port.clone());
        ends.insert((peer, peer_port));
        Ok(())
    }

    pub(crate) fn detach(&mut self, local_port: &PortName, peer: &ComponentId, peer_port: &PortName) {
        if let Some(ends) = self.connections.get_mut(local_port.as_str()) {
            ends.shift_remove(&(peer.clone(), peer_port.clone()));
        }
        self.external.remove(&(peer.clone(), peer_port.clone()));
    }
}

/// Provider/user endpoints of one connection, as stored in a skeleton.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ConnectionEnds {
    pub provider: ComponentId,
    pub provide_port: PortName,
    pub user: ComponentId,
    pub use_port: PortName,
}

impl ConnectionEnds {
    pub fn new(
        provider: impl Into<ComponentId>,
        provide_port: impl Into<PortName>,
        user: impl Into<ComponentId>,
        use_port: impl Into<PortName>,
    ) -> Self {
        Self {
            provider: provider.into(),
            provide_port: provide_port.into(),
            user: user.into(),
            use_port: use_port.into(),
        }
    }
}

/// Structural view of an assembly: who exists (by type name) and who is
/// connected to whom. This is all the diff needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssemblySkeleton {
    pub components: IndexMap<ComponentId, TypeName>,
    pub connections: IndexSet<ConnectionEnds>,
}

impl AssemblySkeleton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn component(mut self, id: impl Into<ComponentId>, ty: impl Into<TypeName>) -> Self {
        self.components.insert(id.into(), ty.into());
        self
    }

    pub fn connection(mut self, ends: ConnectionEnds) -> Self {
        self.connections.insert(ends);
        self
    }
}

/// The live assembly: instances, their connections, and each instance's
/// current (active) place.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    instances: IndexMap<ComponentId, ComponentInstance>,
    active: IndexMap<ComponentId, PlaceName>,
}

impl Assembly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instance at its type's initial place.
    pub fn add_instance(
        &mut self,
        id: impl Into<ComponentId>,
        ty: Arc<ComponentType>,
    ) -> Result<(), AssemblyError> {
        let id = id.into();
        if self.instances.contains_key(&id) {
            return Err(AssemblyError::DuplicateInstance { component: id });
        }
        self.active.insert(id.clone(), ty.initial_place().clone());
        self.instances.insert(id.clone(), ComponentInstance::new(id, ty));
        Ok(())
    }

    pub fn instance(&self, id: &str) -> Option<&ComponentInstance> {
        self.instances.get(id)
    }

    pub fn instances(&self) -> impl Iterator<Item = &ComponentInstance> {
        self.instances.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ComponentId> {
        self.instances.keys()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Current place of an instance.
    pub fn active_place(&self, id: &str) -> Option<&PlaceName> {
        self.active.get(id)
    }

    /// Move an instance to a place of its type.
    pub fn set_active_place(
        &mut self,
        id: &str,
        place: impl Into<PlaceName>,
    ) -> Result<(), AssemblyError> {
        let place = place.into();
        let instance = self.instances.get(id).ok_or_else(|| AssemblyError::UnknownInstance {
            component: ComponentId::new(id),
        })?;
        if !instance.component_type().has_place(&place) {
            return Err(AssemblyError::UnknownPlace {
                component: instance.id().clone(),
                place,
            });
        }
        self.active.insert(instance.id().clone(), place);
        Ok(())
    }

    /// Connect a provider's provide-port to a user's use-port, recording the
    /// connection on both ends.
    pub fn connect(
        &mut self,
        provider: &str,
        provide_port: &str,
        user: &str,
        use_port: &str,
    ) -> Result<(), AssemblyError> {
        let provide_port = PortName::new(provide_port);
        let use_port = PortName::new(use_port);
        let provider_id = self.checked_port(provider, &provide_port, true)?;
        let user_id = self.checked_port(user, &use_port, false)?;
        if let Some(instance) = self.instances.get_mut(provider) {
            instance.attach(&provide_port, user_id.clone(), use_port.clone())?;
        }
        if let Some(instance) = self.instances.get_mut(user) {
            if let Err(e) = instance.attach(&use_port, provider_id.clone(), provide_port.clone()) {
                // Roll the provider side back so the symmetry invariant holds.
                if let Some(instance) = self.instances.get_mut(provider) {
                    instance.detach(&provide_port, &user_id, &use_port);
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Record a connection whose peer is hosted on another node: only the
    /// local side is attached. The peer id is kept as an identifier and
    /// never resolved locally.
    pub fn connect_external(
        &mut self,
        local: &str,
        local_port: &str,
        peer: &str,
        peer_port: &str,
    ) -> Result<(), AssemblyError> {
        let local_port = PortName::new(local_port);
        let instance = self.instances.get_mut(local).ok_or_else(|| {
            AssemblyError::UnknownInstance { component: ComponentId::new(local) }
        })?;
        instance.attach(&local_port, ComponentId::new(peer), PortName::new(peer_port))
    }

    /// Remove a connection from both ends.
    pub fn disconnect(
        &mut self,
        provider: &str,
        provide_port: &str,
        user: &str,
        use_port: &str,
    ) -> Result<(), AssemblyError> {
        let provide_port = PortName::new(provide_port);
        let use_port = PortName::new(use_port);
        let provider_id = self.checked_port(provider, &provide_port, true)?;
        let user_id = self.checked_port(user, &use_port, false)?;
        if let Some(instance) = self.instances.get_mut(provider) {
            instance.detach(&provide_port, &user_id, &use_port);
        }
        if let Some(instance) = self.instances.get_mut(user) {
            instance.detach(&use_port, &provider_id, &provide_port);
        }
        Ok(())
    }

    /// Structural skeleton of this assembly, for diffing.
    pub fn skeleton(&self) -> AssemblySkeleton {
        let mut skeleton = AssemblySkeleton::new();
        for instance in self.instances.values() {
            skeleton
                .components
                .insert(instance.id().clone(), instance.component_type().name().clone());
        }
        for instance in self.instances.values() {
            for port in instance.component_type().provide_ports() {
                for (user, use_port) in instance.connections(port.name()) {
                    skeleton.connections.insert(ConnectionEnds {
                        provider: instance.id().clone(),
                        provide_port: port.name().clone(),
                        user: user.clone(),
                        use_port: use_port.clone(),
                    });
                }
            }
        }
        skeleton
    }

    fn checked_port(
        &self,
        id: &str,
        port: &PortName,
        provide: bool,
    ) -> Result<ComponentId, AssemblyError> {
        let instance = self.instances.get(id).ok_or_else(|| AssemblyError::UnknownInstance {
            component: ComponentId::new(id),
        })?;
        let declared =
            instance.component_type().port(port).ok_or_else(|| AssemblyError::UnknownPort {
                component: instance.id().clone(),
                port: port.clone(),
            })?;
        if provide && !declared.is_provide_port() {
            return Err(AssemblyError::NotAProvidePort {
                component: instance.id().clone(),
                port: port.clone(),
            });
        }
        if !provide && !declared.is_use_port() {
            return Err(AssemblyError::NotAUsePort {
                component: instance.id().clone(),
                port: port.clone(),
            });
        }
        Ok(instance.id().clone())
    }
}

#[cfg(test)]
#[path = "assembly_tests.rs"]
mod tests;
