// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Component types: the place/behavior/transition lifecycle and its ports.

use crate::names::{BehaviorName, PlaceName, PortName, TypeName};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing a component type.
///
/// All variants are fatal: a type that fails validation never enters an
/// assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("type {type_name} has no places")]
    NoPlaces { type_name: TypeName },
    #[error("type {type_name} has no initial place")]
    MissingInitialPlace { type_name: TypeName },
    #[error("type {type_name}: initial place {place} is not a declared place")]
    UnknownInitialPlace { type_name: TypeName, place: PlaceName },
    #[error("type {type_name}: running place {place} is not a declared place")]
    UnknownRunningPlace { type_name: TypeName, place: PlaceName },
    #[error("type {type_name}: behavior {behavior} has no transitions")]
    EmptyBehavior {
        type_name: TypeName,
        behavior: BehaviorName,
    },
    #[error("type {type_name}: transition of {behavior} references unknown place {place}")]
    UnknownTransitionPlace {
        type_name: TypeName,
        behavior: BehaviorName,
        place: PlaceName,
    },
    #[error("type {type_name}: port {port} binds unknown place {place}")]
    UnknownPortPlace {
        type_name: TypeName,
        port: PortName,
        place: PlaceName,
    },
}

/// Direction of a port: a use-port consumes what a peer's provide-port offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDirection {
    Use,
    Provide,
}

crate::display_label! {
    PortDirection {
        Use => "use",
        Provide => "provide",
    }
}

/// One labeled arc of a behavior: source place, destination place, cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub src: PlaceName,
    pub dst: PlaceName,
    pub cost: u64,
}

impl Transition {
    pub fn new(src: impl Into<PlaceName>, dst: impl Into<PlaceName>, cost: u64) -> Self {
        Self { src: src.into(), dst: dst.into(), cost }
    }
}

/// A named group of transitions. Executing the behavior moves the instance
/// along its transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Behavior {
    name: BehaviorName,
    transitions: Vec<Transition>,
}

impl Behavior {
    pub fn name(&self) -> &BehaviorName {
        &self.name
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }
}

/// A directional port bound to a subset of places. The port is active exactly
/// when the instance's current place lies in the binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    name: PortName,
    direction: PortDirection,
    bound_places: IndexSet<PlaceName>,
}

impl Port {
    pub fn name(&self) -> &PortName {
        &self.name
    }

    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    pub fn is_use_port(&self) -> bool {
        self.direction == PortDirection::Use
    }

    pub fn is_provide_port(&self) -> bool {
        self.direction == PortDirection::Provide
    }

    pub fn bound_places(&self) -> &IndexSet<PlaceName> {
        &self.bound_places
    }

    /// Whether the port is active when the instance sits at `place`.
    pub fn is_bound_to(&self, place: &PlaceName) -> bool {
        self.bound_places.contains(place)
    }
}

/// A component type: the lifecycle automaton descriptor shared by all
/// instances of the type.
///
/// Immutable once built; instances hold it through a shared handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentType {
    name: TypeName,
    places: IndexSet<PlaceName>,
    initial: PlaceName,
    running: Option<PlaceName>,
    behaviors: IndexMap<BehaviorName, Behavior>,
    ports: IndexMap<PortName, Port>,
}

impl ComponentType {
    /// Start building a type with the given library name.
    pub fn builder(name: impl Into<TypeName>) -> ComponentTypeBuilder {
        ComponentTypeBuilder {
            name: name.into(),
            places: IndexSet::new(),
            initial: None,
            running: None,
            behaviors: IndexMap::new(),
            ports: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// Declared places, in declaration order.
    pub fn places(&self) -> &IndexSet<PlaceName> {
        &self.places
    }

    pub fn has_place(&self, place: &str) -> bool {
        self.places.contains(place)
    }

    pub fn initial_place(&self) -> &PlaceName {
        &self.initial
    }

    pub fn running_place(&self) -> Option<&PlaceName> {
        self.running.as_ref()
    }

    /// Declared behaviors, in declaration order.
    pub fn behaviors(&self) -> impl Iterator<Item = &Behavior> {
        self.behaviors.values()
    }

    pub fn behavior(&self, name: &str) -> Option<&Behavior> {
        self.behaviors.get(name)
    }

    /// Declared ports, in declaration order.
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.values()
    }

    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.get(name)
    }

    pub fn use_ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.values().filter(|p| p.is_use_port())
    }

    pub fn provide_ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.values().filter(|p| p.is_provide_port())
    }
}

/// Validating builder for [`ComponentType`].
pub struct ComponentTypeBuilder {
    name: TypeName,
    places: IndexSet<PlaceName>,
    initial: Option<PlaceName>,
    running: Option<PlaceName>,
    behaviors: IndexMap<BehaviorName, Behavior>,
    ports: IndexMap<PortName, Port>,
}

impl ComponentTypeBuilder {
    /// Declare a place. Declaration order is preserved.
    pub fn place(mut self, name: impl Into<PlaceName>) -> Self {
        self.places.insert(name.into());
        self
    }

    /// Declare several places at once.
    pub fn places<I, P>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PlaceName>,
    {
        self.places.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn initial(mut self, place: impl Into<PlaceName>) -> Self {
        self.initial = Some(place.into());
        self
    }

    pub fn running(mut self, place: impl Into<PlaceName>) -> Self {
        self.running = Some(place.into());
        self
    }

    /// Declare a behavior as a set of `(src, dst, cost)` transitions.
    pub fn behavior<I, S, D>(mut self, name: impl Into<BehaviorName>, transitions: I) -> Self
    where
        I: IntoIterator<Item = (S, D, u64)>,
        S: Into<PlaceName>,
        D: Into<PlaceName>,
    {
        let name = name.into();
        let transitions = transitions
            .into_iter()
            .map(|(src, dst, cost)| Transition::new(src, dst, cost))
            .collect();
        self.behaviors.insert(name.clone(), Behavior { name, transitions });
        self
    }

    /// Declare a use-port bound to the given places.
    pub fn use_port<I, P>(self, name: impl Into<PortName>, bound: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PlaceName>,
    {
        self.port(name, PortDirection::Use, bound)
    }

    /// Declare a provide-port bound to the given places.
    pub fn provide_port<I, P>(self, name: impl Into<PortName>, bound: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PlaceName>,
    {
        self.port(name, PortDirection::Provide, bound)
    }

    fn port<I, P>(mut self, name: impl Into<PortName>, direction: PortDirection, bound: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PlaceName>,
    {
        let name = name.into();
        let bound_places = bound.into_iter().map(Into::into).collect();
        self.ports.insert(name.clone(), Port { name, direction, bound_places });
        self
    }

    /// Validate and produce the type.
    pub fn build(self) -> Result<ComponentType, ModelError> {
        let type_name = self.name.clone();
        if self.places.is_empty() {
            return Err(ModelError::NoPlaces { type_name });
        }
        let initial = self
            .initial
            .ok_or_else(|| ModelError::MissingInitialPlace { type_name: type_name.clone() })?;
        if !self.places.contains(&initial) {
            return Err(ModelError::UnknownInitialPlace { type_name, place: initial });
        }
        if let Some(running) = &self.running {
            if !self.places.contains(running) {
                return Err(ModelError::UnknownRunningPlace {
                    type_name,
                    place: running.clone(),
                });
            }
        }
        for behavior in self.behaviors.values() {
            if behavior.transitions.is_empty() {
                return Err(ModelError::EmptyBehavior {
                    type_name: type_name.clone(),
                    behavior: behavior.name.clone(),
                });
            }
            for transition in &behavior.transitions {
                for place in [&transition.src, &transition.dst] {
                    if !self.places.contains(place) {
                        return Err(ModelError::UnknownTransitionPlace {
                            type_name: type_name.clone(),
                            behavior: behavior.name.clone(),
                            place: place.clone(),
                        });
                    }
                }
            }
        }
        for port in self.ports.values() {
            for place in &port.bound_places {
                if !self.places.contains(place) {
                    return Err(ModelError::UnknownPortPlace {
                        type_name: type_name.clone(),
                        port: port.name.clone(),
                        place: place.clone(),
                    });
                }
            }
        }
        Ok(ComponentType {
            name: self.name,
            places: self.places,
            initial,
            running: self.running,
            behaviors: self.behaviors,
            ports: self.ports,
        })
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
