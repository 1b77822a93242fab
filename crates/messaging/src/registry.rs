// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The global-ack registry: a set-valued monotonic register.

use ens_core::ComponentId;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// Records which instances have broadcast their root-ack. Entries are only
/// ever added, so a snapshot that satisfies the termination condition keeps
/// satisfying it.
#[derive(Debug, Clone, Default)]
pub struct GlobalAckRegistry {
    inner: Arc<RwLock<HashSet<ComponentId>>>,
}

impl GlobalAckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broadcast(&self, component: &ComponentId) {
        self.inner.write().insert(component.clone());
    }

    pub fn snapshot(&self) -> HashSet<ComponentId> {
        self.inner.read().clone()
    }

    pub fn contains(&self, component: &ComponentId) -> bool {
        self.inner.read().contains(component)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
