// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structural diff between two assembly skeletons.

use crate::assembly::AssemblySkeleton;
use crate::plan::Instruction;

/// The four structural buckets separating two assembly skeletons.
///
/// Set semantics; each bucket preserves the iteration order of the skeleton
/// it was derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyDiff {
    pub to_add: Vec<Instruction>,
    pub to_del: Vec<Instruction>,
    pub to_con: Vec<Instruction>,
    pub to_disc: Vec<Instruction>,
}

impl AssemblyDiff {
    /// Instructions to run before the behavioral plan: creations, then
    /// connections.
    pub fn prologue(&self) -> impl Iterator<Item = &Instruction> {
        self.to_add.iter().chain(&self.to_con)
    }

    /// Instructions to run after the behavioral plan: disconnections, then
    /// deletions.
    pub fn epilogue(&self) -> impl Iterator<Item = &Instruction> {
        self.to_disc.iter().chain(&self.to_del)
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty()
            && self.to_del.is_empty()
            && self.to_con.is_empty()
            && self.to_disc.is_empty()
    }
}

/// Compute the structural instructions taking `input` to `target`.
pub fn diff_assembly(input: &AssemblySkeleton, target: &AssemblySkeleton) -> AssemblyDiff {
    let mut diff = AssemblyDiff::default();
    for (component, component_type) in &target.components {
        if !input.components.contains_key(component) {
            diff.to_add.push(Instruction::Add {
                component: component.clone(),
                component_type: component_type.clone(),
            });
        }
    }
    for component in input.components.keys() {
        if !target.components.contains_key(component) {
            diff.to_del.push(Instruction::Del { component: component.clone() });
        }
    }
    for ends in &target.connections {
        if !input.connections.contains(ends) {
            diff.to_con.push(Instruction::Connect {
                provider: ends.provider.clone(),
                provide_port: ends.provide_port.clone(),
                user: ends.user.clone(),
                use_port: ends.use_port.clone(),
            });
        }
    }
    for ends in &input.connections {
        if !target.connections.contains(ends) {
            diff.to_disc.push(Instruction::Disconnect {
                provider: ends.provider.clone(),
                provide_port: ends.provide_port.clone(),
                user: ends.user.clone(),
                use_port: ends.use_port.clone(),
            });
        }
    }
    diff
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod tests;
