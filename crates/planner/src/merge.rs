// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan merging.
//!
//! Builds a precedence graph over all instructions (sequential edges inside
//! each plan, synchronisation edges from every `pushB` to its matching
//! `wait`s) and emits a total order from its roots, preferring vertices
//! whose predecessors have all been emitted. Structurally identical
//! instructions collapse to one vertex.

use ens_core::{Instruction, Plan};
use indexmap::IndexSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// The precedence graph is not acyclic (mis-aligned `pushB`/`wait`
    /// pairing); carries the instructions stuck in the cycle.
    #[error("instruction precedence cycle: [{}]", render(involved))]
    Cycle { involved: Vec<Instruction> },
}

fn render(involved: &[Instruction]) -> String {
    involved.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Merge per-instance plans into one totally-ordered plan.
pub fn merge_plans<'a, I>(plans: I) -> Result<Plan, MergeError>
where
    I: IntoIterator<Item = &'a Plan>,
{
    let plans: Vec<&Plan> = plans.into_iter().filter(|p| !p.is_empty()).collect();

    let mut vertices: IndexSet<Instruction> = IndexSet::new();
    for plan in &plans {
        for instruction in plan.instructions() {
            vertices.insert(instruction.clone());
        }
    }
    if vertices.is_empty() {
        return Ok(Plan::empty("merged"));
    }

    let mut out_edges: Vec<IndexSet<usize>> = vec![IndexSet::new(); vertices.len()];
    let mut in_edges: Vec<IndexSet<usize>> = vec![IndexSet::new(); vertices.len()];
    // Self-edges would make a deduplicated repeat of an instruction its own
    // predecessor; a vertex never precedes itself.
    fn add_edge(from: usize, to: usize, out: &mut [IndexSet<usize>], inn: &mut [IndexSet<usize>]) {
        if from != to {
            out[from].insert(to);
            inn[to].insert(from);
        }
    }

    // Sequential edges: each instruction precedes its successor in the same
    // plan, waits included.
    for plan in &plans {
        for pair in plan.instructions().windows(2) {
            let from = vertices.get_index_of(&pair[0]).unwrap_or_default();
            let to = vertices.get_index_of(&pair[1]).unwrap_or_default();
            add_edge(from, to, &mut out_edges, &mut in_edges);
        }
    }

    // Synchronisation edges: a pushB precedes every wait for it, across all
    // plans.
    for (from, instruction) in vertices.iter().enumerate() {
        if let Instruction::PushB { component, behavior } = instruction {
            let matching = Instruction::Wait {
                component: component.clone(),
                behavior: behavior.clone(),
            };
            if let Some(to) = vertices.get_index_of(&matching) {
                add_edge(from, to, &mut out_edges, &mut in_edges);
            }
        }
    }

    // Roots: each plan's first instruction, unless it is a wait (those are
    // pulled in by their matching pushB).
    let mut frontier: IndexSet<usize> = IndexSet::new();
    for plan in &plans {
        if let Some(first) = plan.instructions().first() {
            if !first.is_wait() {
                frontier.insert(vertices.get_index_of(first).unwrap_or_default());
            }
        }
    }
    if frontier.is_empty() {
        return Err(MergeError::Cycle { involved: vertices.into_iter().collect() });
    }

    let mut emitted: Vec<bool> = vec![false; vertices.len()];
    let mut order: Vec<usize> = Vec::with_capacity(vertices.len());
    while !frontier.is_empty() {
        // Prefer a vertex whose in-neighbours are all emitted; fall back to
        // the oldest frontier vertex otherwise.
        let ready = frontier
            .iter()
            .position(|v| in_edges[*v].iter().all(|p| emitted[*p]))
            .unwrap_or(0);
        let vertex = match frontier.shift_remove_index(ready) {
            Some(v) => v,
            None => break,
        };
        emitted[vertex] = true;
        order.push(vertex);
        for next in &out_edges[vertex] {
            if !emitted[*next] {
                frontier.insert(*next);
            }
        }
    }

    if order.len() < vertices.len() {
        let involved = vertices
            .iter()
            .enumerate()
            .filter(|(i, _)| !emitted[*i])
            .map(|(_, instruction)| instruction.clone())
            .collect();
        return Err(MergeError::Cycle { involved });
    }

    let instructions = order
        .into_iter()
        .filter_map(|i| vertices.get_index(i).cloned())
        .collect();
    Ok(Plan::new("merged", instructions))
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
