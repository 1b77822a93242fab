// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimum-cost word search.
//!
//! The solver explores the product of (automaton state, goal progress,
//! last input) layer by layer, one layer per non-skip input, up to the word
//! length bound. Trailing skips are implicit: any layer's node may terminate
//! the word, so skip absorption holds by construction.

use crate::automaton::LifecycleAutomaton;
use std::collections::{HashMap, HashSet};

/// Sentinel for "last non-skip input was a wait" (waits never satisfy a
/// final behavior goal).
const LAST_WAIT: u16 = u16::MAX;
const LAST_NONE: u16 = 0;

/// An existential obligation tracked as one bit of goal progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Mark {
    /// Some `states[i]` equals this state.
    StateVisited(usize),
    /// Some `states[i]` projects this status on this port.
    PortSeen { port: usize, enabled: bool },
    /// Some `sequence[i]` equals this input.
    BehaviorDone(usize),
    /// The wait input has been emitted (exactly once, gated in `relax`).
    WaitDone(usize),
}

/// Conditions on the terminal state / last input.
#[derive(Debug, Default)]
pub(crate) struct Finals {
    pub states: Vec<usize>,
    /// `(port, enabled)` pairs the terminal state must project.
    pub ports: Vec<(usize, bool)>,
    /// Input indices that must be the last non-skip input.
    pub behaviors: Vec<usize>,
}

/// A synthesized wait input: a zero-cost self-loop legal exactly on the
/// states projecting `enabled` on `port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WaitSpec {
    pub port: usize,
    pub enabled: bool,
}

#[derive(Debug)]
pub(crate) struct Problem<'a> {
    pub automaton: &'a LifecycleAutomaton,
    pub initial: usize,
    pub word_length: usize,
    /// Per port (by index), the states on which it is enabled.
    pub port_enabled: Vec<HashSet<usize>>,
    pub marks: Vec<Mark>,
    pub finals: Finals,
    pub waits: Vec<WaitSpec>,
}

/// One non-skip input of a solution word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Step {
    Behavior(usize),
    Wait(usize),
}

#[derive(Debug)]
pub(crate) struct Outcome {
    pub inputs: Vec<Step>,
    /// Visited states, `inputs.len() + 1` entries.
    pub states: Vec<usize>,
    pub cost: u64,
}

type Node = (usize, u64, u16);

struct Entry {
    cost: u64,
    parent: Option<(Node, Step)>,
}

impl Problem<'_> {
    fn state_marks(&self, state: usize) -> u64 {
        let mut bits = 0u64;
        for (i, mark) in self.marks.iter().enumerate() {
            match mark {
                Mark::StateVisited(s) if *s == state => bits |= 1 << i,
                Mark::PortSeen { port, enabled } => {
                    if self.port_enabled[*port].contains(&state) == *enabled {
                        bits |= 1 << i;
                    }
                }
                _ => {}
            }
        }
        bits
    }

    fn input_marks(&self, input: usize) -> u64 {
        let mut bits = 0u64;
        for (i, mark) in self.marks.iter().enumerate() {
            if matches!(mark, Mark::BehaviorDone(b) if *b == input) {
                bits |= 1 << i;
            }
        }
        bits
    }

    fn wait_mark(&self, wait: usize) -> u64 {
        let mut bits = 0u64;
        for (i, mark) in self.marks.iter().enumerate() {
            if matches!(mark, Mark::WaitDone(w) if *w == wait) {
                bits |= 1 << i;
            }
        }
        bits
    }

    fn required_mask(&self) -> u64 {
        if self.marks.len() >= 64 {
            u64::MAX
        } else {
            (1u64 << self.marks.len()) - 1
        }
    }

    fn port_status(&self, port: usize, state: usize) -> bool {
        self.port_enabled[port].contains(&state)
    }

    fn accepts(&self, node: Node) -> bool {
        let (state, mask, last) = node;
        if mask != self.required_mask() {
            return false;
        }
        if self.finals.states.iter().any(|s| *s != state) {
            return false;
        }
        if self.finals.ports.iter().any(|(p, enabled)| self.port_status(*p, state) != *enabled) {
            return false;
        }
        self.finals
            .behaviors
            .iter()
            .all(|b| last != LAST_NONE && last != LAST_WAIT && last as usize - 1 == *b)
    }
}

/// Solve the word problem. `None` means no feasible word of length ≤ W.
pub(crate) fn solve(problem: &Problem) -> Option<Outcome> {
    let input_count = problem.automaton.inputs().len();
    let start: Node = (problem.initial, problem.state_marks(problem.initial), LAST_NONE);

    let mut layers: Vec<HashMap<Node, Entry>> = Vec::with_capacity(problem.word_length + 1);
    layers.push(HashMap::from([(start, Entry { cost: 0, parent: None })]));

    // Cost ties break lexicographically on (layer, node) so runs are
    // reproducible: shorter words first, then declaration order.
    let mut best: Option<(u64, usize, Node)> = None;
    let note_candidates = |layer_idx: usize, layer: &HashMap<Node, Entry>,
                           best: &mut Option<(u64, usize, Node)>| {
        for (node, entry) in layer {
            if !problem.accepts(*node) {
                continue;
            }
            let candidate = (entry.cost, layer_idx, *node);
            if best.as_ref().is_none_or(|held| candidate < *held) {
                *best = Some(candidate);
            }
        }
    };
    note_candidates(0, &layers[0], &mut best);

    for depth in 0..problem.word_length {
        let mut next: HashMap<Node, Entry> = HashMap::new();
        for (&node, entry) in &layers[depth] {
            let (state, mask, _) = node;
            let cost = entry.cost;
            for input in 0..input_count {
                let Some(target) = problem.automaton.next(state, input) else {
                    continue;
                };
                let step_cost = problem.automaton.transition_cost(state, input);
                let successor: Node = (
                    target,
                    mask | problem.input_marks(input) | problem.state_marks(target),
                    input as u16 + 1,
                );
                relax(&mut next, successor, cost + step_cost, Some((node, Step::Behavior(input))));
            }
            for (w, wait) in problem.waits.iter().enumerate() {
                let bit = problem.wait_mark(w);
                if mask & bit != 0 {
                    // Each wait occurs exactly once.
                    continue;
                }
                if problem.port_status(wait.port, state) != wait.enabled {
                    continue;
                }
                let successor: Node = (state, mask | bit, LAST_WAIT);
                relax(&mut next, successor, cost, Some((node, Step::Wait(w))));
            }
        }
        if next.is_empty() {
            break;
        }
        note_candidates(depth + 1, &next, &mut best);
        layers.push(next);
    }

    let (cost, mut depth, mut node) = best?;

    let mut inputs: Vec<Step> = Vec::with_capacity(depth);
    let mut states: Vec<usize> = vec![node.0];
    while depth > 0 {
        let entry = layers[depth].get(&node)?;
        let (parent, step) = entry.parent?;
        inputs.push(step);
        node = parent;
        depth -= 1;
        states.push(node.0);
    }
    inputs.reverse();
    states.reverse();

    Some(Outcome { inputs, states, cost })
}

fn relax(layer: &mut HashMap<Node, Entry>, node: Node, cost: u64, parent: Option<(Node, Step)>) {
    match layer.get_mut(&node) {
        Some(existing) if existing.cost < cost => {}
        // Equal cost: keep the lexicographically smaller parent so the
        // reconstructed word does not depend on hash iteration order.
        Some(existing) if existing.cost == cost => {
            if parent < existing.parent {
                existing.parent = parent;
            }
        }
        Some(existing) => {
            existing.cost = cost;
            existing.parent = parent;
        }
        None => {
            layer.insert(node, Entry { cost, parent });
        }
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
