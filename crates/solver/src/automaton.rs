// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle-automaton reduction.
//!
//! A component type's place/behavior graph is reduced to a deterministic
//! automaton over behavior labels: chains of single-target arcs carrying the
//! same label collapse into one transition with the summed cost, while
//! branching structure is preserved. States are the pivot places (roots and
//! branch points) plus every chase endpoint; the instance's active place can
//! be injected as an extra seed so a plan can start mid-chain.

use ens_core::{BehaviorName, ComponentType, PlaceName};
use indexmap::{IndexMap, IndexSet};
use std::collections::{HashMap, HashSet};

/// The raw place/behavior graph of a component type, with per-(place, label)
/// costs. Parallel transitions sharing a label are collapsed by maximum cost:
/// all branches must complete, so the most expensive one bounds the label.
#[derive(Debug)]
struct RawAutomaton {
    /// `delta[place][label]`: all places reachable in one arc.
    delta: IndexMap<PlaceName, IndexMap<BehaviorName, Vec<PlaceName>>>,
    /// Labels entering each place.
    label_in: IndexMap<PlaceName, IndexSet<BehaviorName>>,
    /// Labels leaving each place.
    label_out: IndexMap<PlaceName, IndexSet<BehaviorName>>,
    cost: HashMap<(PlaceName, BehaviorName), u64>,
}

impl RawAutomaton {
    fn from_type(ty: &ComponentType) -> Self {
        let mut delta: IndexMap<PlaceName, IndexMap<BehaviorName, Vec<PlaceName>>> =
            ty.places().iter().map(|p| (p.clone(), IndexMap::new())).collect();
        let mut label_in: IndexMap<PlaceName, IndexSet<BehaviorName>> =
            ty.places().iter().map(|p| (p.clone(), IndexSet::new())).collect();
        let mut label_out = label_in.clone();
        let mut cost: HashMap<(PlaceName, BehaviorName), u64> = HashMap::new();

        for behavior in ty.behaviors() {
            let label = behavior.name().clone();
            for transition in behavior.transitions() {
                if let Some(arcs) = delta.get_mut(&transition.src) {
                    arcs.entry(label.clone()).or_default().push(transition.dst.clone());
                }
                let key = (transition.src.clone(), label.clone());
                let entry = cost.entry(key).or_insert(0);
                *entry = (*entry).max(transition.cost);
                if let Some(labels) = label_in.get_mut(&transition.dst) {
                    labels.insert(label.clone());
                }
                if let Some(labels) = label_out.get_mut(&transition.src) {
                    labels.insert(label.clone());
                }
            }
        }
        Self { delta, label_in, label_out, cost }
    }

    /// Pivot places: no incoming label, or at least one outgoing label that
    /// never appears incoming.
    fn pivots(&self) -> IndexSet<PlaceName> {
        self.delta
            .keys()
            .filter(|place| {
                let incoming = &self.label_in[*place];
                let outgoing = &self.label_out[*place];
                incoming.is_empty() || outgoing.iter().any(|label| !incoming.contains(label))
            })
            .cloned()
            .collect()
    }

    fn first_target(&self, place: &PlaceName, label: &BehaviorName) -> Option<&PlaceName> {
        self.delta.get(place)?.get(label)?.first()
    }

    fn arc_cost(&self, place: &PlaceName, label: &BehaviorName) -> u64 {
        self.cost.get(&(place.clone(), label.clone())).copied().unwrap_or(0)
    }
}

/// The reduced deterministic automaton: `delta(state, input) -> state | ⊥`
/// with a per-transition cost. `skip` is implicit: every state carries a
/// zero-cost skip self-loop, and absent transitions are `None`.
#[derive(Debug, Clone)]
pub struct LifecycleAutomaton {
    states: IndexSet<PlaceName>,
    inputs: IndexSet<BehaviorName>,
    delta: HashMap<(usize, usize), usize>,
    cost: HashMap<(usize, usize), u64>,
}

impl LifecycleAutomaton {
    /// Reduce a component type. `seed` (typically the instance's active
    /// place) is added to the state set before chasing so that planning can
    /// start there even when the place sits mid-chain.
    pub fn reduce(ty: &ComponentType, seed: Option<&PlaceName>) -> Self {
        let seeds: IndexSet<PlaceName> = seed.into_iter().cloned().collect();
        Self::reduce_with_seeds(ty, &seeds)
    }

    /// Reduce with several extra seed states (active place plus any goal
    /// places that must stay observable). Unknown places are ignored.
    pub fn reduce_with_seeds(ty: &ComponentType, seeds: &IndexSet<PlaceName>) -> Self {
        let raw = RawAutomaton::from_type(ty);

        let mut states = raw.pivots();
        for seed in seeds {
            if ty.has_place(seed) {
                states.insert(seed.clone());
            }
        }

        // Chase to a fixpoint: every chase endpoint becomes a state, and a
        // grown state set can split earlier chases, so re-chase until the
        // state set is stable. The final iteration's edges are consistent
        // with the full state set.
        let mut edges: Vec<(PlaceName, BehaviorName, PlaceName, u64)> = Vec::new();
        loop {
            edges.clear();
            let mut discovered = false;
            let snapshot: Vec<PlaceName> = states.iter().cloned().collect();
            for state in snapshot {
                let outgoing: Vec<BehaviorName> =
                    raw.label_out.get(&state).into_iter().flatten().cloned().collect();
                for label in outgoing {
                    let mut curr = state.clone();
                    let mut acc = 0u64;
                    let mut seen: HashSet<PlaceName> = HashSet::from([state.clone()]);
                    while let Some(next) = raw.first_target(&curr, &label) {
                        acc += raw.arc_cost(&curr, &label);
                        let next = next.clone();
                        let stop = states.contains(&next) || seen.contains(&next);
                        curr = next;
                        if stop {
                            break;
                        }
                        seen.insert(curr.clone());
                    }
                    if states.insert(curr.clone()) {
                        discovered = true;
                    }
                    edges.push((state.clone(), label, curr, acc));
                }
            }
            if !discovered {
                break;
            }
        }

        let mut inputs = IndexSet::new();
        for (_, label, _, _) in &edges {
            inputs.insert(label.clone());
        }

        let mut delta = HashMap::new();
        let mut cost = HashMap::new();
        for (src, label, dst, acc) in edges {
            let src_idx = states.get_index_of(&src).unwrap_or_default();
            let dst_idx = states.get_index_of(&dst).unwrap_or_default();
            let input_idx = inputs.get_index_of(&label).unwrap_or_default();
            // First chase wins when several reduced paths share (src, label);
            // the automaton is deterministic per label after reduction.
            delta.entry((src_idx, input_idx)).or_insert(dst_idx);
            cost.entry((src_idx, input_idx)).or_insert(acc);
        }

        Self { states, inputs, delta, cost }
    }

    pub fn states(&self) -> &IndexSet<PlaceName> {
        &self.states
    }

    /// Non-skip inputs of the automaton, i.e. the behaviors that survived
    /// reduction.
    pub fn inputs(&self) -> &IndexSet<BehaviorName> {
        &self.inputs
    }

    pub fn state_index(&self, place: &str) -> Option<usize> {
        self.states.get_index_of(place)
    }

    pub fn state_name(&self, index: usize) -> Option<&PlaceName> {
        self.states.get_index(index)
    }

    pub fn input_index(&self, behavior: &str) -> Option<usize> {
        self.inputs.get_index_of(behavior)
    }

    pub fn input_name(&self, index: usize) -> Option<&BehaviorName> {
        self.inputs.get_index(index)
    }

    /// `delta(state, input)`, `None` encoding ⊥.
    pub fn next(&self, state: usize, input: usize) -> Option<usize> {
        self.delta.get(&(state, input)).copied()
    }

    /// Cost of applying `input` at `state`. Zero when the transition is
    /// absent (the search never takes absent transitions).
    pub fn transition_cost(&self, state: usize, input: usize) -> u64 {
        self.cost.get(&(state, input)).copied().unwrap_or(0)
    }

    /// Convenience lookup by names, for tests and diagnostics.
    pub fn step(&self, place: &str, behavior: &str) -> Option<&PlaceName> {
        let state = self.state_index(place)?;
        let input = self.input_index(behavior)?;
        self.state_name(self.next(state, input)?)
    }

    /// Cost lookup by names.
    pub fn step_cost(&self, place: &str, behavior: &str) -> Option<u64> {
        let state = self.state_index(place)?;
        let input = self.input_index(behavior)?;
        self.next(state, input)?;
        Some(self.transition_cost(state, input))
    }
}

#[cfg(test)]
#[path = "automaton_tests.rs"]
mod tests;
