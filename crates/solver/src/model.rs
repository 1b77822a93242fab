// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-instance constraint model.
//!
//! Accumulates an instance's reconfiguration goals and the port constraints
//! received from neighbors, and compiles them with the reduced lifecycle
//! automaton into a word problem for the search backend.
//!
//! The model has two solve modes mirroring the planner protocol: *inference*
//! encodes received constraints as plain port goals and is used to observe
//! the induced port-status trajectories; *plan* additionally synthesizes a
//! wait input per until-constraint and yields the word that becomes the
//! local plan.

use crate::automaton::LifecycleAutomaton;
use crate::search::{self, Finals, Mark, Problem, Step, WaitSpec};
use ens_core::{
    BehaviorName, ComponentId, ComponentType, GoalError, PlaceName, PortConstraint, PortName,
    PortStatus, ReconfigurationGoal,
};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Errors from solving one instance's word problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    /// No feasible word of length ≤ the bound. Carries the conflicting goal
    /// set for diagnostics.
    #[error("{component}: no feasible behavior sequence of length <= {word_length} (goals: {})", goals.join(", "))]
    Infeasible {
        component: ComponentId,
        word_length: usize,
        goals: Vec<String>,
    },
    /// The goal/constraint set exceeds the solver's progress-tracking width.
    #[error("{component}: goal set too large for the solver ({count} obligations)")]
    TooManyGoals { component: ComponentId, count: usize },
}

/// A synthesized cross-instance barrier inside the solver word: sit on a
/// state where `port` projects `status` until `peer` has executed
/// `behavior`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WaitInput {
    pub peer: ComponentId,
    pub behavior: BehaviorName,
    pub port: PortName,
    pub status: PortStatus,
}

/// One non-skip input of a solution word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverInput {
    Behavior(BehaviorName),
    Wait(WaitInput),
}

/// A solved word with its induced trajectories. Trailing skips are implicit:
/// `word` is the prefix before the first skip.
#[derive(Debug, Clone)]
pub struct Solution {
    pub word: Vec<SolverInput>,
    /// Visited places, `word.len() + 1` entries.
    pub states: Vec<PlaceName>,
    /// Per port, the status at each position of `states`.
    pub trajectories: IndexMap<PortName, Vec<PortStatus>>,
    pub cost: u64,
}

/// One change point of a compressed port trajectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrajectoryPoint {
    pub status: PortStatus,
    /// The behavior whose execution caused the change; `None` for the
    /// initial point.
    pub cause: Option<BehaviorName>,
}

/// Compress a port trajectory to its change points, each tagged with the
/// input that caused the change.
pub fn compress_trajectory(statuses: &[PortStatus], word: &[SolverInput]) -> Vec<TrajectoryPoint> {
    let mut points = Vec::new();
    let Some(first) = statuses.first() else {
        return points;
    };
    points.push(TrajectoryPoint { status: *first, cause: None });
    let mut current = *first;
    for (i, status) in statuses.iter().enumerate().skip(1) {
        if *status != current {
            let cause = match word.get(i - 1) {
                Some(SolverInput::Behavior(b)) => Some(b.clone()),
                // Waits are self-loops: they never change a status.
                _ => None,
            };
            points.push(TrajectoryPoint { status: *status, cause });
            current = *status;
        }
    }
    points
}

/// The per-instance model: automaton, port projections, and accumulated
/// goals.
#[derive(Debug)]
pub struct ComponentModel {
    component: ComponentId,
    ty: Arc<ComponentType>,
    active: PlaceName,
    automaton: LifecycleAutomaton,
    /// Per port, the reduced states on which it is enabled.
    projections: IndexMap<PortName, HashSet<usize>>,
    goals: IndexSet<ReconfigurationGoal>,
    word_length: Option<usize>,
}

impl ComponentModel {
    pub fn new(
        component: impl Into<ComponentId>,
        ty: Arc<ComponentType>,
        active: impl Into<PlaceName>,
        word_length: Option<usize>,
    ) -> Result<Self, GoalError> {
        let component = component.into();
        let active = active.into();
        if !ty.has_place(&active) {
            return Err(GoalError::UnknownPlace { component, place: active });
        }
        let seeds = IndexSet::from([active.clone()]);
        let (automaton, projections) = Self::build(&ty, &seeds);
        Ok(Self { component, ty, active, automaton, projections, goals: IndexSet::new(), word_length })
    }

    pub fn component(&self) -> &ComponentId {
        &self.component
    }

    pub fn automaton(&self) -> &LifecycleAutomaton {
        &self.automaton
    }

    pub fn goals(&self) -> impl Iterator<Item = &ReconfigurationGoal> {
        self.goals.iter()
    }

    pub fn has_goals(&self) -> bool {
        !self.goals.is_empty()
    }

    /// Effective word-length bound.
    pub fn word_length(&self) -> usize {
        self.word_length
            .unwrap_or_else(|| self.automaton.inputs().len() * self.automaton.states().len())
            .max(1)
    }

    /// Add a goal, validating it against the type. Goals accumulate
    /// monotonically and deduplicate structurally.
    pub fn add_goal(&mut self, goal: ReconfigurationGoal) -> Result<(), GoalError> {
        match &goal {
            ReconfigurationGoal::Behavior { behavior, .. } => {
                if self.ty.behavior(behavior).is_none() {
                    return Err(GoalError::UnknownBehavior {
                        component: self.component.clone(),
                        behavior: behavior.clone(),
                    });
                }
            }
            ReconfigurationGoal::State { place, .. } => {
                if !self.ty.has_place(place) {
                    return Err(GoalError::UnknownPlace {
                        component: self.component.clone(),
                        place: place.clone(),
                    });
                }
            }
            ReconfigurationGoal::Port { port, .. } => {
                if self.ty.port(port).is_none() {
                    return Err(GoalError::UnknownPort {
                        component: self.component.clone(),
                        port: port.clone(),
                    });
                }
            }
        }
        let needs_seed = matches!(
            &goal,
            ReconfigurationGoal::State { place, .. } if self.automaton.state_index(place).is_none()
        );
        self.goals.insert(goal);
        if needs_seed {
            // A goal place that vanished in reduction must become a state.
            self.rebuild();
        }
        Ok(())
    }

    /// Inference mode: received constraints contribute plain port goals only.
    pub fn solve_inference(&self, constraints: &[PortConstraint]) -> Result<Solution, SolveError> {
        self.solve(constraints, false)
    }

    /// Plan mode: until-constraints additionally synthesize wait inputs.
    pub fn solve_plan(&self, constraints: &[PortConstraint]) -> Result<Solution, SolveError> {
        self.solve(constraints, true)
    }

    fn rebuild(&mut self) {
        let mut seeds: IndexSet<PlaceName> = IndexSet::from([self.active.clone()]);
        for goal in &self.goals {
            if let ReconfigurationGoal::State { place, .. } = goal {
                seeds.insert(place.clone());
            }
        }
        let (automaton, projections) = Self::build(&self.ty, &seeds);
        self.automaton = automaton;
        self.projections = projections;
    }

    fn build(
        ty: &ComponentType,
        seeds: &IndexSet<PlaceName>,
    ) -> (LifecycleAutomaton, IndexMap<PortName, HashSet<usize>>) {
        let automaton = LifecycleAutomaton::reduce_with_seeds(ty, seeds);
        let projections = ty
            .ports()
            .map(|port| {
                let enabled = automaton
                    .states()
                    .iter()
                    .enumerate()
                    .filter(|(_, place)| port.is_bound_to(place))
                    .map(|(i, _)| i)
                    .collect();
                (port.name().clone(), enabled)
            })
            .collect();
        (automaton, projections)
    }

    fn solve(&self, constraints: &[PortConstraint], with_waits: bool) -> Result<Solution, SolveError> {
        let port_enabled: Vec<HashSet<usize>> = self.projections.values().cloned().collect();
        let port_index = |name: &PortName| self.projections.get_index_of(name.as_str());

        let mut marks: Vec<Mark> = Vec::new();
        let mut finals = Finals::default();
        let mut infeasible_goal = false;

        for goal in &self.goals {
            match goal {
                ReconfigurationGoal::Behavior { behavior, final_ } => {
                    match self.automaton.input_index(behavior) {
                        Some(input) => {
                            marks.push(Mark::BehaviorDone(input));
                            if *final_ {
                                finals.behaviors.push(input);
                            }
                        }
                        // Declared but unreachable in the reduced automaton.
                        None => infeasible_goal = true,
                    }
                }
                ReconfigurationGoal::State { place, final_ } => {
                    match self.automaton.state_index(place) {
                        Some(state) => {
                            marks.push(Mark::StateVisited(state));
                            if *final_ {
                                finals.states.push(state);
                            }
                        }
                        None => infeasible_goal = true,
                    }
                }
                ReconfigurationGoal::Port { port, status, final_ } => match port_index(port) {
                    Some(p) => {
                        marks.push(Mark::PortSeen { port: p, enabled: status.is_enabled() });
                        if *final_ {
                            finals.ports.push((p, status.is_enabled()));
                        }
                    }
                    None => infeasible_goal = true,
                },
            }
        }

        let mut waits: Vec<WaitSpec> = Vec::new();
        let mut wait_inputs: Vec<WaitInput> = Vec::new();
        let mut seen_constraints: HashSet<&PortConstraint> = HashSet::new();
        for constraint in constraints {
            if !seen_constraints.insert(constraint) {
                continue;
            }
            let Some(p) = port_index(&constraint.port) else {
                // Constraints are translated through the reverse index before
                // they reach the model; an unknown port here is a stale view.
                tracing::warn!(
                    component = %self.component,
                    port = %constraint.port,
                    "ignoring constraint on unknown port"
                );
                continue;
            };
            marks.push(Mark::PortSeen { port: p, enabled: constraint.status.is_enabled() });
            if with_waits {
                if let Some(until) = &constraint.until {
                    let w = waits.len();
                    waits.push(WaitSpec { port: p, enabled: constraint.status.is_enabled() });
                    marks.push(Mark::WaitDone(w));
                    wait_inputs.push(WaitInput {
                        peer: constraint.source.clone(),
                        behavior: until.clone(),
                        port: constraint.port.clone(),
                        status: constraint.status,
                    });
                }
            }
        }

        if marks.len() > 64 {
            return Err(SolveError::TooManyGoals {
                component: self.component.clone(),
                count: marks.len(),
            });
        }

        let word_length = self.word_length();
        if infeasible_goal {
            return Err(self.infeasible(word_length, constraints));
        }

        let initial = self
            .automaton
            .state_index(&self.active)
            .ok_or_else(|| self.infeasible(word_length, constraints))?;

        let problem = Problem {
            automaton: &self.automaton,
            initial,
            word_length,
            port_enabled,
            marks,
            finals,
            waits,
        };

        tracing::debug!(
            component = %self.component,
            goals = self.goals.len(),
            constraints = constraints.len(),
            word_length,
            plan_mode = with_waits,
            "solving word problem"
        );

        let outcome =
            search::solve(&problem).ok_or_else(|| self.infeasible(word_length, constraints))?;

        let word = outcome
            .inputs
            .iter()
            .map(|step| match step {
                Step::Behavior(input) => SolverInput::Behavior(
                    self.automaton
                        .input_name(*input)
                        .cloned()
                        .unwrap_or_else(|| BehaviorName::new("")),
                ),
                Step::Wait(w) => SolverInput::Wait(
                    wait_inputs.get(*w).cloned().unwrap_or_else(|| WaitInput {
                        peer: ComponentId::new(""),
                        behavior: BehaviorName::new(""),
                        port: PortName::new(""),
                        status: PortStatus::Disabled,
                    }),
                ),
            })
            .collect();
        let states: Vec<PlaceName> = outcome
            .states
            .iter()
            .filter_map(|s| self.automaton.state_name(*s).cloned())
            .collect();
        let trajectories = self
            .projections
            .iter()
            .map(|(port, enabled)| {
                let statuses = outcome
                    .states
                    .iter()
                    .map(|s| PortStatus::of(enabled.contains(s)))
                    .collect();
                (port.clone(), statuses)
            })
            .collect();

        Ok(Solution { word, states, trajectories, cost: outcome.cost })
    }

    fn infeasible(&self, word_length: usize, constraints: &[PortConstraint]) -> SolveError {
        let goals = self
            .goals
            .iter()
            .map(ToString::to_string)
            .chain(constraints.iter().map(ToString::to_string))
            .collect();
        SolveError::Infeasible { component: self.component.clone(), word_length, goals }
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
