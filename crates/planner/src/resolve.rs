// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The resolve driver.
//!
//! Spawns one planner-node task per local instance, lets them exchange
//! constraints until every goal-bearing instance has broadcast its root-ack,
//! then collects the local plans. [`plan`] additionally merges them and
//! wraps the result in the structural diff.

use crate::config::PlannerConfig;
use crate::merge::merge_plans;
use crate::node::PlannerNode;
use crate::PlanError;
use ens_core::{
    diff_assembly, Assembly, AssemblySkeleton, ComponentId, ComponentInstance, GoalError,
    Instruction, Plan, PlaceName, ReconfigurationGoal, StateTarget,
};
use ens_messaging::Messaging;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Promote a boundary state target to a final state goal against a concrete
/// instance.
pub fn promote_state_target(
    instance: &ComponentInstance,
    active: &PlaceName,
    target: &StateTarget,
) -> Result<ReconfigurationGoal, GoalError> {
    let ty = instance.component_type();
    let place = match target {
        StateTarget::Start => active.clone(),
        StateTarget::Initial => ty.initial_place().clone(),
        StateTarget::Running => ty
            .running_place()
            .cloned()
            .ok_or_else(|| GoalError::NoRunningPlace { component: instance.id().clone() })?,
        StateTarget::Place(name) => {
            if !ty.has_place(name) {
                return Err(GoalError::UnknownPlace {
                    component: instance.id().clone(),
                    place: name.clone(),
                });
            }
            name.clone()
        }
    };
    Ok(ReconfigurationGoal::state(place, true))
}

/// Run the coordination protocol for every instance of the local assembly
/// and return the per-instance plans, in assembly order.
///
/// The goal maps may name instances hosted elsewhere; those count toward the
/// quiescence condition but get no local node.
pub async fn resolve(
    assembly: &Assembly,
    goals: &IndexMap<ComponentId, Vec<ReconfigurationGoal>>,
    state_targets: &IndexMap<ComponentId, StateTarget>,
    messaging: Arc<dyn Messaging>,
    config: &PlannerConfig,
) -> Result<IndexMap<ComponentId, Plan>, PlanError> {
    let mut goal_bearing: IndexSet<ComponentId> = IndexSet::new();
    for (id, instance_goals) in goals {
        if !instance_goals.is_empty() {
            goal_bearing.insert(id.clone());
        }
    }
    goal_bearing.extend(state_targets.keys().cloned());
    let goal_bearing: Arc<HashSet<ComponentId>> =
        Arc::new(goal_bearing.into_iter().collect());

    let mut nodes = Vec::new();
    for instance in assembly.instances() {
        let id = instance.id();
        let active = assembly
            .active_place(id)
            .ok_or_else(|| GoalError::UnknownInstance { component: id.clone() })?;
        let mut node = PlannerNode::new(instance, active, config.word_length)?;
        if let Some(instance_goals) = goals.get(id) {
            for goal in instance_goals {
                node.add_goal(goal.clone())?;
            }
        }
        if let Some(target) = state_targets.get(id) {
            node.add_goal(promote_state_target(instance, active, target)?)?;
        }
        nodes.push(node);
    }

    let mut tasks: JoinSet<Result<(ComponentId, Plan), PlanError>> = JoinSet::new();
    for mut node in nodes {
        let messaging = Arc::clone(&messaging);
        let goal_bearing = Arc::clone(&goal_bearing);
        let poll_interval = config.poll_interval();
        tasks.spawn(async move {
            loop {
                node.step(messaging.as_ref()).await?;
                let acks = messaging.global_acks().await?;
                if goal_bearing.iter().all(|id| acks.contains(id)) {
                    break;
                }
                tokio::time::sleep(poll_interval).await;
            }
            tracing::debug!(component = %node.id(), round = node.round(), "node quiescent");
            let plan = node.final_plan()?;
            Ok((node.id().clone(), plan))
        });
    }

    let collect = async {
        let mut plans: IndexMap<ComponentId, Plan> = IndexMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (id, plan) =
                joined.map_err(|e| PlanError::TaskFailed { reason: e.to_string() })??;
            plans.insert(id, plan);
        }
        Ok::<_, PlanError>(plans)
    };
    let mut plans = match config.deadline() {
        Some(deadline) => {
            let deadline_ms = deadline.as_millis() as u64;
            tokio::time::timeout(deadline, collect)
                .await
                .map_err(|_| PlanError::PlanningTimedOut { deadline_ms })??
        }
        None => collect.await?,
    };

    // Tasks finish in arbitrary order; hand the plans back in assembly order.
    let mut ordered = IndexMap::new();
    for id in assembly.ids() {
        if let Some(plan) = plans.shift_remove(id) {
            ordered.insert(id.clone(), plan);
        }
    }
    Ok(ordered)
}

/// Full pipeline: resolve, merge, and wrap in the structural diff between
/// the current assembly and the target skeleton.
pub async fn plan(
    assembly: &Assembly,
    target: &AssemblySkeleton,
    goals: &IndexMap<ComponentId, Vec<ReconfigurationGoal>>,
    state_targets: &IndexMap<ComponentId, StateTarget>,
    messaging: Arc<dyn Messaging>,
    config: &PlannerConfig,
) -> Result<Plan, PlanError> {
    let plans = resolve(assembly, goals, state_targets, messaging, config).await?;
    let merged = merge_plans(plans.values())?;
    let diff = diff_assembly(&assembly.skeleton(), target);

    let mut instructions: Vec<Instruction> = diff.prologue().cloned().collect();
    instructions.extend(merged.instructions().iter().cloned());
    instructions.extend(diff.epilogue().cloned());
    Ok(Plan::new("final", instructions))
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
