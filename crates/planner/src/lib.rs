// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ens-planner: the decentralized reconfiguration planner.
//!
//! One planner node per component instance alternates rounds of
//! receive-infer-send until every goal-bearing instance has broadcast its
//! root-ack; each node then emits its local plan, and the merger fuses the
//! local plans into one schedule wrapped in the structural diff.

pub mod config;
mod events;
pub mod merge;
pub mod node;
pub mod resolve;

use ens_core::{AssemblyError, GoalError};
use ens_messaging::MessagingError;
use ens_solver::SolveError;
use thiserror::Error;

pub use config::{ConfigError, PlannerConfig, RetryConfig};
pub use merge::{merge_plans, MergeError};
pub use node::PlannerNode;
pub use resolve::{plan, promote_state_target, resolve};

/// Failures of a planning run.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
    #[error(transparent)]
    Goal(#[from] GoalError),
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error(transparent)]
    Messaging(#[from] MessagingError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error("planning deadline of {deadline_ms} ms elapsed")]
    PlanningTimedOut { deadline_ms: u64 },
    #[error("planner task failed: {reason}")]
    TaskFailed { reason: String },
}
