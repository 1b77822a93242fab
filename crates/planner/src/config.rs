// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Planner configuration.

use ens_messaging::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Transport retry settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { attempts: 4, base_delay_ms: 50 }
    }
}

/// Tunables of a planning run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlannerConfig {
    /// Override of the solver's word-length bound (default:
    /// `|behaviors| * |states|` per instance).
    pub word_length: Option<usize>,
    /// Pause between protocol rounds while waiting for quiescence.
    pub poll_interval_ms: u64,
    /// Overall planning deadline; absent means no deadline.
    pub deadline_ms: Option<u64>,
    pub retry: RetryConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self { word_length: None, poll_interval_ms: 10, deadline_ms: None, retry: RetryConfig::default() }
    }
}

impl PlannerConfig {
    ens_core::setters! {
        value {
            poll_interval_ms: u64,
        }
        optional {
            word_length: usize,
            deadline_ms: u64,
        }
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry.attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
