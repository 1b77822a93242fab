// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;

#[test]
fn defaults() {
    let config = PlannerConfig::default();
    assert_eq!(config.word_length, None);
    assert_eq!(config.poll_interval_ms, 10);
    assert_eq!(config.deadline_ms, None);
    assert_eq!(config.retry.attempts, 4);
}

#[test]
fn setters_chain() {
    let config =
        PlannerConfig::default().word_length(8usize).deadline_ms(5_000u64).poll_interval_ms(25);
    assert_eq!(config.word_length, Some(8));
    assert_eq!(config.deadline_ms, Some(5_000));
    assert_eq!(config.poll_interval_ms, 25);
}

#[test]
fn load_full_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
word_length = 12
poll_interval_ms = 5
deadline_ms = 30000

[retry]
attempts = 2
base_delay_ms = 10
"#
    )
    .unwrap();

    let config = PlannerConfig::load(file.path()).unwrap();
    assert_eq!(config.word_length, Some(12));
    assert_eq!(config.poll_interval_ms, 5);
    assert_eq!(config.deadline_ms, Some(30_000));
    assert_eq!(config.retry, RetryConfig { attempts: 2, base_delay_ms: 10 });
}

#[test]
fn load_partial_file_uses_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "poll_interval_ms = 1").unwrap();

    let config = PlannerConfig::load(file.path()).unwrap();
    assert_eq!(config.poll_interval_ms, 1);
    assert_eq!(config.word_length, None);
    assert_eq!(config.retry, RetryConfig::default());
}

#[test]
fn load_missing_file_is_io_error() {
    let err = PlannerConfig::load("/nonexistent/planner.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn load_malformed_file_is_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "word_length = \"many\"").unwrap();

    let err = PlannerConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn durations() {
    let config = PlannerConfig::default().deadline_ms(1_500u64);
    assert_eq!(config.poll_interval(), Duration::from_millis(10));
    assert_eq!(config.deadline(), Some(Duration::from_millis(1_500)));
    let retry = config.retry_policy();
    assert_eq!(retry.attempts, 4);
    assert_eq!(retry.base_delay, Duration::from_millis(50));
}
