// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Local process executor backed by `tokio::process`.
//!
//! Output is captured through pipes into buffers owned by one invocation.
//! The child is killed if the future is dropped mid-run, so a shutdown or a
//! cancelled tick never leaves an orphaned process behind.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use crate::domain::executor::{CommandExecutor, CommandOutput, ExecutorError};

#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, command_line: &str) -> Result<CommandOutput, ExecutorError> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next().ok_or(ExecutorError::EmptyCommand)?;

        let child = Command::new(program)
            .args(parts)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecutorError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let output = child
            .wait_with_output()
            .await
            .map_err(ExecutorError::Capture)?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}
