// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Command execution port.
//!
//! A non-zero exit status is an ordinary [`CommandOutput`]; only failing to
//! start the process or capture its streams is an [`ExecutorError`].

use async_trait::async_trait;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn exit_failure(&self) -> bool {
        self.exit_code != Some(0)
    }
}

#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `command_line` to completion. The line is split on whitespace into
    /// program and arguments; no shell quoting is applied.
    async fn execute(&self, command_line: &str) -> Result<CommandOutput, ExecutorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("command is empty")]
    EmptyCommand,

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to capture output: {0}")]
    Capture(#[source] std::io::Error),
}
