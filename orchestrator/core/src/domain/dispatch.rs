// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Outbound port used by fan-out to push a [`ScheduleInstruction`] to one agent.

use async_trait::async_trait;

use crate::domain::task::ScheduleInstruction;

#[async_trait]
pub trait ScheduleDispatcher: Send + Sync {
    /// Deliver the instruction to the agent at `agent` (base URL). Success means
    /// the agent acknowledged it.
    async fn dispatch(&self, agent: &str, instruction: &ScheduleInstruction) -> Result<(), DispatchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("agent unreachable: {0}")]
    Transport(String),

    #[error("agent rejected schedule with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("schedule call timed out")]
    Timeout,
}
