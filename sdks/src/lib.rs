// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! taskfleet Rust SDK
//!
//! Typed HTTP clients for the coordinator (`TaskfleetClient`) and for agents
//! (`AgentClient`).

pub mod client;
pub mod types;

pub use client::{AgentClient, ClientError, TaskfleetClient};
pub use types::*;
