// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the taskfleet CLI

pub mod agent;
pub mod config;
pub mod coordinator;
pub mod task;

pub use self::agent::AgentArgs;
pub use self::config::ConfigCommand;
pub use self::coordinator::CoordinatorArgs;
pub use self::task::TaskCommand;
