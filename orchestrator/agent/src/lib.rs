// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `taskfleet-agent`: Execution Agent
//!
//! Runs every scheduled task on its own cadence and reports each result to
//! the coordinator.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `CommandExecutor` and `ReportSink` ports, `CommandOutput` |
//! | [`application`] | Application | `AgentScheduler` registry, `CompletionReporter` loop |
//! | [`infrastructure`] | Infrastructure | `ProcessExecutor`, `CoordinatorReportSink` |
//! | [`presentation`] | HTTP (Axum) | `POST /api/v1/tasks/schedule`, `GET /health` |
//!
//! ## Data Flow
//!
//! schedule request → `AgentScheduler` spawns one loop per task → each tick
//! runs the executor → result is queued → the single reporter loop delivers
//! it. Scheduling loops never perform network I/O.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
