// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod scheduler;
pub mod reporter;

pub use reporter::{CompletionReporter, ReportQueue};
pub use scheduler::{AgentScheduler, ScheduleOutcome};
