// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod executor;
pub mod reporting;

pub use executor::{CommandExecutor, CommandOutput, ExecutorError};
pub use reporting::{ReportDeliveryError, ReportSink};
