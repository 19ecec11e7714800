// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod process;
pub mod coordinator_sink;

pub use coordinator_sink::CoordinatorReportSink;
pub use process::ProcessExecutor;
