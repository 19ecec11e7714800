// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod lock;
pub mod completion;
pub mod task_service;
pub mod repository_factory;

// Re-export use cases for convenience
pub use completion::{AggregatorSettings, CompletionAggregator, CompletionOutcome};
pub use lock::{acquire_with_backoff, LockGuard, RetryPolicy};
pub use task_service::{FanOut, FanOutReport, TaskService, TaskServiceError};
