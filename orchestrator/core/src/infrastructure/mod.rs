// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod repositories;
pub mod coordination;
pub mod db;
pub mod http_dispatcher;

pub use http_dispatcher::HttpScheduleDispatcher;
