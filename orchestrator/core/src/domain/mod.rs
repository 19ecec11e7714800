// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Value types, aggregates and the persistence / coordination contracts the
//! application layer is written against.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Owns the data model; no I/O lives here

pub mod task;
pub mod frequency;
pub mod report;
pub mod output;
pub mod repository;
pub mod coordination;
pub mod dispatch;
pub mod node_config;
