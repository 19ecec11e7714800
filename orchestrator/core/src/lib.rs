// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `taskfleet-core`: Coordinator Core
//!
//! Distributes a recurring command across a fleet of agents and reconciles
//! their independent outputs into one finalized record per completion cycle.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain types, quorum aggregation protocol, persistence and
//!   the coordinator HTTP surface

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
