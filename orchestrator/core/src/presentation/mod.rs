// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`taskfleet-core`)
//!
//! HTTP surface of the coordinator. Handlers translate requests into
//! application service calls; no coordination logic lives here.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | Task creation, completion reports, latest output, health |

pub mod api;
