// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # AEGIS Dispatch Core
//!
//! Auto-assignment engine for customer-support work items: a periodic
//! control loop that matches unassigned tickets to online agents under
//! capacity and channel constraints, recording every decision in an
//! append-only audit trail.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain model, assignment algorithm, persistence, HTTP API

pub mod config;
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
