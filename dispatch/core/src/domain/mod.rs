// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer: aggregates and persistence contracts for the dispatch
//! engine. No I/O lives here; repositories are trait seams implemented in
//! `crate::infrastructure`.

pub mod agent;
pub mod work_item;
pub mod policy;
pub mod assignment;
pub mod schedule;
pub mod clock;
pub mod repository;
