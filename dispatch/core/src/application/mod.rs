// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod eligibility;
pub mod queue;
pub mod assigner;
pub mod engine;

pub use engine::{AssignmentEngine, CycleOutcome, EngineError};
