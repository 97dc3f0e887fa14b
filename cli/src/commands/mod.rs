// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod policy;
pub mod agent;
pub mod run;
pub mod history;
pub mod serve;

pub use policy::PolicyCommand;
pub use agent::AgentCommand;
