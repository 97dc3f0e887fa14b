// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end assignment cycle tests against the in-memory backend.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use dispatch_core::application::AssignmentEngine;
use dispatch_core::domain::agent::{Agent, AgentId, Availability};
use dispatch_core::domain::assignment::AssignmentReason;
use dispatch_core::domain::clock::{Clock, FixedClock};
use dispatch_core::domain::policy::{AssignmentPolicy, PriorityOrder};
use dispatch_core::domain::repository::{
    AssignmentLogRepository, PolicyRepository, WorkItemRepository,
};
use dispatch_core::domain::schedule::WeeklySchedule;
use dispatch_core::domain::work_item::{
    Channel, Priority, WorkItem, WorkItemId, WorkItemStatus,
};
use dispatch_core::infrastructure::repositories::{
    InMemoryAgentDirectory, InMemoryBusinessHoursRepository, InMemoryPolicyRepository,
    InMemoryWorkItemStore,
};

struct Harness {
    engine: Arc<AssignmentEngine>,
    policy_repo: InMemoryPolicyRepository,
    directory: InMemoryAgentDirectory,
    store: InMemoryWorkItemStore,
}

fn default_policy() -> AssignmentPolicy {
    AssignmentPolicy::new(BTreeSet::from([Channel::from("email"), Channel::from("chat")]))
}

fn harness(policy: Option<AssignmentPolicy>, clock: Arc<dyn Clock>) -> Harness {
    let policy_repo = match policy {
        Some(policy) => InMemoryPolicyRepository::with_policy(policy),
        None => InMemoryPolicyRepository::new(),
    };
    let directory = InMemoryAgentDirectory::new();
    let store = InMemoryWorkItemStore::new();
    let hours = InMemoryBusinessHoursRepository::new(WeeklySchedule::weekdays_nine_to_five());

    let engine = Arc::new(AssignmentEngine::new(
        Arc::new(policy_repo.clone()),
        Arc::new(directory.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(hours),
        clock,
    ));
    Harness {
        engine,
        policy_repo,
        directory,
        store,
    }
}

fn default_harness(policy: AssignmentPolicy) -> Harness {
    harness(Some(policy), Arc::new(FixedClock(Utc::now())))
}

fn agent_with_id(n: u128, name: &str) -> Agent {
    let mut agent = Agent::new(name, Availability::Online);
    agent.id = AgentId(Uuid::from_u128(n));
    agent
}

fn item_with_id(n: u128, number: i64, channel: &str, priority: Priority) -> WorkItem {
    let mut item = WorkItem::new(number, Channel::from(channel), priority);
    item.id = WorkItemId(Uuid::from_u128(n));
    item
}

async fn seed_item(store: &InMemoryWorkItemStore, item: &WorkItem) {
    store.save(item).await.unwrap();
}

#[tokio::test]
async fn assigns_unassigned_items_to_idle_agents() {
    let h = default_harness(default_policy());
    h.directory.insert(agent_with_id(1, "alice"));

    let item = item_with_id(10, 1001, "email", Priority::Normal);
    seed_item(&h.store, &item).await;

    let outcome = h.engine.run_cycle().await.unwrap();

    assert_eq!(outcome.assigned, 1);
    assert_eq!(outcome.skipped, 0);
    assert_eq!(outcome.results[0].work_item_number, 1001);
    assert_eq!(outcome.results[0].reason, AssignmentReason::AutoRefill);

    let stored = h.store.find_by_id(item.id).await.unwrap().unwrap();
    assert_eq!(stored.assigned_agent_id, Some(AgentId(Uuid::from_u128(1))));
    assert_eq!(stored.status, WorkItemStatus::InProgress);
}

#[tokio::test]
async fn second_cycle_is_a_no_op() {
    let h = default_harness(default_policy());
    h.directory.insert(agent_with_id(1, "alice"));
    seed_item(&h.store, &item_with_id(10, 1001, "email", Priority::Normal)).await;

    let first = h.engine.run_cycle().await.unwrap();
    let second = h.engine.run_cycle().await.unwrap();

    assert_eq!(first.assigned, 1);
    assert_eq!(second.assigned, 0);
    assert_eq!(second.skipped, 0);

    let log = h.store.find_recent(50, 0).await.unwrap();
    assert_eq!(log.len(), 1);
}

#[tokio::test]
async fn spreads_work_across_agents_least_loaded_first() {
    let h = default_harness(default_policy());
    h.directory.insert(agent_with_id(1, "alice"));
    h.directory.insert(agent_with_id(2, "bob"));

    for n in 0..4 {
        seed_item(&h.store, &item_with_id(10 + n, 1000 + n as i64, "email", Priority::Normal))
            .await;
    }

    let outcome = h.engine.run_cycle().await.unwrap();
    assert_eq!(outcome.assigned, 4);

    let loads = h.store.count_open_by_agent().await.unwrap();
    assert_eq!(loads.get(&AgentId(Uuid::from_u128(1))), Some(&2));
    assert_eq!(loads.get(&AgentId(Uuid::from_u128(2))), Some(&2));
}

#[tokio::test]
async fn refill_precedes_capacity_fill() {
    // Alice sits below the refill threshold, Bob above it but under cap.
    // The single new item must top Alice up, tagged as a refill.
    let h = default_harness(default_policy());
    let alice = agent_with_id(1, "alice");
    let bob = agent_with_id(2, "bob");
    h.directory.insert(alice.clone());
    h.directory.insert(bob.clone());

    for n in 0..3 {
        let mut held = item_with_id(100 + n, 2000 + n as i64, "email", Priority::Normal);
        held.assigned_agent_id = Some(bob.id);
        held.status = WorkItemStatus::InProgress;
        seed_item(&h.store, &held).await;
    }
    let mut held = item_with_id(110, 2010, "email", Priority::Normal);
    held.assigned_agent_id = Some(alice.id);
    held.status = WorkItemStatus::InProgress;
    seed_item(&h.store, &held).await;

    seed_item(&h.store, &item_with_id(10, 1001, "email", Priority::Normal)).await;

    let outcome = h.engine.run_cycle().await.unwrap();

    assert_eq!(outcome.assigned, 1);
    assert_eq!(outcome.results[0].agent_id, alice.id);
    assert_eq!(outcome.results[0].reason, AssignmentReason::AutoRefill);
}

#[tokio::test]
async fn never_exceeds_effective_max() {
    let mut policy = default_policy();
    policy.max_assigned_tickets = 2;
    policy.refill_threshold = 1;
    let h = default_harness(policy);

    let mut capped = agent_with_id(1, "capped");
    capped.auto_assign_max = Some(1);
    h.directory.insert(capped);
    h.directory.insert(agent_with_id(2, "normal"));

    for n in 0..5 {
        seed_item(&h.store, &item_with_id(10 + n, 1000 + n as i64, "email", Priority::Normal))
            .await;
    }

    let outcome = h.engine.run_cycle().await.unwrap();

    // 1 (override cap) + 2 (policy cap) assignable, 2 left over.
    assert_eq!(outcome.assigned, 3);
    assert_eq!(outcome.skipped, 2);

    let loads = h.store.count_open_by_agent().await.unwrap();
    assert_eq!(loads.get(&AgentId(Uuid::from_u128(1))), Some(&1));
    assert_eq!(loads.get(&AgentId(Uuid::from_u128(2))), Some(&2));
}

#[tokio::test]
async fn override_above_policy_max_is_clamped_to_it() {
    let mut policy = default_policy();
    policy.max_assigned_tickets = 2;
    policy.refill_threshold = 1;
    let h = default_harness(policy);
    let mut raised = agent_with_id(1, "raised");
    raised.auto_assign_max = Some(10);
    h.directory.insert(raised);

    for n in 0..5 {
        seed_item(&h.store, &item_with_id(10 + n, 1000 + n as i64, "email", Priority::Normal))
            .await;
    }

    let outcome = h.engine.run_cycle().await.unwrap();

    assert_eq!(outcome.assigned, 2);
    assert_eq!(outcome.skipped, 3);
    let loads = h.store.count_open_by_agent().await.unwrap();
    assert_eq!(loads.get(&AgentId(Uuid::from_u128(1))), Some(&2));
}

#[tokio::test]
async fn override_cap_below_refill_threshold_still_binds() {
    // Default policy: max 5, refill threshold 2. The override cap of 1
    // sits below the threshold and must stop the refill branch too.
    let h = default_harness(default_policy());
    let mut capped = agent_with_id(1, "capped");
    capped.auto_assign_max = Some(1);
    h.directory.insert(capped);

    seed_item(&h.store, &item_with_id(10, 1001, "email", Priority::Normal)).await;
    seed_item(&h.store, &item_with_id(11, 1002, "email", Priority::Normal)).await;

    let outcome = h.engine.run_cycle().await.unwrap();

    assert_eq!(outcome.assigned, 1);
    assert_eq!(outcome.skipped, 1);
    let loads = h.store.count_open_by_agent().await.unwrap();
    assert_eq!(loads.get(&AgentId(Uuid::from_u128(1))), Some(&1));
}

#[tokio::test]
async fn excludes_offline_away_and_opted_out_agents() {
    let h = default_harness(default_policy());
    let mut offline = agent_with_id(1, "offline");
    offline.availability = Availability::Offline;
    let mut away = agent_with_id(2, "away");
    away.availability = Availability::Away;
    let mut opted_out = agent_with_id(3, "opted-out");
    opted_out.auto_assign_enabled = false;
    h.directory.insert(offline);
    h.directory.insert(away);
    h.directory.insert(opted_out);

    seed_item(&h.store, &item_with_id(10, 1001, "email", Priority::Normal)).await;

    let outcome = h.engine.run_cycle().await.unwrap();
    assert_eq!(outcome.assigned, 0);
}

#[tokio::test]
async fn honors_per_agent_channel_override() {
    let h = default_harness(default_policy());
    let mut chat_only = agent_with_id(1, "chat-only");
    chat_only.auto_assign_channels = Some(BTreeSet::from([Channel::from("chat")]));
    h.directory.insert(chat_only);

    seed_item(&h.store, &item_with_id(10, 1001, "email", Priority::Normal)).await;
    seed_item(&h.store, &item_with_id(11, 1002, "chat", Priority::Normal)).await;

    let outcome = h.engine.run_cycle().await.unwrap();

    assert_eq!(outcome.assigned, 1);
    assert_eq!(outcome.results[0].work_item_number, 1002);
    assert_eq!(outcome.skipped, 1);
}

#[tokio::test]
async fn ignores_items_outside_policy_channels() {
    let h = default_harness(default_policy());
    h.directory.insert(agent_with_id(1, "alice"));

    seed_item(&h.store, &item_with_id(10, 1001, "phone", Priority::Critical)).await;

    let outcome = h.engine.run_cycle().await.unwrap();
    assert_eq!(outcome.assigned, 0);
    assert_eq!(outcome.skipped, 0);
}

#[tokio::test]
async fn priority_first_serves_critical_before_older_low() {
    let mut policy = default_policy();
    policy.max_assigned_tickets = 1;
    let h = default_harness(policy);
    h.directory.insert(agent_with_id(1, "alice"));

    let mut old_low = item_with_id(10, 1001, "email", Priority::Low);
    old_low.created_at = Utc::now() - Duration::hours(2);
    let fresh_critical = item_with_id(11, 1002, "email", Priority::Critical);
    seed_item(&h.store, &old_low).await;
    seed_item(&h.store, &fresh_critical).await;

    let outcome = h.engine.run_cycle().await.unwrap();

    assert_eq!(outcome.assigned, 1);
    assert_eq!(outcome.results[0].work_item_number, 1002);
}

#[tokio::test]
async fn fresh_critical_item_beats_a_backlog_larger_than_the_page() {
    // 60 older normal items exceed the per-cycle page; the newest item is
    // critical and must still be served first under priority_first.
    let mut policy = default_policy();
    policy.max_assigned_tickets = 1;
    let h = default_harness(policy);
    h.directory.insert(agent_with_id(1, "alice"));

    for n in 0..60u32 {
        let mut old_normal =
            item_with_id(100 + n as u128, 1000 + n as i64, "email", Priority::Normal);
        old_normal.created_at = Utc::now() - Duration::hours(24) + Duration::minutes(n as i64);
        seed_item(&h.store, &old_normal).await;
    }
    seed_item(&h.store, &item_with_id(10, 2001, "email", Priority::Critical)).await;

    let outcome = h.engine.run_cycle().await.unwrap();

    assert_eq!(outcome.assigned, 1);
    assert_eq!(outcome.results[0].work_item_number, 2001);
}

#[tokio::test]
async fn oldest_first_ignores_priority() {
    let mut policy = default_policy();
    policy.max_assigned_tickets = 1;
    policy.priority_order = PriorityOrder::OldestFirst;
    let h = default_harness(policy);
    h.directory.insert(agent_with_id(1, "alice"));

    let mut old_low = item_with_id(10, 1001, "email", Priority::Low);
    old_low.created_at = Utc::now() - Duration::hours(2);
    seed_item(&h.store, &old_low).await;
    seed_item(&h.store, &item_with_id(11, 1002, "email", Priority::Critical)).await;

    let outcome = h.engine.run_cycle().await.unwrap();

    assert_eq!(outcome.results[0].work_item_number, 1001);
}

#[tokio::test]
async fn equal_load_ties_break_by_agent_id() {
    let h = default_harness(default_policy());
    h.directory.insert(agent_with_id(7, "high-id"));
    h.directory.insert(agent_with_id(3, "low-id"));

    seed_item(&h.store, &item_with_id(10, 1001, "email", Priority::Normal)).await;

    let outcome = h.engine.run_cycle().await.unwrap();
    assert_eq!(outcome.results[0].agent_id, AgentId(Uuid::from_u128(3)));
}

#[tokio::test]
async fn identical_snapshots_produce_identical_decisions() {
    let decisions = |_: ()| async {
        let h = default_harness(default_policy());
        h.directory.insert(agent_with_id(2, "bob"));
        h.directory.insert(agent_with_id(1, "alice"));
        for n in 0..6 {
            let mut item = item_with_id(
                10 + n,
                1000 + n as i64,
                if n % 2 == 0 { "email" } else { "chat" },
                if n == 3 { Priority::Critical } else { Priority::Normal },
            );
            item.created_at = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, n as u32).unwrap();
            seed_item(&h.store, &item).await;
        }
        let outcome = h.engine.run_cycle().await.unwrap();
        outcome
            .results
            .iter()
            .map(|r| (r.work_item_number, r.agent_id))
            .collect::<Vec<_>>()
    };

    let first = decisions(()).await;
    let second = decisions(()).await;
    assert_eq!(first, second);
    assert_eq!(first.len(), 6);
}

#[tokio::test]
async fn no_policy_means_no_op_cycle() {
    let h = harness(None, Arc::new(FixedClock(Utc::now())));
    h.directory.insert(agent_with_id(1, "alice"));
    seed_item(&h.store, &item_with_id(10, 1001, "email", Priority::Normal)).await;

    let outcome = h.engine.run_cycle().await.unwrap();
    assert_eq!(outcome.assigned, 0);
    assert!(h.store.find_recent(50, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn disabled_policy_means_no_op_cycle() {
    let mut policy = default_policy();
    policy.enabled = false;
    let h = default_harness(policy);
    h.directory.insert(agent_with_id(1, "alice"));
    seed_item(&h.store, &item_with_id(10, 1001, "email", Priority::Normal)).await;

    let outcome = h.engine.run_cycle().await.unwrap();
    assert_eq!(outcome.assigned, 0);
}

#[tokio::test]
async fn business_hours_gate_blocks_weekend_cycles() {
    let mut policy = default_policy();
    policy.business_hours_only = true;

    // Saturday noon: weekdays-only schedule is closed.
    let saturday = Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap();
    let h = harness(Some(policy.clone()), Arc::new(FixedClock(saturday)));
    h.directory.insert(agent_with_id(1, "alice"));
    seed_item(&h.store, &item_with_id(10, 1001, "email", Priority::Normal)).await;

    let outcome = h.engine.run_cycle().await.unwrap();
    assert_eq!(outcome.assigned, 0);

    // Monday within the window: same snapshot assigns.
    let monday = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
    let h = harness(Some(policy), Arc::new(FixedClock(monday)));
    h.directory.insert(agent_with_id(1, "alice"));
    seed_item(&h.store, &item_with_id(10, 1001, "email", Priority::Normal)).await;

    let outcome = h.engine.run_cycle().await.unwrap();
    assert_eq!(outcome.assigned, 1);
}

#[tokio::test]
async fn assignment_touches_only_assignee_and_status() {
    let h = default_harness(default_policy());
    h.directory.insert(agent_with_id(1, "alice"));

    let mut before = item_with_id(10, 1001, "chat", Priority::High);
    before.created_at = Utc::now() - Duration::hours(3);
    seed_item(&h.store, &before).await;

    assert_eq!(h.engine.run_cycle().await.unwrap().assigned, 1);
    let after = h.store.find_by_id(before.id).await.unwrap().unwrap();

    assert_eq!(after.assigned_agent_id, Some(AgentId(Uuid::from_u128(1))));
    assert_eq!(after.status, WorkItemStatus::InProgress);
    // Everything else survives the assignment untouched.
    assert_eq!(after.id, before.id);
    assert_eq!(after.number, before.number);
    assert_eq!(after.channel, before.channel);
    assert_eq!(after.priority, before.priority);
    assert_eq!(after.created_at, before.created_at);
}

#[tokio::test]
async fn audit_log_matches_assignments_exactly() {
    let h = default_harness(default_policy());
    h.directory.insert(agent_with_id(1, "alice"));
    for n in 0..3 {
        seed_item(&h.store, &item_with_id(10 + n, 1000 + n as i64, "email", Priority::Normal))
            .await;
    }

    let outcome = h.engine.run_cycle().await.unwrap();
    let log = h.store.find_recent(50, 0).await.unwrap();

    assert_eq!(log.len(), outcome.assigned);
    for record in &log {
        let item = h
            .store
            .find_by_id(record.work_item_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.assigned_agent_id, Some(record.agent_id));
        assert_eq!(item.status, WorkItemStatus::InProgress);
    }
    // load_after values for a single agent form the sequence 1, 2, 3.
    let mut after: Vec<i32> = log.iter().map(|r| r.agent_load_after_assignment).collect();
    after.sort_unstable();
    assert_eq!(after, vec![1, 2, 3]);
}

#[tokio::test]
async fn overlapping_triggers_serialize_and_respect_caps() {
    let mut policy = default_policy();
    policy.max_assigned_tickets = 3;
    let h = default_harness(policy);
    h.directory.insert(agent_with_id(1, "alice"));
    for n in 0..10 {
        seed_item(&h.store, &item_with_id(10 + n, 1000 + n as i64, "email", Priority::Normal))
            .await;
    }

    let (a, b) = tokio::join!(h.engine.run_cycle(), h.engine.run_cycle());
    let total = a.unwrap().assigned + b.unwrap().assigned;

    // The run lock serializes the cycles; the second sees the first's
    // committed loads and assigns nothing beyond the cap.
    assert_eq!(total, 3);
    let loads = h.store.count_open_by_agent().await.unwrap();
    assert_eq!(loads.get(&AgentId(Uuid::from_u128(1))), Some(&3));
}

#[tokio::test]
async fn resolved_and_closed_items_free_capacity() {
    let mut policy = default_policy();
    policy.max_assigned_tickets = 1;
    policy.refill_threshold = 1;
    let h = default_harness(policy);
    let alice = agent_with_id(1, "alice");
    h.directory.insert(alice.clone());

    seed_item(&h.store, &item_with_id(10, 1001, "email", Priority::Normal)).await;
    assert_eq!(h.engine.run_cycle().await.unwrap().assigned, 1);

    // At cap: a new item is skipped.
    seed_item(&h.store, &item_with_id(11, 1002, "email", Priority::Normal)).await;
    assert_eq!(h.engine.run_cycle().await.unwrap().assigned, 0);

    // Resolving the first frees the slot; load is recounted, not cached.
    let mut resolved = h
        .store
        .find_by_id(WorkItemId(Uuid::from_u128(10)))
        .await
        .unwrap()
        .unwrap();
    resolved.status = WorkItemStatus::Resolved;
    h.store.save(&resolved).await.unwrap();

    let outcome = h.engine.run_cycle().await.unwrap();
    assert_eq!(outcome.assigned, 1);
    assert_eq!(outcome.results[0].work_item_number, 1002);
}

#[tokio::test]
async fn policy_version_is_recorded_fresh_each_cycle() {
    let h = default_harness(default_policy());
    let alice = agent_with_id(1, "alice");
    h.directory.insert(alice);
    seed_item(&h.store, &item_with_id(10, 1001, "email", Priority::Normal)).await;

    // Disable between seeding and running: the cycle must see the update.
    let mut disabled = h.policy_repo.find().await.unwrap().expect("policy seeded");
    disabled.enabled = false;
    disabled.version += 1;
    h.policy_repo.save(&disabled).await.unwrap();

    let outcome = h.engine.run_cycle().await.unwrap();
    assert_eq!(outcome.assigned, 0);
}
