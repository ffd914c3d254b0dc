/*
 *  Copyright 2025 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Integration tests for the trigger store: creation defaults, validation,
//! FIFO pending queries, the compare-and-swap claim, and the failure /
//! retry / cancellation transitions.

use crate::fixtures::get_or_init_fixture;
use hermod::modules::payloads;
use hermod::{
    ClaimOutcome, ModuleName, NewTrigger, StoreError, TriggerRoute, TriggerStatus, UniversalUuid,
    ValidationError, DEFAULT_MAX_ATTEMPTS,
};
use serde_json::json;
use serial_test::serial;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

fn survey_trigger(tenant_id: UniversalUuid) -> NewTrigger {
    NewTrigger::new(
        tenant_id,
        ModuleName::Culture,
        ModuleName::Recognition,
        payloads::CULTURE_RECOGNITION,
        json!({
            "employee_id": UniversalUuid::new_v4(),
            "survey_id": "q3-pulse",
            "overall_score": 4.1,
        }),
    )
}

#[tokio::test]
#[serial]
async fn test_create_assigns_pending_defaults() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let tenant_id = UniversalUuid::new_v4();
    let created = dal
        .trigger()
        .create(survey_trigger(tenant_id))
        .await
        .expect("Failed to create trigger");

    assert_eq!(created.tenant_id, tenant_id);
    assert_eq!(created.source_module, ModuleName::Culture);
    assert_eq!(created.target_module, ModuleName::Recognition);
    assert_eq!(created.trigger_type, payloads::CULTURE_RECOGNITION);
    assert_eq!(created.status, TriggerStatus::Pending);
    assert_eq!(created.retry_count, 0);
    assert_eq!(created.max_retries, DEFAULT_MAX_ATTEMPTS);
    assert!(created.error_message.is_none());
    assert!(created.parent_trigger_id.is_none());
    assert!(created.claimed_at.is_none());
    assert!(created.processed_at.is_none());
    assert!(created.retry_at.is_none());

    let fetched = dal
        .trigger()
        .get_by_id(created.id)
        .await
        .expect("Failed to fetch trigger");
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.payload, created.payload);
}

#[tokio::test]
#[serial]
async fn test_create_rejects_nil_tenant() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let err = dal
        .trigger()
        .create(survey_trigger(UniversalUuid(uuid::Uuid::nil())))
        .await
        .expect_err("Nil tenant id should be rejected");

    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::MissingTenantId)
    ));
}

#[tokio::test]
#[serial]
async fn test_create_rejects_null_payload() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let new_trigger = NewTrigger::new(
        UniversalUuid::new_v4(),
        ModuleName::Culture,
        ModuleName::Recognition,
        payloads::CULTURE_RECOGNITION,
        json!(null),
    );
    let err = dal
        .trigger()
        .create(new_trigger)
        .await
        .expect_err("Null payload should be rejected");

    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::EmptyPayload)
    ));
}

#[tokio::test]
#[serial]
async fn test_get_by_id_unknown_trigger() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let missing = UniversalUuid::new_v4();
    let err = dal
        .trigger()
        .get_by_id(missing)
        .await
        .expect_err("Unknown trigger id should not resolve");

    assert!(matches!(err, StoreError::TriggerNotFound(id) if id == missing));
}

#[tokio::test]
#[serial]
async fn test_get_pending_returns_oldest_first() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let tenant_id = UniversalUuid::new_v4();
    let mut created_ids = Vec::new();
    for _ in 0..3 {
        let trigger = dal
            .trigger()
            .create(survey_trigger(tenant_id))
            .await
            .expect("Failed to create trigger");
        created_ids.push(trigger.id);
        // Space out creation times so FIFO ordering is unambiguous
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let pending = dal
        .trigger()
        .get_pending(tenant_id, ModuleName::Recognition, 10)
        .await
        .expect("Failed to fetch pending triggers");
    let pending_ids: Vec<UniversalUuid> = pending.iter().map(|t| t.id).collect();
    assert_eq!(pending_ids, created_ids);

    let limited = dal
        .trigger()
        .get_pending(tenant_id, ModuleName::Recognition, 2)
        .await
        .expect("Failed to fetch limited batch");
    let limited_ids: Vec<UniversalUuid> = limited.iter().map(|t| t.id).collect();
    assert_eq!(limited_ids, created_ids[..2]);
}

#[tokio::test]
#[serial]
async fn test_get_pending_scopes_by_tenant_and_module() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let tenant_a = UniversalUuid::new_v4();
    let tenant_b = UniversalUuid::new_v4();

    let for_a = dal
        .trigger()
        .create(survey_trigger(tenant_a))
        .await
        .expect("Failed to create trigger for tenant A");
    dal.trigger()
        .create(survey_trigger(tenant_b))
        .await
        .expect("Failed to create trigger for tenant B");
    dal.trigger()
        .create(NewTrigger::new(
            tenant_a,
            ModuleName::Culture,
            ModuleName::Engagement,
            payloads::CULTURE_ENGAGEMENT,
            json!({"employee_id": UniversalUuid::new_v4(), "survey_id": "q3-pulse", "overall_score": 2.8}),
        ))
        .await
        .expect("Failed to create engagement trigger");

    let pending = dal
        .trigger()
        .get_pending(tenant_a, ModuleName::Recognition, 10)
        .await
        .expect("Failed to fetch pending triggers");

    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, for_a.id);
}

#[tokio::test]
#[serial]
async fn test_claim_moves_pending_to_processing() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let trigger = dal
        .trigger()
        .create(survey_trigger(UniversalUuid::new_v4()))
        .await
        .expect("Failed to create trigger");

    let outcome = dal
        .trigger()
        .claim(trigger.id)
        .await
        .expect("Claim should not error");

    match outcome {
        ClaimOutcome::Claimed(claimed) => {
            assert_eq!(claimed.status, TriggerStatus::Processing);
            assert!(claimed.claimed_at.is_some());
        }
        ClaimOutcome::Conflict => panic!("First claim should win"),
    }

    // Claimed triggers are no longer claimable work
    let pending = dal
        .trigger()
        .get_pending(trigger.tenant_id, ModuleName::Recognition, 10)
        .await
        .expect("Failed to fetch pending triggers");
    assert!(pending.is_empty());
}

#[tokio::test]
#[serial]
async fn test_second_claim_conflicts() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let trigger = dal
        .trigger()
        .create(survey_trigger(UniversalUuid::new_v4()))
        .await
        .expect("Failed to create trigger");

    let first = dal.trigger().claim(trigger.id).await.expect("First claim");
    assert!(matches!(first, ClaimOutcome::Claimed(_)));

    let second = dal.trigger().claim(trigger.id).await.expect("Second claim");
    assert!(matches!(second, ClaimOutcome::Conflict));

    let missing = dal
        .trigger()
        .claim(UniversalUuid::new_v4())
        .await
        .expect_err("Claiming an unknown trigger should error");
    assert!(matches!(missing, StoreError::TriggerNotFound(_)));
}

#[tokio::test]
#[serial]
async fn test_concurrent_claims_have_single_winner() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = Arc::new(fixture.get_dal());

    let trigger = dal
        .trigger()
        .create(survey_trigger(UniversalUuid::new_v4()))
        .await
        .expect("Failed to create trigger");

    const CLAIMERS: usize = 8;
    let barrier = Arc::new(Barrier::new(CLAIMERS));
    let mut handles = Vec::with_capacity(CLAIMERS);
    for _ in 0..CLAIMERS {
        let dal = Arc::clone(&dal);
        let barrier = Arc::clone(&barrier);
        let trigger_id = trigger.id;
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            dal.trigger().claim(trigger_id).await
        }));
    }

    let mut wins = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.expect("Claim task panicked") {
            Ok(ClaimOutcome::Claimed(_)) => wins += 1,
            Ok(ClaimOutcome::Conflict) => conflicts += 1,
            Err(e) => panic!("Claim attempt errored: {}", e),
        }
    }

    assert_eq!(wins, 1, "Exactly one claimant should win the race");
    assert_eq!(conflicts, CLAIMERS - 1);
}

#[tokio::test]
#[serial]
async fn test_mark_completed_sets_terminal_state() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let trigger = dal
        .trigger()
        .create(survey_trigger(UniversalUuid::new_v4()))
        .await
        .expect("Failed to create trigger");
    dal.trigger().claim(trigger.id).await.expect("Claim failed");

    let completed = dal
        .trigger()
        .mark_completed(trigger.id)
        .await
        .expect("Failed to mark completed");

    assert_eq!(completed.status, TriggerStatus::Completed);
    assert!(completed.processed_at.is_some());
    assert!(completed.error_message.is_none());
}

#[tokio::test]
#[serial]
async fn test_mark_failed_records_error_and_retry_count() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let trigger = dal
        .trigger()
        .create(survey_trigger(UniversalUuid::new_v4()))
        .await
        .expect("Failed to create trigger");
    dal.trigger().claim(trigger.id).await.expect("Claim failed");

    let failed = dal
        .trigger()
        .mark_failed(trigger.id, "reasoning stage unavailable: socket closed")
        .await
        .expect("Failed to mark failed");

    assert_eq!(failed.status, TriggerStatus::Failed);
    assert_eq!(failed.retry_count, 1);
    assert!(failed.processed_at.is_some());
    let message = failed.error_message.expect("Error message should be set");
    assert!(message.contains("reasoning stage unavailable"));
}

#[tokio::test]
#[serial]
async fn test_schedule_retry_requeues_with_due_time() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let tenant_id = UniversalUuid::new_v4();
    let due_later = dal
        .trigger()
        .create(survey_trigger(tenant_id))
        .await
        .expect("Failed to create trigger");
    let due_now = dal
        .trigger()
        .create(survey_trigger(tenant_id))
        .await
        .expect("Failed to create trigger");

    for trigger in [&due_later, &due_now] {
        dal.trigger().claim(trigger.id).await.expect("Claim failed");
        dal.trigger()
            .mark_failed(trigger.id, "transient failure")
            .await
            .expect("Failed to mark failed");
    }

    // Wide margins so the assertion is insensitive to clock skew between
    // the test process and a PostgreSQL server
    let future = hermod::UniversalTimestamp(chrono::Utc::now() + chrono::Duration::seconds(60));
    let past = hermod::UniversalTimestamp(chrono::Utc::now() - chrono::Duration::seconds(60));

    let requeued = dal
        .trigger()
        .schedule_retry(due_later.id, future)
        .await
        .expect("Failed to schedule retry");
    assert_eq!(requeued.status, TriggerStatus::Pending);
    assert_eq!(requeued.retry_count, 1, "Retry count survives the requeue");
    assert!(requeued.retry_at.is_some());
    assert!(requeued.claimed_at.is_none());
    assert!(requeued.processed_at.is_none());

    dal.trigger()
        .schedule_retry(due_now.id, past)
        .await
        .expect("Failed to schedule retry");

    // Only the trigger whose retry time has passed is claimable work
    let pending = dal
        .trigger()
        .get_pending(tenant_id, ModuleName::Recognition, 10)
        .await
        .expect("Failed to fetch pending triggers");
    let pending_ids: Vec<UniversalUuid> = pending.iter().map(|t| t.id).collect();
    assert_eq!(pending_ids, vec![due_now.id]);

    // A requeued trigger goes around the loop again: claim, then complete
    let outcome = dal.trigger().claim(due_now.id).await.expect("Claim failed");
    assert!(matches!(outcome, ClaimOutcome::Claimed(_)));
    let completed = dal
        .trigger()
        .mark_completed(due_now.id)
        .await
        .expect("Failed to mark completed");
    assert_eq!(completed.status, TriggerStatus::Completed);
    assert!(
        completed.error_message.is_none(),
        "Success clears the error from the failed attempt"
    );
}

#[tokio::test]
#[serial]
async fn test_schedule_retry_ignores_non_failed_triggers() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let trigger = dal
        .trigger()
        .create(survey_trigger(UniversalUuid::new_v4()))
        .await
        .expect("Failed to create trigger");

    // Still pending; the guarded update must not touch it
    let unchanged = dal
        .trigger()
        .schedule_retry(
            trigger.id,
            hermod::UniversalTimestamp(chrono::Utc::now() - chrono::Duration::seconds(60)),
        )
        .await
        .expect("Schedule retry on a pending trigger should be a no-op");

    assert_eq!(unchanged.status, TriggerStatus::Pending);
    assert!(unchanged.retry_at.is_none());
}

#[tokio::test]
#[serial]
async fn test_cancel_pending_spares_processing_and_other_tenants() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let tenant_a = UniversalUuid::new_v4();
    let tenant_b = UniversalUuid::new_v4();

    dal.trigger()
        .create(survey_trigger(tenant_a))
        .await
        .expect("Failed to create trigger");
    dal.trigger()
        .create(survey_trigger(tenant_a))
        .await
        .expect("Failed to create trigger");
    let in_flight = dal
        .trigger()
        .create(survey_trigger(tenant_a))
        .await
        .expect("Failed to create trigger");
    dal.trigger()
        .claim(in_flight.id)
        .await
        .expect("Claim failed");
    dal.trigger()
        .create(survey_trigger(tenant_b))
        .await
        .expect("Failed to create trigger");

    let cancelled = dal
        .trigger()
        .cancel_pending_for_tenant(tenant_a)
        .await
        .expect("Cancellation failed");
    assert_eq!(cancelled, 2);

    let count = |tenant, status| {
        let dal = dal.clone();
        async move {
            dal.trigger()
                .count_by_status(tenant, status)
                .await
                .expect("Count failed")
        }
    };

    assert_eq!(count(tenant_a, TriggerStatus::Cancelled).await, 2);
    assert_eq!(count(tenant_a, TriggerStatus::Pending).await, 0);
    // The claimed trigger runs to completion regardless of the cancellation
    assert_eq!(count(tenant_a, TriggerStatus::Processing).await, 1);
    assert_eq!(count(tenant_b, TriggerStatus::Pending).await, 1);
}

#[tokio::test]
#[serial]
async fn test_pending_routes_lists_each_route_once() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let tenant_a = UniversalUuid::new_v4();
    let tenant_b = UniversalUuid::new_v4();

    dal.trigger()
        .create(survey_trigger(tenant_a))
        .await
        .expect("Failed to create trigger");
    dal.trigger()
        .create(survey_trigger(tenant_a))
        .await
        .expect("Failed to create trigger");
    dal.trigger()
        .create(NewTrigger::new(
            tenant_a,
            ModuleName::Culture,
            ModuleName::Engagement,
            payloads::CULTURE_ENGAGEMENT,
            json!({"employee_id": UniversalUuid::new_v4(), "survey_id": "q3-pulse", "overall_score": 3.0}),
        ))
        .await
        .expect("Failed to create trigger");
    dal.trigger()
        .create(survey_trigger(tenant_b))
        .await
        .expect("Failed to create trigger");

    let routes: HashSet<TriggerRoute> = dal
        .trigger()
        .pending_routes()
        .await
        .expect("Failed to fetch routes")
        .into_iter()
        .collect();

    let expected: HashSet<TriggerRoute> = [
        TriggerRoute {
            tenant_id: tenant_a,
            target_module: ModuleName::Recognition,
        },
        TriggerRoute {
            tenant_id: tenant_a,
            target_module: ModuleName::Engagement,
        },
        TriggerRoute {
            tenant_id: tenant_b,
            target_module: ModuleName::Recognition,
        },
    ]
    .into_iter()
    .collect();

    assert_eq!(routes, expected);
}

#[tokio::test]
#[serial]
async fn test_find_children_in_creation_order() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let tenant_id = UniversalUuid::new_v4();
    let parent = dal
        .trigger()
        .create(survey_trigger(tenant_id))
        .await
        .expect("Failed to create parent");

    let mut child_ids = Vec::new();
    for role in ["Data Engineer", "Analytics Lead"] {
        let child = dal
            .trigger()
            .create(
                NewTrigger::new(
                    tenant_id,
                    ModuleName::Hiring,
                    ModuleName::Skills,
                    payloads::ROLE_REQUIREMENTS_PROFILE,
                    json!({"requested_by": UniversalUuid::new_v4(), "role_title": role}),
                )
                .with_parent(parent.id),
            )
            .await
            .expect("Failed to create child");
        child_ids.push(child.id);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let children = dal
        .trigger()
        .find_children(parent.id)
        .await
        .expect("Failed to fetch children");
    let found_ids: Vec<UniversalUuid> = children.iter().map(|t| t.id).collect();
    assert_eq!(found_ids, child_ids);
    assert!(children
        .iter()
        .all(|child| child.parent_trigger_id == Some(parent.id)));

    let none = dal
        .trigger()
        .find_children(UniversalUuid::new_v4())
        .await
        .expect("Failed to fetch children");
    assert!(none.is_empty());
}

#[tokio::test]
#[serial]
async fn test_list_failed_newest_first() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let tenant_id = UniversalUuid::new_v4();
    let mut failed_ids = Vec::new();
    for _ in 0..2 {
        let trigger = dal
            .trigger()
            .create(survey_trigger(tenant_id))
            .await
            .expect("Failed to create trigger");
        dal.trigger().claim(trigger.id).await.expect("Claim failed");
        dal.trigger()
            .mark_failed(trigger.id, "handler exploded")
            .await
            .expect("Failed to mark failed");
        failed_ids.push(trigger.id);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let failed = dal
        .trigger()
        .list_failed(tenant_id, 10)
        .await
        .expect("Failed to list failed triggers");
    let listed: Vec<UniversalUuid> = failed.iter().map(|t| t.id).collect();
    assert_eq!(listed, vec![failed_ids[1], failed_ids[0]]);

    let limited = dal
        .trigger()
        .list_failed(tenant_id, 1)
        .await
        .expect("Failed to list failed triggers");
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].id, failed_ids[1]);
}
