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

//! Integration tests for the analysis result store: validation, the
//! watermark-scoped latest query, and the trigger idempotency probe.

use crate::fixtures::get_or_init_fixture;
use hermod::{
    ModuleName, NewAnalysisResult, StoreError, UniversalTimestamp, UniversalUuid, ValidationError,
};
use serial_test::serial;
use std::time::Duration;

#[tokio::test]
#[serial]
async fn test_create_and_roundtrip_fields() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let tenant_id = UniversalUuid::new_v4();
    let employee_id = UniversalUuid::new_v4();
    let trigger_id = UniversalUuid::new_v4();

    let created = dal
        .analysis_result()
        .create(
            NewAnalysisResult::new(
                tenant_id,
                employee_id,
                ModuleName::Recognition,
                "Recognition gap detected",
            )
            .with_insights(vec![
                "no peer recognition in 90 days".to_string(),
                "scores trending down".to_string(),
            ])
            .with_recommendations(vec!["nominate for spot award".to_string()])
            .with_confidence(0.85)
            .with_triggered_by(trigger_id),
        )
        .await
        .expect("Failed to create analysis result");

    assert_eq!(created.tenant_id, tenant_id);
    assert_eq!(created.employee_id, employee_id);
    assert_eq!(created.module, ModuleName::Recognition);
    assert_eq!(created.triggered_by, Some(trigger_id));
    assert_eq!(created.summary, "Recognition gap detected");
    assert_eq!(created.insights.len(), 2);
    assert_eq!(created.insights[0], "no peer recognition in 90 days");
    assert_eq!(created.recommendations, vec!["nominate for spot award"]);
    assert!((created.confidence - 0.85).abs() < f64::EPSILON);
}

#[tokio::test]
#[serial]
async fn test_create_rejects_nil_ids() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let nil = UniversalUuid(uuid::Uuid::nil());

    let err = dal
        .analysis_result()
        .create(NewAnalysisResult::new(
            nil,
            UniversalUuid::new_v4(),
            ModuleName::Culture,
            "summary",
        ))
        .await
        .expect_err("Nil tenant id should be rejected");
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::MissingTenantId)
    ));

    let err = dal
        .analysis_result()
        .create(NewAnalysisResult::new(
            UniversalUuid::new_v4(),
            nil,
            ModuleName::Culture,
            "summary",
        ))
        .await
        .expect_err("Nil employee id should be rejected");
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::MissingEmployeeId)
    ));
}

#[tokio::test]
#[serial]
async fn test_latest_for_module_picks_newest() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let tenant_id = UniversalUuid::new_v4();
    let employee_id = UniversalUuid::new_v4();

    dal.analysis_result()
        .create(NewAnalysisResult::new(
            tenant_id,
            employee_id,
            ModuleName::Engagement,
            "first pass",
        ))
        .await
        .expect("Failed to create result");
    tokio::time::sleep(Duration::from_millis(5)).await;
    let newest = dal
        .analysis_result()
        .create(NewAnalysisResult::new(
            tenant_id,
            employee_id,
            ModuleName::Engagement,
            "second pass",
        ))
        .await
        .expect("Failed to create result");

    let latest = dal
        .analysis_result()
        .latest_for_module(tenant_id, employee_id, ModuleName::Engagement, None)
        .await
        .expect("Query failed")
        .expect("A result should exist");
    assert_eq!(latest.id, newest.id);
    assert_eq!(latest.summary, "second pass");

    // Other modules and other tenants see nothing
    let other_module = dal
        .analysis_result()
        .latest_for_module(tenant_id, employee_id, ModuleName::Skills, None)
        .await
        .expect("Query failed");
    assert!(other_module.is_none());

    let other_tenant = dal
        .analysis_result()
        .latest_for_module(
            UniversalUuid::new_v4(),
            employee_id,
            ModuleName::Engagement,
            None,
        )
        .await
        .expect("Query failed");
    assert!(other_tenant.is_none());
}

#[tokio::test]
#[serial]
async fn test_latest_respects_since_watermark() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let tenant_id = UniversalUuid::new_v4();
    let employee_id = UniversalUuid::new_v4();

    let stale = dal
        .analysis_result()
        .create(NewAnalysisResult::new(
            tenant_id,
            employee_id,
            ModuleName::Culture,
            "stale analysis",
        ))
        .await
        .expect("Failed to create result");

    // A watermark at the stale row's timestamp excludes it: since is strict
    let watermark = Some(stale.created_at);
    let behind_watermark = dal
        .analysis_result()
        .latest_for_module(tenant_id, employee_id, ModuleName::Culture, watermark)
        .await
        .expect("Query failed");
    assert!(behind_watermark.is_none());

    tokio::time::sleep(Duration::from_millis(5)).await;
    let fresh = dal
        .analysis_result()
        .create(NewAnalysisResult::new(
            tenant_id,
            employee_id,
            ModuleName::Culture,
            "fresh analysis",
        ))
        .await
        .expect("Failed to create result");

    let found = dal
        .analysis_result()
        .latest_for_module(tenant_id, employee_id, ModuleName::Culture, watermark)
        .await
        .expect("Query failed")
        .expect("The fresh result should clear the watermark");
    assert_eq!(found.id, fresh.id);
}

#[tokio::test]
#[serial]
async fn test_exists_for_trigger_scoped_by_module() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let trigger_id = UniversalUuid::new_v4();
    dal.analysis_result()
        .create(
            NewAnalysisResult::new(
                UniversalUuid::new_v4(),
                UniversalUuid::new_v4(),
                ModuleName::Recognition,
                "already recorded",
            )
            .with_triggered_by(trigger_id),
        )
        .await
        .expect("Failed to create result");

    assert!(dal
        .analysis_result()
        .exists_for_trigger(trigger_id, ModuleName::Recognition)
        .await
        .expect("Probe failed"));
    assert!(!dal
        .analysis_result()
        .exists_for_trigger(trigger_id, ModuleName::Engagement)
        .await
        .expect("Probe failed"));
    assert!(!dal
        .analysis_result()
        .exists_for_trigger(UniversalUuid::new_v4(), ModuleName::Recognition)
        .await
        .expect("Probe failed"));
}

#[tokio::test]
#[serial]
async fn test_list_for_employee_newest_first_with_limit() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let tenant_id = UniversalUuid::new_v4();
    let employee_id = UniversalUuid::new_v4();

    let mut created_ids = Vec::new();
    for (module, summary) in [
        (ModuleName::Recognition, "recognition analysis"),
        (ModuleName::Engagement, "engagement analysis"),
        (ModuleName::Skills, "skills analysis"),
    ] {
        let result = dal
            .analysis_result()
            .create(NewAnalysisResult::new(
                tenant_id,
                employee_id,
                module,
                summary,
            ))
            .await
            .expect("Failed to create result");
        created_ids.push(result.id);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    // A different employee's result must not leak into the listing
    dal.analysis_result()
        .create(NewAnalysisResult::new(
            tenant_id,
            UniversalUuid::new_v4(),
            ModuleName::Recognition,
            "someone else",
        ))
        .await
        .expect("Failed to create result");

    let listed = dal
        .analysis_result()
        .list_for_employee(tenant_id, employee_id, 10)
        .await
        .expect("Listing failed");
    let listed_ids: Vec<UniversalUuid> = listed.iter().map(|r| r.id).collect();
    assert_eq!(
        listed_ids,
        vec![created_ids[2], created_ids[1], created_ids[0]]
    );

    let limited = dal
        .analysis_result()
        .list_for_employee(tenant_id, employee_id, 2)
        .await
        .expect("Listing failed");
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].id, created_ids[2]);
}

// Watermarks in the aggregator come from current_timestamp(); make sure the
// helper and the stored created_at agree on ordering.
#[tokio::test]
#[serial]
async fn test_current_timestamp_orders_against_stored_rows() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let tenant_id = UniversalUuid::new_v4();
    let employee_id = UniversalUuid::new_v4();

    let before: UniversalTimestamp = hermod::current_timestamp();
    tokio::time::sleep(Duration::from_millis(5)).await;
    dal.analysis_result()
        .create(NewAnalysisResult::new(
            tenant_id,
            employee_id,
            ModuleName::Performance,
            "cycle inputs",
        ))
        .await
        .expect("Failed to create result");

    let found = dal
        .analysis_result()
        .latest_for_module(tenant_id, employee_id, ModuleName::Performance, Some(before))
        .await
        .expect("Query failed");
    assert!(
        found.is_some(),
        "A result created after the watermark should be visible"
    );
}
