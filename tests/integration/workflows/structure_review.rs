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

//! Integration tests for the structure review workflow: only a sufficiently
//! urgent add-position recommendation reaches hiring.

use serial_test::serial;

use crate::fixtures::get_or_init_fixture;
use hermod::modules::payloads::{self, PositionGap};
use hermod::workflows::structure::{
    self, RecommendationKind, RecommendationPriority, StructureRecommendation,
};
use hermod::{ModuleName, TriggerStatus, UniversalUuid};

fn recommendation(
    kind: RecommendationKind,
    priority: RecommendationPriority,
) -> StructureRecommendation {
    StructureRecommendation {
        tenant_id: UniversalUuid::new_v4(),
        requested_by: UniversalUuid::new_v4(),
        department: "Data Platform".to_string(),
        role_title: "Data Engineer".to_string(),
        kind,
        priority,
    }
}

#[tokio::test]
#[serial]
async fn test_high_priority_add_position_escalates_to_hiring() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let rec = recommendation(RecommendationKind::AddPosition, RecommendationPriority::High);
    let trigger = structure::handle_recommendation(&dal, &rec)
        .await
        .expect("Workflow failed")
        .expect("High priority add-position should escalate");

    assert_eq!(trigger.tenant_id, rec.tenant_id);
    assert_eq!(trigger.source_module, ModuleName::Structure);
    assert_eq!(trigger.target_module, ModuleName::Hiring);
    assert_eq!(trigger.trigger_type, payloads::POSITION_GAP_IDENTIFIED);

    let gap: PositionGap =
        serde_json::from_value(trigger.payload.clone()).expect("Payload should parse");
    assert_eq!(gap.requested_by, rec.requested_by);
    assert_eq!(gap.department, "Data Platform");
    assert_eq!(gap.role_title, "Data Engineer");
    assert_eq!(gap.priority, RecommendationPriority::High);

    assert_eq!(
        dal.trigger()
            .count_by_status(rec.tenant_id, TriggerStatus::Pending)
            .await
            .expect("Count failed"),
        1
    );
}

#[tokio::test]
#[serial]
async fn test_low_priority_add_position_stays_internal() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let rec = recommendation(RecommendationKind::AddPosition, RecommendationPriority::Low);
    let outcome = structure::handle_recommendation(&dal, &rec)
        .await
        .expect("Workflow failed");

    assert!(outcome.is_none());
    assert_eq!(
        dal.trigger()
            .count_by_status(rec.tenant_id, TriggerStatus::Pending)
            .await
            .expect("Count failed"),
        0
    );
}

#[tokio::test]
#[serial]
async fn test_non_add_recommendations_never_escalate() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    // Urgency alone is not enough; the kind gates the escalation
    for kind in [
        RecommendationKind::RemovePosition,
        RecommendationKind::Reassign,
        RecommendationKind::MergeTeams,
    ] {
        let rec = recommendation(kind, RecommendationPriority::Critical);
        let outcome = structure::handle_recommendation(&dal, &rec)
            .await
            .expect("Workflow failed");
        assert!(outcome.is_none(), "{:?} must not reach hiring", kind);
        assert_eq!(
            dal.trigger()
                .count_by_status(rec.tenant_id, TriggerStatus::Pending)
                .await
                .expect("Count failed"),
            0
        );
    }
}
