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

//! Integration tests for the culture survey workflow: the fan-out trigger
//! pair and the combined report fan-in.

use serial_test::serial;
use std::time::Duration;

use crate::fixtures::get_or_init_fixture;
use hermod::modules::payloads::{self, SurveySignal};
use hermod::workflows::culture::{self, SurveyCompleted};
use hermod::{ModuleName, NewAnalysisResult, ResultAggregator, TriggerStatus, UniversalUuid};

#[tokio::test]
#[serial]
async fn test_survey_fans_out_to_recognition_and_engagement() {
    let fixture = get_or_init_fixture().await;
    let mut fixture = fixture
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    fixture.reset_database().await;
    fixture.initialize().await;
    let dal = fixture.get_dal();

    let event = SurveyCompleted {
        tenant_id: UniversalUuid::new_v4(),
        employee_id: UniversalUuid::new_v4(),
        survey_id: "q3-pulse".to_string(),
        overall_score: 2.4,
    };

    let triggers = culture::handle_survey_completed(&dal, &event)
        .await
        .expect("Fan-out failed");
    assert_eq!(triggers.len(), 2);

    let recognition = &triggers[0];
    assert_eq!(recognition.source_module, ModuleName::Culture);
    assert_eq!(recognition.target_module, ModuleName::Recognition);
    assert_eq!(recognition.trigger_type, payloads::CULTURE_RECOGNITION);

    let engagement = &triggers[1];
    assert_eq!(engagement.source_module, ModuleName::Culture);
    assert_eq!(engagement.target_module, ModuleName::Engagement);
    assert_eq!(engagement.trigger_type, payloads::CULTURE_ENGAGEMENT);

    // Both sides of the pair carry the same survey signal
    assert_eq!(recognition.payload, engagement.payload);
    let signal: SurveySignal =
        serde_json::from_value(recognition.payload.clone()).expect("Payload should parse");
    assert_eq!(signal.employee_id, event.employee_id);
    assert_eq!(signal.survey_id, "q3-pulse");
    assert!((signal.overall_score - 2.4).abs() < f64::EPSILON);

    assert_eq!(
        dal.trigger()
            .count_by_status(event.tenant_id, TriggerStatus::Pending)
            .await
            .expect("Count failed"),
        2
    );
}

#[tokio::test]
#[serial]
async fn test_combined_report_complete_when_both_sides_arrive() {
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
            ModuleName::Recognition,
            "recognition side",
        ))
        .await
        .expect("Failed to create result");
    dal.analysis_result()
        .create(NewAnalysisResult::new(
            tenant_id,
            employee_id,
            ModuleName::Engagement,
            "engagement side",
        ))
        .await
        .expect("Failed to create result");

    let aggregator =
        ResultAggregator::new(dal.clone()).with_poll_interval(Duration::from_millis(25));
    let report = culture::combined_report(
        &aggregator,
        tenant_id,
        employee_id,
        None,
        Duration::from_secs(2),
    )
    .await
    .expect("Fan-in failed");

    assert!(report.is_complete());
    assert!(report.missing.is_empty());
    assert_eq!(report.employee_id, employee_id);
    assert_eq!(
        report.recognition.expect("Recognition side missing").summary,
        "recognition side"
    );
    assert_eq!(
        report.engagement.expect("Engagement side missing").summary,
        "engagement side"
    );
}

#[tokio::test]
#[serial]
async fn test_combined_report_partial_when_engagement_is_slow() {
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
            ModuleName::Recognition,
            "recognition side",
        ))
        .await
        .expect("Failed to create result");

    let aggregator =
        ResultAggregator::new(dal.clone()).with_poll_interval(Duration::from_millis(25));
    let report = culture::combined_report(
        &aggregator,
        tenant_id,
        employee_id,
        None,
        Duration::from_millis(300),
    )
    .await
    .expect("Fan-in failed");

    assert!(!report.is_complete());
    assert_eq!(report.missing, vec![ModuleName::Engagement]);
    assert!(report.recognition.is_some());
    assert!(report.engagement.is_none());
}
