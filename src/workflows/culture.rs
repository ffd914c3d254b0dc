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

//! Culture survey workflow
//!
//! When an employee completes a culture survey, the culture module fans the
//! signal out to recognition and engagement as a trigger pair, then (when a
//! combined view is wanted) folds both analysis results back together with
//! the aggregator. The pair share one payload; only the trigger type and
//! target differ.

use std::time::Duration;
use tracing::info;

use crate::aggregator::ResultAggregator;
use crate::dal::DAL;
use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::error::StoreError;
use crate::models::analysis_result::AnalysisResult;
use crate::models::trigger::{NewTrigger, Trigger};
use crate::module::ModuleName;
use crate::modules::payloads::{self, SurveySignal};

/// Event raised when an employee finishes a culture survey.
#[derive(Debug, Clone)]
pub struct SurveyCompleted {
    pub tenant_id: UniversalUuid,
    pub employee_id: UniversalUuid,
    pub survey_id: String,
    /// Normalized survey score in `[0, 5]`.
    pub overall_score: f64,
}

/// Fans the completed survey out to recognition and engagement.
///
/// Creates the `culture_recognition` and `culture_engagement` trigger pair
/// for the employee. Returns both created triggers in that order.
pub async fn handle_survey_completed(
    dal: &DAL,
    event: &SurveyCompleted,
) -> Result<Vec<Trigger>, StoreError> {
    let signal = SurveySignal {
        employee_id: event.employee_id,
        survey_id: event.survey_id.clone(),
        overall_score: event.overall_score,
    };
    let payload = serde_json::to_value(&signal)?;

    let mut triggers = Vec::with_capacity(2);
    for (target, trigger_type) in [
        (ModuleName::Recognition, payloads::CULTURE_RECOGNITION),
        (ModuleName::Engagement, payloads::CULTURE_ENGAGEMENT),
    ] {
        let trigger = dal
            .trigger()
            .create(NewTrigger::new(
                event.tenant_id,
                ModuleName::Culture,
                target,
                trigger_type,
                payload.clone(),
            ))
            .await?;
        triggers.push(trigger);
    }

    info!(
        "Survey {} fanned out to recognition and engagement for employee {}",
        event.survey_id, event.employee_id
    );

    Ok(triggers)
}

/// The fan-in view over the survey trigger pair.
///
/// Either side may be absent when the aggregation deadline expired before
/// that module produced its result; `missing` names the absent modules.
#[derive(Debug)]
pub struct CombinedCultureReport {
    pub employee_id: UniversalUuid,
    pub recognition: Option<AnalysisResult>,
    pub engagement: Option<AnalysisResult>,
    pub missing: Vec<ModuleName>,
}

impl CombinedCultureReport {
    /// Returns true when both sides of the pair arrived in time.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Aggregates the recognition + engagement pair into one report.
///
/// `since` should be the watermark taken before [`handle_survey_completed`]
/// so results from earlier survey runs are not mistaken for this one.
pub async fn combined_report(
    aggregator: &ResultAggregator,
    tenant_id: UniversalUuid,
    employee_id: UniversalUuid,
    since: Option<UniversalTimestamp>,
    deadline: Duration,
) -> Result<CombinedCultureReport, StoreError> {
    let mut outcome = aggregator
        .wait_for_results(
            tenant_id,
            employee_id,
            &[ModuleName::Recognition, ModuleName::Engagement],
            since,
            deadline,
        )
        .await?;

    Ok(CombinedCultureReport {
        employee_id,
        recognition: outcome.results.remove(&ModuleName::Recognition),
        engagement: outcome.results.remove(&ModuleName::Engagement),
        missing: outcome.missing,
    })
}
