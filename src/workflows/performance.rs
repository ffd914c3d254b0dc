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

//! Performance review workflow
//!
//! Opening a review cycle requests input analyses from culture and skills
//! for the employee under review; collecting them is a bounded fan-in over
//! the same pair. Partial outcomes are normal when one side is slow: the
//! review proceeds with what arrived.

use std::time::Duration;
use tracing::info;

use crate::aggregator::{AggregateOutcome, ResultAggregator};
use crate::dal::DAL;
use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::error::StoreError;
use crate::models::trigger::{NewTrigger, Trigger};
use crate::module::ModuleName;
use crate::modules::payloads::{self, ReviewCycleInputs};

/// Event raised when a review cycle opens for an employee.
#[derive(Debug, Clone)]
pub struct ReviewCycleStarted {
    pub tenant_id: UniversalUuid,
    pub employee_id: UniversalUuid,
    pub cycle_id: String,
}

/// Requests review inputs from culture and skills.
///
/// Creates one `performance_inputs_requested` trigger per module; both carry
/// the same cycle payload. Returns the created triggers.
pub async fn start_review_cycle(
    dal: &DAL,
    event: &ReviewCycleStarted,
) -> Result<Vec<Trigger>, StoreError> {
    let inputs = ReviewCycleInputs {
        employee_id: event.employee_id,
        cycle_id: event.cycle_id.clone(),
    };
    let payload = serde_json::to_value(&inputs)?;

    let mut triggers = Vec::with_capacity(2);
    for target in [ModuleName::Culture, ModuleName::Skills] {
        let trigger = dal
            .trigger()
            .create(NewTrigger::new(
                event.tenant_id,
                ModuleName::Performance,
                target,
                payloads::PERFORMANCE_INPUTS_REQUESTED,
                payload.clone(),
            ))
            .await?;
        triggers.push(trigger);
    }

    info!(
        "Review cycle {} requested inputs from culture and skills for employee {}",
        event.cycle_id, event.employee_id
    );

    Ok(triggers)
}

/// Collects the culture + skills inputs for a review cycle.
///
/// Waits until both results newer than `since` are present or the deadline
/// elapses; the returned outcome names whichever modules were still missing.
pub async fn collect_inputs(
    aggregator: &ResultAggregator,
    tenant_id: UniversalUuid,
    employee_id: UniversalUuid,
    since: Option<UniversalTimestamp>,
    deadline: Duration,
) -> Result<AggregateOutcome, StoreError> {
    aggregator
        .wait_for_results(
            tenant_id,
            employee_id,
            &[ModuleName::Culture, ModuleName::Skills],
            since,
            deadline,
        )
        .await
}
