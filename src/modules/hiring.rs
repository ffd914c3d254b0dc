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

//! Hiring module handler
//!
//! Consumes position gaps identified by structure reviews, producing a
//! hiring plan and chaining a role requirements profile request to the
//! skills module. The chain runs through the trigger store like any other
//! trigger: the dispatcher materializes the child with this trigger as its
//! parent, which is also what keeps retries from duplicating it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::handler::{HandlerOutcome, ModuleHandler, TriggerRequest};
use crate::models::analysis_result::NewAnalysisResult;
use crate::models::trigger::Trigger;
use crate::module::ModuleName;
use crate::modules::payloads::{self, PositionGap};
use crate::reasoning::{AnalysisContext, ReasoningStage};

/// Handler for `position_gap_identified` triggers.
pub struct HiringHandler {
    reasoner: Arc<dyn ReasoningStage>,
}

impl HiringHandler {
    pub fn new(reasoner: Arc<dyn ReasoningStage>) -> Self {
        Self { reasoner }
    }
}

#[async_trait]
impl ModuleHandler for HiringHandler {
    fn module(&self) -> ModuleName {
        ModuleName::Hiring
    }

    async fn process(&self, trigger: &Trigger) -> Result<HandlerOutcome, HandlerError> {
        if trigger.trigger_type != payloads::POSITION_GAP_IDENTIFIED {
            return Err(HandlerError::UnsupportedTriggerType {
                module: self.module(),
                trigger_type: trigger.trigger_type.clone(),
            });
        }

        let gap: PositionGap = serde_json::from_value(trigger.payload.clone())
            .map_err(|e| HandlerError::InvalidPayload(e.to_string()))?;

        let context = AnalysisContext {
            tenant_id: trigger.tenant_id,
            employee_id: gap.requested_by,
            module: self.module(),
            trigger_type: trigger.trigger_type.clone(),
        };
        let insight = self.reasoner.analyze(&context, &trigger.payload).await?;

        let result = NewAnalysisResult::new(
            trigger.tenant_id,
            gap.requested_by,
            self.module(),
            format!("Hiring plan for {} in {}", gap.role_title, gap.department),
        )
        .with_insights(insight.insights)
        .with_recommendations(insight.recommendations)
        .with_confidence(insight.confidence);

        let profile_request = TriggerRequest {
            target_module: ModuleName::Skills,
            trigger_type: payloads::ROLE_REQUIREMENTS_PROFILE.to_string(),
            payload: serde_json::json!({
                "requested_by": gap.requested_by,
                "role_title": gap.role_title,
            }),
        };

        Ok(HandlerOutcome {
            results: vec![result],
            child_triggers: vec![profile_request],
        })
    }
}
