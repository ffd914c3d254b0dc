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

//! Skills module handler
//!
//! Serves two trigger types: review cycle input requests from performance,
//! and role requirements profiles chained from hiring. Both produce a
//! single analysis result and no further chaining.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::handler::{HandlerOutcome, ModuleHandler};
use crate::models::analysis_result::NewAnalysisResult;
use crate::models::trigger::Trigger;
use crate::module::ModuleName;
use crate::modules::payloads::{self, ReviewCycleInputs, RoleProfileRequest};
use crate::reasoning::{AnalysisContext, ReasoningStage};

/// Handler for skills-targeted triggers.
pub struct SkillsHandler {
    reasoner: Arc<dyn ReasoningStage>,
}

impl SkillsHandler {
    pub fn new(reasoner: Arc<dyn ReasoningStage>) -> Self {
        Self { reasoner }
    }

    async fn review_inputs(&self, trigger: &Trigger) -> Result<HandlerOutcome, HandlerError> {
        let inputs: ReviewCycleInputs = serde_json::from_value(trigger.payload.clone())
            .map_err(|e| HandlerError::InvalidPayload(e.to_string()))?;

        let context = AnalysisContext {
            tenant_id: trigger.tenant_id,
            employee_id: inputs.employee_id,
            module: self.module(),
            trigger_type: trigger.trigger_type.clone(),
        };
        let insight = self.reasoner.analyze(&context, &trigger.payload).await?;

        let result = NewAnalysisResult::new(
            trigger.tenant_id,
            inputs.employee_id,
            self.module(),
            format!("Skills inputs for review cycle {}", inputs.cycle_id),
        )
        .with_insights(insight.insights)
        .with_recommendations(insight.recommendations)
        .with_confidence(insight.confidence);

        Ok(HandlerOutcome {
            results: vec![result],
            child_triggers: Vec::new(),
        })
    }

    async fn role_profile(&self, trigger: &Trigger) -> Result<HandlerOutcome, HandlerError> {
        let request: RoleProfileRequest = serde_json::from_value(trigger.payload.clone())
            .map_err(|e| HandlerError::InvalidPayload(e.to_string()))?;

        let context = AnalysisContext {
            tenant_id: trigger.tenant_id,
            employee_id: request.requested_by,
            module: self.module(),
            trigger_type: trigger.trigger_type.clone(),
        };
        let insight = self.reasoner.analyze(&context, &trigger.payload).await?;

        // Attributed to the requester; role profiles have no subject employee.
        let result = NewAnalysisResult::new(
            trigger.tenant_id,
            request.requested_by,
            self.module(),
            format!("Role requirements profile for {}", request.role_title),
        )
        .with_insights(insight.insights)
        .with_recommendations(insight.recommendations)
        .with_confidence(insight.confidence);

        Ok(HandlerOutcome {
            results: vec![result],
            child_triggers: Vec::new(),
        })
    }
}

#[async_trait]
impl ModuleHandler for SkillsHandler {
    fn module(&self) -> ModuleName {
        ModuleName::Skills
    }

    async fn process(&self, trigger: &Trigger) -> Result<HandlerOutcome, HandlerError> {
        match trigger.trigger_type.as_str() {
            payloads::PERFORMANCE_INPUTS_REQUESTED => self.review_inputs(trigger).await,
            payloads::ROLE_REQUIREMENTS_PROFILE => self.role_profile(trigger).await,
            _ => Err(HandlerError::UnsupportedTriggerType {
                module: self.module(),
                trigger_type: trigger.trigger_type.clone(),
            }),
        }
    }
}
